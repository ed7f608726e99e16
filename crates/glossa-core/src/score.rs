//! Derives the single scalar confidence for each task's raw output.
//!
//! The payload itself is never mutated; consumers keep the verbatim
//! [`TaskOutput`] and attach the derived scalar alongside it.

use crate::record::TaskOutput;

/// Derive the confidence scalar in `[0, 1]` for a backend output.
///
/// - Classification: score of the top-ranked label. The backend's own
///   ordering is trusted; scores are not re-sorted here.
/// - Sentiment: score of the first rating.
/// - Entities: arithmetic mean of all span scores, `0.0` when the span
///   list is empty (an empty list is a valid result, not an error).
pub fn derive_confidence(output: &TaskOutput) -> f32 {
    match output {
        TaskOutput::Classification { scores, .. } => scores.first().copied().unwrap_or(0.0),
        TaskOutput::Sentiment { ratings } => ratings.first().map(|r| r.score).unwrap_or(0.0),
        TaskOutput::Entities { spans } => {
            if spans.is_empty() {
                0.0
            } else {
                spans.iter().map(|s| s.score).sum::<f32>() / spans.len() as f32
            }
        }
    }
}

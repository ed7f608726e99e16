//! Shared record types for text samples and processing results.
//!
//! `TaskOutput` is a tagged variant so downstream consumers can match
//! exhaustively on the task-specific payload shape instead of probing an
//! untyped blob.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three inference tasks the pipeline routes to.
///
/// Wire names are `"classification"`, `"sentiment"`, and `"ner"`. Other task
/// names found in configuration (translation, summarization) are never
/// registered and fail at the [`FromStr`] boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Classification,
    Sentiment,
    Ner,
}

impl TaskKind {
    /// Every task the registry knows how to build.
    pub const ALL: [TaskKind; 3] = [
        TaskKind::Classification,
        TaskKind::Sentiment,
        TaskKind::Ner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Sentiment => "sentiment",
            Self::Ner => "ner",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for a task name that was never registered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task: {0:?}")]
pub struct UnknownTaskError(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(Self::Classification),
            "sentiment" => Ok(Self::Sentiment),
            "ner" => Ok(Self::Ner),
            other => Err(UnknownTaskError(other.to_string())),
        }
    }
}

/// One sentiment rating as returned by a sentiment backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRating {
    pub label: String,
    pub score: f32,
}

/// One recognized entity span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Entity tag, e.g. `PER`, `ORG`, `LOC`, `MISC`.
    pub entity: String,
    /// Surface text of the span.
    pub word: String,
    pub score: f32,
}

/// Task-specific backend output, retained verbatim inside a
/// [`ProcessingResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskOutput {
    /// Zero-shot classification: `labels` and `scores` have the same length,
    /// scores sum to ≈ 1.0 and arrive in the backend's own descending order
    /// (not re-sorted here).
    Classification {
        labels: Vec<String>,
        scores: Vec<f32>,
    },
    /// Sentiment ratings; single-element in practice, only the first element
    /// is consumed downstream.
    Sentiment { ratings: Vec<SentimentRating> },
    /// Recognized entity spans; may be empty.
    Entities { spans: Vec<EntitySpan> },
}

impl TaskOutput {
    pub fn task(&self) -> TaskKind {
        match self {
            Self::Classification { .. } => TaskKind::Classification,
            Self::Sentiment { .. } => TaskKind::Sentiment,
            Self::Entities { .. } => TaskKind::Ner,
        }
    }
}

/// An ingested text sample. Immutable after creation, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSample {
    pub id: u64,
    pub text: String,
    /// ISO-639-1-like code, or `"auto-detected"`.
    pub language: String,
    pub category: String,
    pub created: DateTime<Utc>,
}

/// The uniform result of one successful processing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub text: String,
    pub language: String,
    pub task: TaskKind,
    pub output: TaskOutput,
    /// Scalar in `[0, 1]`, derived per task rule in [`crate::score`].
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

/// A [`ProcessingResult`] as persisted: id assigned by the store, payload
/// serialized to a portable JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: u64,
    pub text: String,
    pub language: String,
    pub task: TaskKind,
    /// JSON-serialized [`TaskOutput`].
    pub result: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_names_round_trip() {
        for task in TaskKind::ALL {
            assert_eq!(task.as_str().parse::<TaskKind>().unwrap(), task);
        }
    }

    #[test]
    fn unregistered_task_names_fail() {
        for name in ["translation", "summarization", ""] {
            let err = name.parse::<TaskKind>().unwrap_err();
            assert_eq!(err, UnknownTaskError(name.to_string()));
        }
    }

    #[test]
    fn task_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskKind::Ner).unwrap(), "\"ner\"");
        assert_eq!(
            serde_json::to_string(&TaskKind::Classification).unwrap(),
            "\"classification\""
        );
    }

    #[test]
    fn output_json_round_trip() {
        let output = TaskOutput::Classification {
            labels: vec!["technology".into(), "economy".into()],
            scores: vec![0.8, 0.2],
        };
        let json = serde_json::to_string(&output).unwrap();
        let parsed: TaskOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
        assert_eq!(parsed.task(), TaskKind::Classification);
    }

    #[test]
    fn empty_entity_output_round_trip() {
        let output = TaskOutput::Entities { spans: vec![] };
        let json = serde_json::to_string(&output).unwrap();
        let parsed: TaskOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
        assert_eq!(parsed.task(), TaskKind::Ner);
    }
}

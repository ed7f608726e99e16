//! Deterministic heuristic backends, used as the fallback tier.
//!
//! No model files, no tokenizer, construction cannot fail. Scores are
//! coarse but stable, which also makes these backends convenient in tests.

use glossa_core::record::{EntitySpan, SentimentRating, TaskKind, TaskOutput};

use crate::{Capability, InferenceError, InvokeOptions};

const POSITIVE_WORDS: &[&str] = &[
    "love", "loves", "loved", "great", "good", "excellent", "wonderful", "beautiful", "amazing",
    "happy", "best", "fantastic", "encanta", "adore", "magnifique", "hermoso",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "hates", "hated", "bad", "terrible", "awful", "horrible", "worst", "sad", "poor",
    "broken", "ugly", "odio", "deteste", "schrecklich",
];

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Zero-shot classification by keyword overlap between the candidate label
/// and the text. Scores are normalized to sum to 1.0 and emitted in
/// descending order.
pub struct KeywordClassifier;

impl Capability for KeywordClassifier {
    fn task(&self) -> TaskKind {
        TaskKind::Classification
    }

    fn name(&self) -> &str {
        "keyword-classifier"
    }

    fn invoke(&self, text: &str, opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        if opts.candidate_labels.is_empty() {
            return Err(InferenceError::Invocation(
                "classification requires candidate labels".into(),
            ));
        }

        let text_words: Vec<String> = words(text).map(|w| w.to_lowercase()).collect();

        // Each label starts at weight 1 so that scores stay defined when
        // nothing matches; every occurrence of a label word adds 1.
        let mut scored: Vec<(String, f32)> = opts
            .candidate_labels
            .iter()
            .map(|label| {
                let hits: usize = words(label)
                    .map(|lw| {
                        let lw = lw.to_lowercase();
                        text_words.iter().filter(|tw| **tw == lw).count()
                    })
                    .sum();
                (label.clone(), 1.0 + hits as f32)
            })
            .collect();

        let total: f32 = scored.iter().map(|(_, w)| w).sum();
        for (_, w) in &mut scored {
            *w /= total;
        }

        // Stable sort: ties keep the caller's label order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (labels, scores) = scored.into_iter().unzip();
        Ok(TaskOutput::Classification { labels, scores })
    }
}

/// Sentiment from a small positive/negative word lexicon.
///
/// The score is 0.5 for a text with no lexicon hits and approaches 1.0 as
/// the hit balance becomes one-sided.
pub struct LexiconSentiment;

impl Capability for LexiconSentiment {
    fn task(&self) -> TaskKind {
        TaskKind::Sentiment
    }

    fn name(&self) -> &str {
        "lexicon-sentiment"
    }

    fn invoke(&self, text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for word in words(text) {
            let word = word.to_lowercase();
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative += 1;
            }
        }

        let total = positive + negative;
        let (label, score) = if total == 0 {
            ("POSITIVE", 0.5)
        } else {
            let balance = positive.abs_diff(negative) as f32 / total as f32;
            let label = if positive >= negative {
                "POSITIVE"
            } else {
                "NEGATIVE"
            };
            (label, 0.5 + 0.5 * balance)
        };

        Ok(TaskOutput::Sentiment {
            ratings: vec![SentimentRating {
                label: label.to_string(),
                score,
            }],
        })
    }
}

/// Entity recognition from capitalization patterns: runs of capitalized
/// words are tagged `MISC`. A lone capitalized word at sentence start is
/// skipped.
pub struct PatternNer;

impl PatternNer {
    fn is_capitalized(word: &str) -> bool {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.is_uppercase() && chars.all(|c| c.is_alphanumeric()),
            None => false,
        }
    }
}

impl Capability for PatternNer {
    fn task(&self) -> TaskKind {
        TaskKind::Ner
    }

    fn name(&self) -> &str {
        "pattern-ner"
    }

    fn invoke(&self, text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
        let mut spans = Vec::new();
        let mut run: Vec<&str> = Vec::new();
        let mut run_starts_sentence = false;
        let mut sentence_start = true;

        let flush = |run: &mut Vec<&str>, starts_sentence: bool, spans: &mut Vec<EntitySpan>| {
            if run.is_empty() {
                return;
            }
            // Sentence-initial capitalization is ordinary prose; drop the
            // leading word of a run that opens a sentence.
            let keep: &[&str] = if starts_sentence { &run[1..] } else { &run[..] };
            if !keep.is_empty() {
                let len = keep.len().min(3) as f32;
                spans.push(EntitySpan {
                    entity: "MISC".to_string(),
                    word: keep.join(" "),
                    score: 0.5 + 0.1 * len,
                });
            }
            run.clear();
        };

        for token in text.split_whitespace() {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.is_empty() && Self::is_capitalized(word) {
                if run.is_empty() {
                    run_starts_sentence = sentence_start;
                }
                run.push(word);
            } else {
                flush(&mut run, run_starts_sentence, &mut spans);
            }
            sentence_start = token.ends_with(['.', '!', '?']);
        }
        flush(&mut run, run_starts_sentence, &mut spans);

        Ok(TaskOutput::Entities { spans })
    }
}

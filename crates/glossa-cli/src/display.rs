//! Human-readable rendering for results, samples, and statistics.

use glossa_core::config::language_name;
use glossa_core::record::{ProcessingResult, StoredResult, TaskOutput, TextSample};
use glossa_engine::DatabaseStats;

const MAX_LIST_ITEMS: usize = 10;

/// Print one processing result as a vertical card.
pub fn print_result(result: &ProcessingResult) {
    println!("=== {} ===", result.task);
    println!("  {:<14} {}", "text", result.text);
    println!("  {:<14} {}", "language", result.language);
    println!("  {:<14} {:.3}", "confidence", result.confidence);

    match &result.output {
        TaskOutput::Classification { labels, scores } => {
            for (label, score) in labels.iter().zip(scores).take(MAX_LIST_ITEMS) {
                println!("  {:<14} {} ({score:.3})", "label", label);
            }
        }
        TaskOutput::Sentiment { ratings } => {
            for rating in ratings.iter().take(MAX_LIST_ITEMS) {
                println!("  {:<14} {} ({:.3})", "sentiment", rating.label, rating.score);
            }
        }
        TaskOutput::Entities { spans } => {
            if spans.is_empty() {
                println!("  {:<14} (none)", "entities");
            }
            for span in spans.iter().take(MAX_LIST_ITEMS) {
                println!(
                    "  {:<14} {} [{}] ({:.3})",
                    "entity", span.word, span.entity, span.score
                );
            }
            if spans.len() > MAX_LIST_ITEMS {
                println!("  ... and {} more", spans.len() - MAX_LIST_ITEMS);
            }
        }
    }
    println!();
}

pub fn print_samples(samples: &[&TextSample]) {
    if samples.is_empty() {
        println!("no samples stored");
        return;
    }
    for sample in samples {
        println!(
            "{:>4}  {:<5} {:<12} {}",
            sample.id, sample.language, sample.category, sample.text
        );
    }
}

pub fn print_stored_results(results: &[&StoredResult]) {
    if results.is_empty() {
        println!("no results stored");
        return;
    }
    for result in results {
        println!(
            "{:>4}  {:<14} {:.3}  {}  {}",
            result.id,
            result.task,
            result.confidence,
            result.timestamp.to_rfc3339(),
            result.text
        );
    }
}

pub fn print_stats(stats: &DatabaseStats) {
    println!("  {:<16} {}", "total samples", stats.total_samples);
    println!("  {:<16} {}", "total results", stats.total_results);
    println!(
        "  {:<16} {}",
        "languages",
        stats.languages.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "  {:<16} {}",
        "tasks",
        stats.tasks.iter().cloned().collect::<Vec<_>>().join(", ")
    );
}

pub fn print_languages(codes: &[&str]) {
    for code in codes {
        match language_name(code) {
            Some(name) => println!("  {code}  {name}"),
            None => println!("  {code}"),
        }
    }
}

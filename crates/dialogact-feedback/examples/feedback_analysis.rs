//! Summarizes a rating journal and lists the patterns the analyzer finds.
//!
//! Without an argument a small synthetic journal is analyzed instead.
//!
//! Run with: cargo run -p dialogact-feedback --example feedback_analysis [journal.jsonl]

use dialogact_core::Action;
use dialogact_feedback::{read_journal, RatingAnalyzer, RatingRecord};
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let records = match std::env::args().nth(1) {
        Some(path) => read_journal(&PathBuf::from(path))?,
        None => synthetic_journal(),
    };

    println!("=== dialogact: rating journal ({} ratings) ===\n", records.len());
    let analyzer = RatingAnalyzer::default();

    println!("By action:");
    for (action, stats) in &analyzer.by_action(&records) {
        println!(
            "  {action:<26} n={:<3} mean={:.2} range={}..={} explored={:.0}%",
            stats.count,
            stats.mean(),
            stats.min.unwrap_or_default(),
            stats.max.unwrap_or_default(),
            stats.explore_share() * 100.0
        );
    }
    println!();

    println!("Patterns:");
    let patterns = analyzer.analyze_patterns(&records);
    if patterns.is_empty() {
        println!("  (none detected with current thresholds)");
    }
    for pattern in &patterns {
        println!("  - {pattern}");
    }

    println!("\nOverall: {}", serde_json::to_string(&analyzer.summarize(&records))?);
    Ok(())
}

fn synthetic_journal() -> Vec<RatingRecord> {
    let mut records = Vec::new();
    // Questions after a statement go down badly, thanks go down well.
    for reward in [1, 2, 1, 1, 2, 3] {
        records.push(RatingRecord::now(
            1807,
            "[NULL, STATEMENT]",
            Action::QuestionWh,
            reward,
            0.9,
            true,
        ));
    }
    for reward in [5, 4, 5, 5, 4] {
        records.push(RatingRecord::now(
            1811,
            "[NULL, THANKS]",
            Action::Welcome,
            reward,
            0.6,
            false,
        ));
    }
    records
}

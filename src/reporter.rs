//! Accumulates counts from a run and prints the human-facing summary:
//! one colorized line per counter, with an optional per-category file
//! listing capped at a handful of examples.

use owo_colors::OwoColorize;
use std::time::Duration;

use crate::copy::CopyReport;
use crate::matcher::MatchOutcome;
use crate::relpath::RelativePath;
use crate::verifier::VerifyResult;

const EXAMPLE_CAP: usize = 5;

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "K", "M", "G", "T"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{bytes}{}", UNITS[0])
    } else {
        format!("{:.2}{}", size, UNITS[unit_idx])
    }
}

fn print_examples(label: &str, paths: &[RelativePath], verbose: bool) {
    if paths.is_empty() || !verbose {
        return;
    }
    println!("{label}:");
    for path in paths.iter().take(EXAMPLE_CAP) {
        println!("  {path}");
    }
    if paths.len() > EXAMPLE_CAP {
        println!("  ... {} more", paths.len() - EXAMPLE_CAP);
    }
}

/// The counter line `analyze`/`update` print: matched, matched-by-hash,
/// one-left, ambiguous, source orphans, dest orphans.
pub fn print_match_summary(outcome: &MatchOutcome, verbose: bool) {
    let c = &outcome.counters;
    let mut parts = Vec::new();

    if c.matched > 0 {
        let mut line = format!("{} matched", c.matched);
        if c.matched_by_hash > 0 {
            line.push_str(&format!(" ({} by hash)", c.matched_by_hash));
        }
        parts.push(line.green().to_string());
    }
    if c.source_one_left > 0 {
        parts.push(format!("{} one-left", c.source_one_left).yellow().to_string());
    }
    if c.source_multi_in_dest > 0 {
        parts.push(format!("{} ambiguous", c.source_multi_in_dest).yellow().to_string());
    }
    if c.source_not_in_dest > 0 {
        parts.push(format!("{} source-orphan", c.source_not_in_dest).red().to_string());
    }
    if c.dest_not_in_source > 0 {
        parts.push(format!("{} dest-orphan", c.dest_not_in_source).red().to_string());
    }

    if parts.is_empty() {
        println!("{}", "Nothing to reconcile".green());
        return;
    }
    println!("{}", parts.join(", "));

    let one_left: Vec<RelativePath> = outcome.one_left.iter().map(|e| e.source.clone()).collect();
    let ambiguous: Vec<RelativePath> = outcome.ambiguous.iter().map(|e| e.source.clone()).collect();
    print_examples("One-left", &one_left, verbose);
    print_examples("Ambiguous", &ambiguous, verbose);
    print_examples("Source orphans", &outcome.source_orphans, verbose);
    print_examples("Destination orphans", &outcome.dest_orphans, verbose);
}

/// The `verify` subcommand's summary: kept/dropped/reclassified/malformed.
pub fn print_verify_summary(result: &VerifyResult) {
    let mut parts = Vec::new();
    if result.kept > 0 {
        parts.push(format!("{} kept", result.kept).green().to_string());
    }
    if result.reclassified > 0 {
        parts.push(format!("{} reclassified", result.reclassified).cyan().to_string());
    }
    if result.dropped > 0 {
        parts.push(format!("{} dropped", result.dropped).yellow().to_string());
    }
    if result.malformed > 0 {
        parts.push(format!("{} malformed", result.malformed).red().to_string());
    }
    if parts.is_empty() {
        println!("{}", "Clean".green());
    } else {
        println!("{}", parts.join(", "));
    }
}

/// The `sync` subcommand's summary: copied/ignored/errors plus elapsed time.
pub fn print_sync_summary(report: &CopyReport, elapsed: Duration, dry_run: bool) {
    let mut parts = Vec::new();
    if report.copied > 0 {
        parts.push(format!("{} copied", report.copied).green().to_string());
    }
    if report.ignored > 0 {
        parts.push(format!("{} skipped", report.ignored).yellow().to_string());
    }
    if report.errors > 0 {
        parts.push(format!("{} errors", report.errors).red().to_string());
    }
    if parts.is_empty() {
        parts.push("nothing to do".to_string());
    }

    let suffix = if dry_run { " (dry run)" } else { "" };
    println!(
        "{} {} in {:.2}s{suffix}",
        "Done.".green().bold(),
        parts.join(", "),
        elapsed.as_secs_f64()
    );
}

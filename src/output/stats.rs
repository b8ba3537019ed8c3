//! Cycle reporting
//!
//! This module formats cycle summaries and the stored cycle history for the
//! command line.

use crate::output::traits::CycleSummary;
use crate::storage::CycleRecord;

/// Formats the summary of a finished cycle
pub fn format_summary(summary: &CycleSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Cycle Summary ===\n\n");
    out.push_str(&format!("  Status: {}\n", summary.status));
    out.push_str(&format!(
        "  Started: {}\n",
        summary.started_at.to_rfc3339()
    ));
    out.push_str(&format!("  Duration: {}s\n", summary.duration_seconds()));
    out.push_str(&format!(
        "  Targets attempted: {}\n",
        summary.targets_attempted
    ));
    out.push_str(&format!("  Posts forwarded: {}\n", summary.posts_forwarded));
    out.push_str(&format!("  Posts skipped: {}\n", summary.posts_skipped));

    if !summary.failed_targets.is_empty() {
        out.push_str(&format!(
            "\nFailed Targets ({}):\n",
            summary.failed_targets.len()
        ));
        for failure in &summary.failed_targets {
            out.push_str(&format!("  - {}: {}\n", failure.label, failure.reason));
        }
    }

    out
}

/// Prints the summary of a finished cycle to stdout
pub fn print_summary(summary: &CycleSummary) {
    print!("{}", format_summary(summary));
}

/// Formats stored cycles as a table, newest first
pub fn format_history(cycles: &[CycleRecord]) -> String {
    if cycles.is_empty() {
        return "No cycles recorded yet.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:>5}  {:<25}  {:<10}  {:>7}  {:>9}  {:>7}  {:>6}\n",
        "ID", "Started", "Status", "Targets", "Forwarded", "Skipped", "Failed"
    ));

    for cycle in cycles {
        out.push_str(&format!(
            "{:>5}  {:<25}  {:<10}  {:>7}  {:>9}  {:>7}  {:>6}\n",
            cycle.id,
            cycle.started_at,
            cycle.status.to_db_string(),
            cycle.targets_attempted,
            cycle.posts_forwarded,
            cycle.posts_skipped,
            cycle.targets_failed
        ));
    }

    out
}

/// Prints stored cycles to stdout
pub fn print_history(cycles: &[CycleRecord]) {
    print!("{}", format_history(cycles));
}

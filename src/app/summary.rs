use std::path::Path;
use std::time::Duration;

use crate::sinks::{RunSummary, format_seconds};

pub(crate) fn print_summary(run_name: &str, summary: &RunSummary, csv_path: &Path) {
    for line in summary_lines(run_name, summary, csv_path) {
        println!("{}", line);
    }
}

pub(super) fn summary_lines(run_name: &str, summary: &RunSummary, csv_path: &Path) -> Vec<String> {
    let mut lines = Vec::with_capacity(summary.status_counts.len().saturating_add(10));
    lines.push(format!("Run: {}", run_name));
    lines.push(format!("Total Requests: {}", summary.total));
    lines.push("Status Codes:".to_owned());
    for (status, count) in &summary.status_counts {
        lines.push(format!("  {}: {}", status, count));
    }
    lines.push(format!("Successful: {}", summary.successes));
    lines.push(format!("Failed: {}", summary.failures));
    lines.push(format!(
        "Latency min/avg/max: {} / {} / {}",
        format_latency(summary.min_latency),
        format_latency(summary.avg_latency),
        format_latency(summary.max_latency)
    ));
    lines.push(format!(
        "Latency p50/p90/p99: {} / {} / {}",
        format_latency(summary.p50),
        format_latency(summary.p90),
        format_latency(summary.p99)
    ));
    lines.push(format!(
        "Elapsed: {}.{:03}s",
        summary.elapsed.as_secs(),
        summary.elapsed.subsec_millis()
    ));
    lines.push(format!("Achieved RPS: {}", summary.achieved_rps()));
    lines.push(format!("Results CSV: {}", csv_path.display()));
    lines
}

fn format_latency(latency: Option<Duration>) -> String {
    latency.map_or_else(|| "n/a".to_owned(), |value| format!("{}s", format_seconds(value)))
}

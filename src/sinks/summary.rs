use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{AppError, AppResult, SinkError};
use crate::metrics::{LatencyHistogram, RunReport};

/// Aggregate view of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    /// Keyed by status code, or `ERROR` for failed requests.
    pub status_counts: BTreeMap<String, u64>,
    pub min_latency: Option<Duration>,
    pub avg_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
    pub p50: Option<Duration>,
    pub p90: Option<Duration>,
    pub p99: Option<Duration>,
    pub elapsed: Duration,
    /// Achieved requests per second, scaled by 100.
    pub achieved_rps_x100: u64,
}

impl RunSummary {
    /// Computes counts, latency statistics and throughput for `report`.
    ///
    /// # Errors
    ///
    /// Returns an error when a latency sample cannot be recorded.
    pub fn from_report(report: &RunReport) -> AppResult<Self> {
        let mut histogram = LatencyHistogram::new()
            .map_err(|message| AppError::sink(SinkError::Histogram { message }))?;
        let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut successes = 0u64;
        let mut failures = 0u64;
        let mut min_latency: Option<Duration> = None;
        let mut max_latency: Option<Duration> = None;
        let mut latency_sum_micros = 0u128;

        for result in &report.results {
            let count = status_counts.entry(result.status_label()).or_insert(0);
            *count = count.saturating_add(1);
            match result.latency() {
                Some(latency) => {
                    successes = successes.saturating_add(1);
                    histogram
                        .record(latency)
                        .map_err(|message| AppError::sink(SinkError::Histogram { message }))?;
                    latency_sum_micros = latency_sum_micros.saturating_add(latency.as_micros());
                    min_latency = Some(min_latency.map_or(latency, |min| min.min(latency)));
                    max_latency = Some(max_latency.map_or(latency, |max| max.max(latency)));
                }
                None => failures = failures.saturating_add(1),
            }
        }

        let avg_latency = latency_sum_micros
            .checked_div(u128::from(successes))
            .map(|micros| Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX)));
        let percentiles = (successes > 0).then(|| histogram.percentiles());

        let total = successes.saturating_add(failures);
        let elapsed_micros = report.elapsed.as_micros().max(1);
        let achieved_rps_x100 = u128::from(total)
            .saturating_mul(100_000_000)
            .checked_div(elapsed_micros)
            .map_or(0, |scaled| u64::try_from(scaled).unwrap_or(u64::MAX));

        Ok(Self {
            total,
            successes,
            failures,
            status_counts,
            min_latency,
            avg_latency,
            max_latency,
            p50: percentiles.map(|(p50, _, _)| p50),
            p90: percentiles.map(|(_, p90, _)| p90),
            p99: percentiles.map(|(_, _, p99)| p99),
            elapsed: report.elapsed,
            achieved_rps_x100,
        })
    }

    #[must_use]
    pub fn achieved_rps(&self) -> String {
        format!(
            "{}.{:02}",
            self.achieved_rps_x100 / 100,
            self.achieved_rps_x100 % 100
        )
    }
}

/// Formats a duration as seconds with microsecond precision, e.g. `0.012345`.
#[must_use]
pub fn format_seconds(duration: Duration) -> String {
    format!("{}.{:06}", duration.as_secs(), duration.subsec_micros())
}

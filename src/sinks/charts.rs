use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tokio::fs;
use tracing::{error, info};

use crate::error::{AppError, AppResult, SinkError};
use crate::metrics::RequestResult;

const HISTOGRAM_BINS: u64 = 30;
const CHART_SIZE: (u32, u32) = (1200, 600);

type DrawResult = Result<(), Box<dyn std::error::Error>>;

/// Paths of the charts written for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSet {
    pub written: Vec<PathBuf>,
}

/// Renders the latency scatter, latency histogram and status code charts
/// into `charts_dir`.
///
/// Latency charts are skipped when no request succeeded.
///
/// # Errors
///
/// Returns an error when the directory cannot be created, a chart fails to
/// render or the rendering task dies.
pub async fn render_charts(
    results: &[RequestResult],
    status_counts: &BTreeMap<String, u64>,
    charts_dir: &Path,
    run_name: &str,
) -> AppResult<ChartSet> {
    if results.is_empty() {
        return Ok(ChartSet::default());
    }

    if let Err(err) = fs::create_dir_all(charts_dir).await {
        error!(
            "Failed to create output directory '{}': {}",
            charts_dir.display(),
            err
        );
        return Err(AppError::sink(SinkError::CreateChartsDir {
            path: charts_dir.to_path_buf(),
            source: err,
        }));
    }

    let title = chart_title(run_name);
    let samples: Vec<(u64, u64)> = results
        .iter()
        .filter_map(|result| {
            result.latency().map(|latency| {
                let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
                (result.id(), micros)
            })
        })
        .collect();
    let status_counts = status_counts.clone();
    let charts_dir = charts_dir.to_path_buf();
    let run_name = run_name.to_owned();

    // Plotting blocks, so it runs on the blocking pool.
    tokio::task::spawn_blocking(move || {
        draw_charts(&samples, &status_counts, &charts_dir, &run_name, &title)
    })
    .await?
}

fn draw_charts(
    samples: &[(u64, u64)],
    status_counts: &BTreeMap<String, u64>,
    charts_dir: &Path,
    run_name: &str,
    title: &str,
) -> AppResult<ChartSet> {
    let mut charts = ChartSet::default();

    if !samples.is_empty() {
        let over_time_path = charts_dir.join(format!("{}_latency_over_time.png", run_name));
        info!("Plotting latency over requests...");
        render(&over_time_path, |path| {
            plot_latency_over_time(samples, &format!("{} - Latency over Requests", title), path)
        })?;
        charts.written.push(over_time_path);

        let histogram_path = charts_dir.join(format!("{}_latency_histogram.png", run_name));
        info!("Plotting latency distribution...");
        render(&histogram_path, |path| {
            plot_latency_histogram(samples, &format!("{} - Latency Distribution", title), path)
        })?;
        charts.written.push(histogram_path);
    }

    let status_path = charts_dir.join(format!("{}_status_codes.png", run_name));
    info!("Plotting status codes...");
    render(&status_path, |path| {
        plot_status_codes(status_counts, &format!("{} - Status Codes", title), path)
    })?;
    charts.written.push(status_path);

    Ok(charts)
}

fn render<F>(path: &Path, draw: F) -> AppResult<()>
where
    F: FnOnce(&Path) -> DrawResult,
{
    draw(path).map_err(|err| {
        AppError::sink(SinkError::RenderChart {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    })
}

/// `"<Name> Test"` with the run name capitalized.
pub(super) fn chart_title(run_name: &str) -> String {
    let mut chars = run_name.chars();
    let capitalized = chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    });
    format!("{} Test", capitalized)
}

/// Picks milliseconds for slow runs and microseconds for fast ones.
pub(super) const fn latency_unit(max_micros: u64) -> (u64, &'static str) {
    if max_micros >= 10_000 {
        (1_000, "Latency (ms)")
    } else {
        (1, "Latency (us)")
    }
}

/// Splits `values` into fixed-width bins; returns `(start, width, counts)`.
pub(super) fn histogram_bins(values: &[u64], bins: u64) -> (u64, u64, Vec<u64>) {
    let bins = bins.max(1);
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    let span = max.saturating_sub(min).saturating_add(1);
    let width = span.div_ceil(bins).max(1);
    let mut counts = vec![0u64; usize::try_from(bins).unwrap_or(1)];
    for value in values {
        let index = value
            .saturating_sub(min)
            .checked_div(width)
            .unwrap_or(0)
            .min(bins.saturating_sub(1));
        let slot = usize::try_from(index)
            .ok()
            .and_then(|position| counts.get_mut(position));
        if let Some(slot) = slot {
            *slot = slot.saturating_add(1);
        }
    }
    (min, width, counts)
}

fn plot_latency_over_time(samples: &[(u64, u64)], title: &str, path: &Path) -> DrawResult {
    let max_micros = samples.iter().map(|(_, micros)| *micros).max().unwrap_or(1);
    let (divisor, y_desc) = latency_unit(max_micros);
    let points: Vec<(u64, u64)> = samples
        .iter()
        .map(|(id, micros)| (*id, micros.checked_div(divisor).unwrap_or(0)))
        .collect();
    let x_max = points
        .iter()
        .map(|(id, _)| *id)
        .max()
        .unwrap_or(1)
        .saturating_add(1);
    let y_max = points
        .iter()
        .map(|(_, value)| *value)
        .max()
        .unwrap_or(1)
        .saturating_add(1);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0u64..x_max, 0u64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Request #")
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|point| Circle::new(*point, 2, BLUE.mix(0.6).filled())),
    )?;

    root.present()?;
    Ok(())
}

fn plot_latency_histogram(samples: &[(u64, u64)], title: &str, path: &Path) -> DrawResult {
    let max_micros = samples.iter().map(|(_, micros)| *micros).max().unwrap_or(1);
    let (divisor, x_desc) = latency_unit(max_micros);
    let values: Vec<u64> = samples
        .iter()
        .map(|(_, micros)| micros.checked_div(divisor).unwrap_or(0))
        .collect();
    let (start, width, counts) = histogram_bins(&values, HISTOGRAM_BINS);
    let x_end = start.saturating_add(width.saturating_mul(HISTOGRAM_BINS));
    let y_max = counts.iter().copied().max().unwrap_or(1).saturating_add(1);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(start..x_end, 0u64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Requests")
        .draw()?;

    let mut lower = start;
    let mut bars = Vec::with_capacity(counts.len());
    for count in &counts {
        let upper = lower.saturating_add(width);
        if *count > 0 {
            bars.push(Rectangle::new(
                [(lower, 0), (upper, *count)],
                RGBColor(52, 152, 219).filled(),
            ));
        }
        lower = upper;
    }
    chart.draw_series(bars)?;

    root.present()?;
    Ok(())
}

fn plot_status_codes(status_counts: &BTreeMap<String, u64>, title: &str, path: &Path) -> DrawResult {
    let labels: Vec<&str> = status_counts.keys().map(String::as_str).collect();
    let bar_count = u32::try_from(labels.len()).unwrap_or(u32::MAX).max(1);
    let y_max = status_counts
        .values()
        .copied()
        .max()
        .unwrap_or(1)
        .saturating_add(1);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..bar_count).into_segmented(), 0u64..y_max)?;

    let label_for = |value: &SegmentValue<u32>| match value {
        SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => usize::try_from(*index)
            .ok()
            .and_then(|position| labels.get(position))
            .map_or_else(String::new, |label| (*label).to_owned()),
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Status")
        .y_desc("Requests")
        .x_label_formatter(&label_for)
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(RGBColor(46, 204, 113).filled())
            .margin(10)
            .data(
                status_counts
                    .values()
                    .enumerate()
                    .map(|(index, count)| (u32::try_from(index).unwrap_or(u32::MAX), *count)),
            ),
    )?;

    root.present()?;
    Ok(())
}

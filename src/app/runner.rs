use std::path::{Path, PathBuf};

use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::args::TesterArgs;
use crate::domain::run::RunConfig;
use crate::error::AppResult;
use crate::http::Dispatcher;
use crate::metrics::RunReport;
use crate::sinks::{ChartSet, RunSummary, render_charts, write_csv};

use super::{progress, summary};

pub(crate) struct RunOutcome {
    pub report: RunReport,
    pub summary: RunSummary,
    pub csv_path: PathBuf,
    pub charts: ChartSet,
}

/// Runs one load test end to end: dispatch, CSV, summary, then charts.
///
/// Chart failures are logged and do not fail the run.
pub(crate) async fn run_local(args: &TesterArgs) -> AppResult<RunOutcome> {
    let config = RunConfig::from_args(args)?;
    let dispatcher = Dispatcher::new(config)?;
    let run_name = args.run_name();

    let (done_tx, done_rx) = oneshot::channel::<()>();
    let progress_handle = (!args.no_progress).then(|| {
        progress::setup_progress_indicator(dispatcher.progress(), args.no_color, done_rx)
    });

    let report = dispatcher.run().await;
    drop(done_tx.send(()));
    if let Some(handle) = progress_handle
        && let Err(err) = handle.await
    {
        warn!("Progress indicator failed: {}", err);
    }
    let report = report?;

    let csv_path = PathBuf::from(args.csv_path());
    write_csv(&csv_path, &report.results).await?;
    info!("Wrote {} results to {}", report.results.len(), csv_path.display());

    let run_summary = RunSummary::from_report(&report)?;
    summary::print_summary(&run_name, &run_summary, &csv_path);

    let charts = if args.no_charts {
        ChartSet::default()
    } else {
        plot_charts(&report, &run_summary, Path::new(&args.charts_path), &run_name).await
    };

    Ok(RunOutcome {
        report,
        summary: run_summary,
        csv_path,
        charts,
    })
}

async fn plot_charts(
    report: &RunReport,
    run_summary: &RunSummary,
    charts_dir: &Path,
    run_name: &str,
) -> ChartSet {
    match render_charts(&report.results, &run_summary.status_counts, charts_dir, run_name).await {
        Ok(charts) => {
            for path in &charts.written {
                info!("Saved chart {}", path.display());
            }
            charts
        }
        Err(err) => {
            error!("Chart rendering failed: {}", err);
            ChartSet::default()
        }
    }
}

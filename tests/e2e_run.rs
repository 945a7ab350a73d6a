mod support;

use std::future::Future;
use std::time::Duration;

use resilience_tester::args::{PositiveU64, PositiveUsize, RequestRate};
use resilience_tester::domain::run::{RequestPlan, RunConfig};
use resilience_tester::http::run_load;
use resilience_tester::metrics::RunReport;

use support::{ServerMode, spawn_http_server};

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn duration_config(
    url: &str,
    rps: u64,
    secs: u64,
    concurrency: usize,
    timeout: Duration,
) -> Result<RunConfig, String> {
    let rate = RequestRate::per_second(rps).ok_or_else(|| "rate overflow".to_owned())?;
    let secs = PositiveU64::try_from(secs).map_err(|err| err.to_string())?;
    let concurrency = PositiveUsize::try_from(concurrency).map_err(|err| err.to_string())?;
    RunConfig::new(
        url,
        rate,
        RequestPlan::Duration(secs),
        concurrency,
        timeout,
    )
    .map_err(|err| err.to_string())
}

fn check_dense_ids(report: &RunReport, planned: u64) -> Result<(), String> {
    let ids: Vec<u64> = report.results.iter().map(|result| result.id()).collect();
    let expected: Vec<u64> = (1..=planned).collect();
    if ids != expected {
        return Err(format!("Expected ids 1..={}, got {:?}", planned, ids));
    }
    if report.planned != planned {
        return Err(format!("Unexpected planned count {}", report.planned));
    }
    Ok(())
}

#[test]
fn e2e_run_paced_requests_all_succeed() -> Result<(), String> {
    let (url, _server) = spawn_http_server(ServerMode::Ok)?;
    run_async_test(async move {
        let config = duration_config(&url, 10, 2, 5, Duration::from_secs(10))?;
        let report = run_load(config).await.map_err(|err| err.to_string())?;

        check_dense_ids(&report, 20)?;
        for result in &report.results {
            if result.status() != Some(200) {
                return Err(format!("Request {} got {:?}", result.id(), result.status()));
            }
            match result.latency() {
                Some(latency) if latency < Duration::from_secs(1) => {}
                other => return Err(format!("Unexpected latency {:?}", other)),
            }
        }
        if report.elapsed < Duration::from_millis(1_800)
            || report.elapsed > Duration::from_millis(3_500)
        {
            return Err(format!("Run took {:?}, expected about 2s", report.elapsed));
        }
        Ok(())
    })
}

#[test]
fn e2e_run_unresponsive_endpoint_times_out() -> Result<(), String> {
    let (url, _server) = spawn_http_server(ServerMode::Hang)?;
    run_async_test(async move {
        let config = duration_config(&url, 10, 2, 5, Duration::from_millis(300))?;
        let report = run_load(config).await.map_err(|err| err.to_string())?;

        check_dense_ids(&report, 20)?;
        for result in &report.results {
            if !result.is_error() || result.latency().is_some() {
                return Err(format!("Request {} should have failed", result.id()));
            }
            if result.status_label() != "ERROR" {
                return Err(format!("Unexpected status {}", result.status_label()));
            }
            match result.error() {
                Some(message) if message.contains("timed out") => {}
                other => return Err(format!("Expected a timeout message, got {:?}", other)),
            }
        }
        Ok(())
    })
}

#[test]
fn e2e_run_concurrency_bounds_wall_time() -> Result<(), String> {
    let (url, _server) = spawn_http_server(ServerMode::Delay(Duration::from_millis(20)))?;
    run_async_test(async move {
        let config = duration_config(&url, 100, 1, 1, Duration::from_secs(10))?;
        let report = run_load(config).await.map_err(|err| err.to_string())?;

        check_dense_ids(&report, 100)?;
        if report.results.iter().any(|result| result.status() != Some(200)) {
            return Err("Expected every request to succeed".to_owned());
        }
        if report.elapsed < Duration::from_secs(2) {
            return Err(format!(
                "Run took {:?}; a single worker cannot finish 100 x 20ms sooner",
                report.elapsed
            ));
        }
        Ok(())
    })
}

#[test]
fn e2e_run_fractional_rate_rounds_planned_count() -> Result<(), String> {
    let (url, _server) = spawn_http_server(ServerMode::Ok)?;
    run_async_test(async move {
        let rate = "2.5"
            .parse::<RequestRate>()
            .map_err(|err| err.to_string())?;
        let config = RunConfig::new(
            &url,
            rate,
            RequestPlan::Duration(PositiveU64::try_from(1).map_err(|err| err.to_string())?),
            PositiveUsize::try_from(2).map_err(|err| err.to_string())?,
            Duration::from_secs(5),
        )
        .map_err(|err| err.to_string())?;
        if config.requests_planned().map_err(|err| err.to_string())? != 3 {
            return Err("2.5 rps over 1s should round to 3 requests".to_owned());
        }
        let report = run_load(config).await.map_err(|err| err.to_string())?;
        check_dense_ids(&report, 3)
    })
}

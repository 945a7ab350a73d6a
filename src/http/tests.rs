use super::*;
use crate::args::{PositiveU64, PositiveUsize, RequestRate};
use crate::domain::run::{RequestPlan, RunConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

#[derive(Clone, Copy)]
enum ServerMode {
    Ok,
    Status(u16),
    Delay(Duration),
    Hang,
}

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

async fn spawn_server(mode: ServerMode) -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buffer = [0u8; 1024];
                if stream.read(&mut buffer).await.is_err() {
                    return;
                }
                let status = match mode {
                    ServerMode::Ok => 200,
                    ServerMode::Status(code) => code,
                    ServerMode::Delay(delay) => {
                        tokio::time::sleep(delay).await;
                        200
                    }
                    ServerMode::Hang => {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        return;
                    }
                };
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
                    status
                );
                drop(stream.write_all(response.as_bytes()).await);
                drop(stream.shutdown().await);
            });
        }
    });
    Ok(format!("http://{}/", addr))
}

fn run_config(
    url: &str,
    rate: &str,
    plan: RequestPlan,
    concurrency: usize,
    timeout: Duration,
) -> Result<RunConfig, String> {
    let rate = rate
        .parse::<RequestRate>()
        .map_err(|err| err.to_string())?;
    let concurrency = PositiveUsize::try_from(concurrency).map_err(|err| err.to_string())?;
    RunConfig::new(url, rate, plan, concurrency, timeout).map_err(|err| err.to_string())
}

fn count(value: u64) -> Result<RequestPlan, String> {
    PositiveU64::try_from(value)
        .map(RequestPlan::Count)
        .map_err(|err| err.to_string())
}

fn check_spacing(slots: &[Instant], interval: Duration) -> Result<(), String> {
    for pair in slots.windows(2) {
        if let [earlier, later] = pair {
            let gap = later.duration_since(*earlier);
            if gap != interval {
                return Err(format!("Expected gap {:?}, got {:?}", interval, gap));
            }
        }
    }
    Ok(())
}

#[test]
fn reserve_spaces_slots_by_interval() -> Result<(), String> {
    let scheduler = RateScheduler::new(RequestRate::from_millirps(20_000));
    let slots: Vec<Instant> = (0..10).map(|_| scheduler.reserve()).collect();
    if scheduler.interval() != Duration::from_millis(50) {
        return Err(format!("Unexpected interval: {:?}", scheduler.interval()));
    }
    check_spacing(&slots, Duration::from_millis(50))
}

#[test]
fn reserve_under_thread_contention_keeps_spacing() -> Result<(), String> {
    let scheduler = RateScheduler::with_interval(Duration::from_micros(250));
    let mut slots: Vec<Instant> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| (0..200).map(|_| scheduler.reserve()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .flatten()
            .collect()
    });
    if slots.len() != 1600 {
        return Err(format!("Expected 1600 slots, got {}", slots.len()));
    }
    slots.sort_unstable();
    check_spacing(&slots, Duration::from_micros(250))
}

#[test]
fn wait_for_turn_orders_concurrent_callers() -> Result<(), String> {
    run_async_test(async {
        let scheduler = Arc::new(RateScheduler::new(RequestRate::from_millirps(50_000)));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move {
                let slot = scheduler.wait_for_turn().await;
                (slot, Instant::now())
            }));
        }
        let mut observed = Vec::with_capacity(handles.len());
        for handle in handles {
            observed.push(handle.await.map_err(|err| err.to_string())?);
        }
        for (slot, returned_at) in &observed {
            if returned_at < slot {
                return Err("Caller returned before its slot".to_owned());
            }
        }
        let mut slots: Vec<Instant> = observed.iter().map(|(slot, _)| *slot).collect();
        slots.sort_unstable();
        check_spacing(&slots, Duration::from_millis(20))
    })
}

#[test]
fn unthrottled_scheduler_never_waits() -> Result<(), String> {
    run_async_test(async {
        let scheduler = RateScheduler::new(RequestRate::UNTHROTTLED);
        if !scheduler.interval().is_zero() || !RateScheduler::unthrottled().interval().is_zero() {
            return Err("Expected zero interval".to_owned());
        }
        let start = Instant::now();
        for _ in 0..1000 {
            scheduler.wait_for_turn().await;
        }
        if start.elapsed() > Duration::from_millis(200) {
            return Err(format!("Unthrottled calls took {:?}", start.elapsed()));
        }
        Ok(())
    })
}

#[test]
fn late_caller_does_not_compound_delay() -> Result<(), String> {
    run_async_test(async {
        let scheduler = RateScheduler::with_interval(Duration::from_millis(100));
        let first = scheduler.reserve();
        tokio::time::sleep(Duration::from_millis(350)).await;

        let start = Instant::now();
        let late = scheduler.wait_for_turn().await;
        if start.elapsed() > Duration::from_millis(30) {
            return Err(format!("Late caller waited {:?}", start.elapsed()));
        }
        if late.duration_since(first) != Duration::from_millis(100) {
            return Err("Late caller got a shifted slot".to_owned());
        }
        let mut slots = vec![first, late];
        for _ in 0..3 {
            slots.push(scheduler.wait_for_turn().await);
        }
        check_spacing(&slots, Duration::from_millis(100))
    })
}

#[test]
fn execute_request_records_status_and_latency() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_server(ServerMode::Status(503)).await?;
        let config = run_config(&url, "0", count(1)?, 1, Duration::from_secs(5))?;
        let client = build_client(&config).map_err(|err| err.to_string())?;

        let result = execute_request(&client, &config.url, 3).await;
        if result.id() != 3 {
            return Err(format!("Unexpected id: {}", result.id()));
        }
        if result.status() != Some(503) {
            return Err(format!("Unexpected status: {:?}", result.status()));
        }
        match result.latency() {
            Some(latency) if latency < Duration::from_secs(1) => Ok(()),
            other => Err(format!("Unexpected latency: {:?}", other)),
        }
    })
}

#[test]
fn execute_request_captures_connection_failure() -> Result<(), String> {
    run_async_test(async {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("addr failed: {}", err))?;
        drop(listener);

        let url = format!("http://{}/", addr);
        let config = run_config(&url, "0", count(1)?, 1, Duration::from_secs(2))?;
        let client = build_client(&config).map_err(|err| err.to_string())?;

        let result = execute_request(&client, &config.url, 1).await;
        if !result.is_error() || result.latency().is_some() {
            return Err("Expected a failure without latency".to_owned());
        }
        match result.error() {
            Some(message) if !message.is_empty() => Ok(()),
            other => Err(format!("Expected an error message, got {:?}", other)),
        }
    })
}

#[test]
fn execute_request_reports_timeouts() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_server(ServerMode::Hang).await?;
        let config = run_config(&url, "0", count(1)?, 1, Duration::from_millis(200))?;
        let client = build_client(&config).map_err(|err| err.to_string())?;

        let result = execute_request(&client, &config.url, 1).await;
        match result.error() {
            Some(message) if message.contains("timed out") => Ok(()),
            other => Err(format!("Expected a timeout message, got {:?}", other)),
        }
    })
}

#[test]
fn dispatcher_returns_dense_ordered_results() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_server(ServerMode::Delay(Duration::from_millis(5))).await?;
        let config = run_config(&url, "0", count(25)?, 4, Duration::from_secs(5))?;
        let dispatcher = Dispatcher::new(config).map_err(|err| err.to_string())?;
        let progress = dispatcher.progress();
        if dispatcher.planned() != 25 || progress.planned() != 25 {
            return Err("Unexpected planned count".to_owned());
        }

        let report = dispatcher.run().await.map_err(|err| err.to_string())?;
        let ids: Vec<u64> = report.results.iter().map(|result| result.id()).collect();
        let expected: Vec<u64> = (1..=25).collect();
        if ids != expected {
            return Err(format!("Unexpected ids: {:?}", ids));
        }
        if !progress.is_finished() || progress.completed() != 25 {
            return Err(format!("Unexpected progress: {}", progress.completed()));
        }
        if report.results.iter().any(|result| result.status() != Some(200)) {
            return Err("Expected every request to succeed".to_owned());
        }
        Ok(())
    })
}

#[test]
fn dispatcher_records_failures_without_aborting() -> Result<(), String> {
    run_async_test(async {
        let closed = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .map_err(|err| format!("bind failed: {}", err))?;
        let url = format!("http://{}/", closed);
        let config = run_config(&url, "0", count(6)?, 2, Duration::from_secs(2))?;

        let report = run_load(config).await.map_err(|err| err.to_string())?;
        if report.results.len() != 6 {
            return Err(format!("Expected 6 results, got {}", report.results.len()));
        }
        if report.results.iter().any(|result| !result.is_error()) {
            return Err("Expected every request to fail".to_owned());
        }
        Ok(())
    })
}

#[test]
fn dispatcher_rejects_empty_plan_before_sending() -> Result<(), String> {
    let secs = PositiveU64::try_from(10).map_err(|err| err.to_string())?;
    let config = run_config(
        "http://127.0.0.1:9/",
        "0",
        RequestPlan::Duration(secs),
        1,
        Duration::from_secs(1),
    )?;
    if Dispatcher::new(config).is_ok() {
        return Err("Expected an unthrottled duration plan to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn dispatcher_never_sees_concurrency_beyond_pool_limit() -> Result<(), String> {
    let limit = tokio::sync::Semaphore::MAX_PERMITS;
    if run_config("http://127.0.0.1:9/", "0", count(1)?, usize::MAX, Duration::from_secs(1)).is_ok() {
        return Err("Expected usize::MAX concurrency to be rejected".to_owned());
    }
    if run_config("http://127.0.0.1:9/", "0", count(1)?, limit.saturating_add(1), Duration::from_secs(1))
        .is_ok()
    {
        return Err("Expected concurrency above the pool limit to be rejected".to_owned());
    }
    run_async_test(async move {
        let config = run_config("http://127.0.0.1:9/", "0", count(1)?, limit, Duration::from_secs(1))?;
        Dispatcher::new(config).map_err(|err| err.to_string())?;
        Ok(())
    })
}

#[test]
fn status_codes_are_not_failures() -> Result<(), String> {
    run_async_test(async {
        let url = spawn_server(ServerMode::Status(404)).await?;
        let config = run_config(&url, "0", count(3)?, 3, Duration::from_secs(5))?;
        let report = run_load(config).await.map_err(|err| err.to_string())?;
        if report.results.iter().any(|result| result.status() != Some(404)) {
            return Err("Expected every result to carry 404".to_owned());
        }
        Ok(())
    })
}

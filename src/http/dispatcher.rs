use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use reqwest::{Client, Url};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::domain::run::RunConfig;
use crate::error::{AppError, AppResult, DispatchError};
use crate::metrics::{RequestResult, RunReport};

use super::client::build_client;
use super::executor::execute_request;
use super::rate::RateScheduler;

const MAX_PREALLOCATED_RESULTS: usize = 1 << 20;

/// Completed-vs-planned counter shared between the dispatcher and observers.
#[derive(Debug, Clone)]
pub struct Progress {
    completed: Arc<AtomicU64>,
    planned: u64,
}

impl Progress {
    #[must_use]
    pub fn new(planned: u64) -> Self {
        Self {
            completed: Arc::new(AtomicU64::new(0)),
            planned,
        }
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn planned(&self) -> u64 {
        self.planned
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed() >= self.planned
    }

    fn record_completion(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drives one run: bounded submission, scheduled firing, and collection.
#[derive(Debug)]
pub struct Dispatcher {
    config: RunConfig,
    client: Client,
    planned: u64,
    progress: Progress,
}

impl Dispatcher {
    /// Validates the run and prepares the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan is empty or the client cannot be built.
    /// No request is issued in that case.
    pub fn new(config: RunConfig) -> AppResult<Self> {
        let planned = config.requests_planned()?;
        let client = build_client(&config)?;
        Ok(Self {
            config,
            client,
            planned,
            progress: Progress::new(planned),
        })
    }

    #[must_use]
    pub const fn planned(&self) -> u64 {
        self.planned
    }

    /// Handle for observing progress while [`Dispatcher::run`] executes.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    /// Issues every planned request and returns the results ordered by id.
    ///
    /// Individual request failures are recorded as results and never abort the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker pool or the collector fails.
    pub async fn run(self) -> AppResult<RunReport> {
        let Self {
            config,
            client,
            planned,
            progress,
        } = self;
        let concurrency = config.concurrency.get();
        if config.rate.is_unthrottled() {
            info!(
                "Dispatching {} requests to {} unthrottled (concurrency {})",
                planned, config.url, concurrency
            );
        } else {
            info!(
                "Dispatching {} requests to {} at {} rps (concurrency {})",
                planned, config.url, config.rate, concurrency
            );
        }

        let run_start = Instant::now();
        let scheduler = Arc::new(RateScheduler::new(config.rate));
        let pool = Arc::new(Semaphore::new(concurrency));
        let url = Arc::new(config.url);
        let (result_tx, result_rx) = mpsc::channel::<RequestResult>(concurrency);
        let capacity = usize::try_from(planned)
            .unwrap_or(MAX_PREALLOCATED_RESULTS)
            .min(MAX_PREALLOCATED_RESULTS);
        let collector = tokio::spawn(collect_results(result_rx, progress, capacity));

        let mut executions = JoinSet::new();
        for id in 1..=planned {
            let permit = Arc::clone(&pool)
                .acquire_owned()
                .await
                .map_err(|err| AppError::dispatch(DispatchError::PoolClosed { id, source: err }))?;
            let execution = Execution {
                id,
                client: client.clone(),
                url: Arc::clone(&url),
                scheduler: Arc::clone(&scheduler),
                result_tx: result_tx.clone(),
            };
            executions.spawn(async move {
                let _permit = permit;
                execution.fire().await;
            });

            while let Some(joined) = executions.try_join_next() {
                joined.map_err(|err| AppError::dispatch(DispatchError::TaskFailed { source: err }))?;
            }
        }
        drop(result_tx);

        while let Some(joined) = executions.join_next().await {
            joined.map_err(|err| AppError::dispatch(DispatchError::TaskFailed { source: err }))?;
        }

        let results = collector
            .await
            .map_err(|err| AppError::dispatch(DispatchError::CollectorFailed { source: err }))?;
        let elapsed = run_start.elapsed();

        let collected = u64::try_from(results.len()).unwrap_or(u64::MAX);
        if collected != planned {
            return Err(AppError::dispatch(DispatchError::IncompleteResults {
                planned,
                collected,
            }));
        }

        info!(
            "Completed {} requests in {}.{:03}s",
            collected,
            elapsed.as_secs(),
            elapsed.subsec_millis()
        );
        Ok(RunReport {
            results,
            planned,
            elapsed,
        })
    }
}

/// Runs a whole load test for `config`.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the dispatcher fails.
pub async fn run_load(config: RunConfig) -> AppResult<RunReport> {
    Dispatcher::new(config)?.run().await
}

struct Execution {
    id: u64,
    client: Client,
    url: Arc<Url>,
    scheduler: Arc<RateScheduler>,
    result_tx: mpsc::Sender<RequestResult>,
}

impl Execution {
    async fn fire(self) {
        self.scheduler.wait_for_turn().await;
        let result = execute_request(&self.client, &self.url, self.id).await;
        if self.result_tx.send(result).await.is_err() {
            warn!("Result collector closed; dropping result {}", self.id);
        }
    }
}

async fn collect_results(
    mut result_rx: mpsc::Receiver<RequestResult>,
    progress: Progress,
    capacity: usize,
) -> Vec<RequestResult> {
    let mut results = Vec::with_capacity(capacity);
    while let Some(result) = result_rx.recv().await {
        results.push(result);
        progress.record_completion();
    }
    results.sort_unstable_by_key(RequestResult::id);
    results
}

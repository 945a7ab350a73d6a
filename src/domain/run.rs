use std::time::Duration;

use reqwest::Url;
use tokio::sync::Semaphore;

use crate::args::{DEFAULT_USER_AGENT, PositiveU64, PositiveUsize, RequestRate, TesterArgs};
use crate::error::{AppError, AppResult, ValidationError};

/// How many requests a run issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPlan {
    /// `round(rate * seconds)` requests.
    Duration(PositiveU64),
    /// Exactly this many requests, whatever the rate.
    Count(PositiveU64),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: Url,
    pub rate: RequestRate,
    pub plan: RequestPlan,
    pub concurrency: PositiveUsize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl RunConfig {
    /// Builds a run configuration, validating the target URL and pool size.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL cannot be parsed or is not http(s), or
    /// when the concurrency exceeds what the worker pool can hold.
    pub fn new(
        url: &str,
        rate: RequestRate,
        plan: RequestPlan,
        concurrency: PositiveUsize,
        request_timeout: Duration,
    ) -> AppResult<Self> {
        if concurrency.get() > Semaphore::MAX_PERMITS {
            return Err(AppError::validation(ValidationError::ConcurrencyTooLarge {
                value: concurrency.get(),
                max: Semaphore::MAX_PERMITS,
            }));
        }
        Ok(Self {
            url: parse_target_url(url)?,
            rate,
            plan,
            concurrency,
            request_timeout,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Derives the run configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let url = args
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        let plan = args
            .requests
            .map_or(RequestPlan::Duration(args.target_duration), RequestPlan::Count);
        Self::new(
            url,
            args.rate,
            plan,
            args.concurrency,
            args.request_timeout,
        )
    }

    /// Number of requests the run must complete.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan resolves to zero requests or overflows.
    pub fn requests_planned(&self) -> AppResult<u64> {
        let planned = match self.plan {
            RequestPlan::Count(count) => count.get(),
            RequestPlan::Duration(secs) => self
                .rate
                .requests_over(secs.get())
                .ok_or_else(|| AppError::validation(ValidationError::PlannedOverflow))?,
        };
        if planned == 0 {
            let duration_secs = match self.plan {
                RequestPlan::Duration(secs) => secs.get(),
                RequestPlan::Count(_) => 0,
            };
            return Err(AppError::validation(ValidationError::NothingPlanned {
                rate: self.rate.to_string(),
                duration_secs,
            }));
        }
        Ok(planned)
    }
}

fn parse_target_url(url: &str) -> AppResult<Url> {
    let parsed = Url::parse(url).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AppError::validation(ValidationError::UnsupportedScheme {
            scheme: other.to_owned(),
        })),
    }
}

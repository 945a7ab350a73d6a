use std::time::Duration;

use chrono::{DateTime, Local};

/// Status label recorded for requests that never produced a response.
pub const ERROR_STATUS: &str = "ERROR";

const GENERIC_FAILURE: &str = "request failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success { status: u16, latency: Duration },
    Failure { message: String },
}

impl RequestOutcome {
    /// Builds a failure, substituting a generic description for an empty one.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::Failure {
                message: GENERIC_FAILURE.to_owned(),
            };
        }
        Self::Failure { message }
    }
}

/// Outcome of one scheduled request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestResult {
    id: u64,
    started_at: DateTime<Local>,
    outcome: RequestOutcome,
}

impl RequestResult {
    #[must_use]
    pub const fn new(id: u64, started_at: DateTime<Local>, outcome: RequestOutcome) -> Self {
        Self {
            id,
            started_at,
            outcome,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn started_at(&self) -> &DateTime<Local> {
        &self.started_at
    }

    #[must_use]
    pub const fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.outcome {
            RequestOutcome::Success { status, .. } => Some(status),
            RequestOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub const fn latency(&self) -> Option<Duration> {
        match self.outcome {
            RequestOutcome::Success { latency, .. } => Some(latency),
            RequestOutcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RequestOutcome::Success { .. } => None,
            RequestOutcome::Failure { message } => Some(message.as_str()),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.outcome, RequestOutcome::Failure { .. })
    }

    /// Status code as text, or [`ERROR_STATUS`] for failures.
    #[must_use]
    pub fn status_label(&self) -> String {
        self.status()
            .map_or_else(|| ERROR_STATUS.to_owned(), |status| status.to_string())
    }
}

/// Everything a finished run hands to the result sinks.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Ordered by id, dense from 1.
    pub results: Vec<RequestResult>,
    pub planned: u64,
    pub elapsed: Duration,
}

use reqwest::Client;
use tracing::error;

use crate::domain::run::RunConfig;
use crate::error::{AppError, AppResult, HttpError};

/// Builds the shared HTTP client for a run.
///
/// The per-request timeout is enforced here, at the transport layer.
///
/// # Errors
///
/// Returns an error when the client cannot be constructed.
pub fn build_client(config: &RunConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str())
        .pool_max_idle_per_host(config.concurrency.get())
        .build()
        .map_err(|err| {
            error!("Failed to build HTTP client: {}", err);
            AppError::http(HttpError::BuildClientFailed { source: err })
        })
}

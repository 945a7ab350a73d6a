use std::error::Error as _;

use chrono::Local;
use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::{RequestOutcome, RequestResult};

/// Performs one GET and turns whatever happens into a [`RequestResult`].
///
/// Latency covers the full response body. Transport failures, including
/// timeouts, become [`RequestOutcome::Failure`]; nothing is retried.
pub async fn execute_request(client: &Client, url: &Url, id: u64) -> RequestResult {
    let started_at = Local::now();
    let start = Instant::now();
    let outcome = match fetch_status(client, url).await {
        Ok(status) => RequestOutcome::Success {
            status,
            latency: start.elapsed(),
        },
        Err(err) => {
            let message = describe_error(&err);
            debug!("Request {} failed: {}", id, message);
            RequestOutcome::failure(message)
        }
    };
    RequestResult::new(id, started_at, outcome)
}

async fn fetch_status(client: &Client, url: &Url) -> Result<u16, reqwest::Error> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status().as_u16();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        chunk?;
    }
    Ok(status)
}

fn describe_error(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(inner) = source {
        let detail = inner.to_string();
        if !message.contains(&detail) {
            message.push_str(": ");
            message.push_str(&detail);
        }
        source = inner.source();
    }
    message
}

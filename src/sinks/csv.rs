use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{AppError, AppResult, SinkError};
use crate::metrics::RequestResult;

use super::summary::format_seconds;

const CSV_HEADER: &[u8] = b"id,time,status,latency,error\n";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Writes one row per result, in the order given.
///
/// # Errors
///
/// Returns an error when the file cannot be created or written.
pub async fn write_csv(path: &Path, results: &[RequestResult]) -> AppResult<()> {
    write_rows(path, results).await.map_err(|err| {
        AppError::sink(SinkError::WriteCsv {
            path: path.to_path_buf(),
            source: err,
        })
    })
}

async fn write_rows(path: &Path, results: &[RequestResult]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(CSV_HEADER).await?;
    for result in results {
        writer.write_all(csv_row(result).as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}

pub(super) fn csv_row(result: &RequestResult) -> String {
    let latency = result.latency().map(format_seconds).unwrap_or_default();
    let error = result.error().map(quote_field).unwrap_or_default();
    format!(
        "{},{},{},{},{}\n",
        result.id(),
        result.started_at().format(TIME_FORMAT),
        result.status_label(),
        latency,
        error
    )
}

/// Quotes a field when it contains a delimiter, quote or line break.
pub(super) fn quote_field(value: &str) -> String {
    if !value.contains([',', '"', '\n', '\r']) {
        return value.to_owned();
    }
    format!("\"{}\"", value.replace('"', "\"\""))
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write CSV '{path}': {source}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to create charts directory '{path}': {source}")]
    CreateChartsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render chart '{path}': {message}")]
    RenderChart { path: PathBuf, message: String },
    #[error("Histogram error: {message}")]
    Histogram { message: String },
}

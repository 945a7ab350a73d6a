use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Worker pool closed before request {id} could be submitted: {source}")]
    PoolClosed {
        id: u64,
        #[source]
        source: tokio::sync::AcquireError,
    },
    #[error("Request task failed: {source}")]
    TaskFailed {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Result collector failed: {source}")]
    CollectorFailed {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Collected {collected} results but {planned} were planned.")]
    IncompleteResults { planned: u64, collected: u64 },
}

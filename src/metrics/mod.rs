//! Result records produced by a run, plus latency histogram utilities.
mod histogram;
mod types;


pub use histogram::LatencyHistogram;
pub use types::{ERROR_STATUS, RequestOutcome, RequestResult, RunReport};

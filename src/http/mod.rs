//! Scheduled HTTP request execution: slot scheduling, single-request
//! execution, and the bounded dispatcher that drives a whole run.
mod client;
mod dispatcher;
mod executor;
mod rate;

#[cfg(test)]
mod tests;

pub use client::build_client;
pub use dispatcher::{Dispatcher, Progress, run_load};
pub use executor::execute_request;
pub use rate::RateScheduler;

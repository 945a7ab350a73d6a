//! Core library for the `resilience-tester` CLI.
//!
//! Fires HTTP GET requests at a fixed rate with bounded concurrency, records
//! one result per request, and hands the finished run to the CSV, summary and
//! chart sinks. The binary is a thin wrapper around [`run`].
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod metrics;
pub mod sinks;

mod app;
mod entry;
mod logger;

pub use entry::run;
pub use logger::init_logging;

use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_RUN_NAME, default_csv_path};
use super::parsers::{parse_duration_arg, parse_positive_u64, parse_positive_usize, parse_rate};
use super::types::{PositiveU64, PositiveUsize, Preset, RequestRate};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rate-controlled HTTP load generator: fires GET requests on a fixed schedule with bounded concurrency and records every outcome."
)]
pub struct TesterArgs {
    /// Target URL for the load test
    #[arg(long, short)]
    pub url: Option<String>,

    /// Requests per second (decimals allowed, 0 = unthrottled)
    #[arg(long = "rps", short = 'r', default_value = "50", value_parser = parse_rate)]
    pub rate: RequestRate,

    /// Duration of test (seconds)
    #[arg(
        long = "duration",
        short = 't',
        default_value = "300",
        value_parser = parse_positive_u64
    )]
    pub target_duration: PositiveU64,

    /// Send exactly N requests instead of rps * duration
    #[arg(long = "requests", short = 'n', value_parser = parse_positive_u64)]
    pub requests: Option<PositiveU64>,

    /// Max number of requests in flight at once
    #[arg(
        long = "concurrency",
        short = 'c',
        default_value = "40",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// Per-request timeout in seconds, fractions allowed (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Load preset (sets rps, duration, and concurrency unless given explicitly)
    #[arg(long, value_enum, ignore_case = true)]
    pub preset: Option<Preset>,

    /// Run name used for chart titles and default output names
    #[arg(long)]
    pub name: Option<String>,

    /// CSV output path (defaults to results_<name>.csv)
    #[arg(long = "out", short = 'o')]
    pub out: Option<String>,

    /// Directory for chart images
    #[arg(long = "charts-path", default_value = ".")]
    pub charts_path: String,

    /// Disable chart generation
    #[arg(long = "no-charts")]
    pub no_charts: bool,

    /// Hide the live progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by RESILIENCE_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR")]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./resilience.toml or ./resilience.json if present.
    #[arg(long)]
    pub config: Option<String>,
}

impl TesterArgs {
    #[must_use]
    pub fn run_name(&self) -> String {
        if let Some(name) = self.name.as_ref() {
            return name.clone();
        }
        self.preset
            .map_or(DEFAULT_RUN_NAME, Preset::as_str)
            .to_owned()
    }

    #[must_use]
    pub fn csv_path(&self) -> String {
        self.out
            .clone()
            .unwrap_or_else(|| default_csv_path(&self.run_name()))
    }
}

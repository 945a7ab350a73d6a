use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{info, warn};

use crate::app::run_local;
use crate::args::{TesterArgs, apply_preset};
use crate::config::{apply_config, load_config};
use crate::error::AppResult;

/// Default config filenames checked when no CLI args are provided.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["resilience.toml", "resilience.json"];

/// Process entry point: parse arguments, merge config, run the load test.
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, the runtime
/// cannot be built, or the run fails before producing results.
pub fn run() -> AppResult<()> {
    let Some((args, matches)) = parse_args()? else {
        return Ok(());
    };
    let args = resolve_args(args, &matches)?;

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn resolve_args(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<TesterArgs> {
    match load_config(args.config.as_deref())? {
        Some(config) => apply_config(&mut args, matches, &config)?,
        None => apply_preset(&mut args, matches)?,
    }
    Ok(args)
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(args: TesterArgs) -> AppResult<()> {
    let outcome = run_local(&args).await?;
    if outcome.summary.failures > 0 {
        warn!(
            "{} of {} requests failed",
            outcome.summary.failures,
            outcome.report.results.len()
        );
    }
    info!(
        "Run '{}' finished: results in {}, {} chart(s) written",
        args.run_name(),
        outcome.csv_path.display(),
        outcome.charts.written.len()
    );
    Ok(())
}

use clap::ArgMatches;

use crate::args::{PositiveU64, PositiveUsize, TesterArgs, apply_preset, is_cli};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Precedence is command line, then file, then preset, then defaults. The
/// preset (from the command line or the file) is applied first so that file
/// values can override it.
///
/// # Errors
///
/// Returns an error when config values are invalid.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "preset")
        && let Some(preset) = config.preset
    {
        args.preset = Some(preset);
    }
    apply_preset(args, matches)?;

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "rate")
        && let Some(rate) = config.rps.as_ref()
    {
        args.rate = rate.to_rate().map_err(|err| invalid_field("rps", err))?;
    }

    if !is_cli(matches, "target_duration")
        && let Some(duration) = config.duration
    {
        args.target_duration = ensure_positive_u64(duration, "duration")?;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = Some(ensure_positive_u64(requests, "requests")?);
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout
            .to_duration()
            .map_err(|err| invalid_field("timeout", err))?;
    }

    if !is_cli(matches, "name")
        && let Some(name) = config.name.clone()
    {
        args.name = Some(name);
    }

    if !is_cli(matches, "out")
        && let Some(out) = config.out.clone()
    {
        args.out = Some(out);
    }

    if !is_cli(matches, "charts_path")
        && let Some(charts_path) = config.charts_path.clone()
    {
        args.charts_path = charts_path;
    }

    apply_flag(&mut args.no_charts, matches, "no_charts", config.no_charts);
    apply_flag(&mut args.no_progress, matches, "no_progress", config.no_progress);
    apply_flag(&mut args.verbose, matches, "verbose", config.verbose);
    apply_flag(&mut args.no_color, matches, "no_color", config.no_color);

    Ok(())
}

fn apply_flag(flag: &mut bool, matches: &ArgMatches, name: &str, value: Option<bool>) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *flag = value;
    }
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn invalid_field(field: &str, source: ValidationError) -> AppError {
    AppError::config(ConfigError::InvalidField {
        field: field.to_owned(),
        source,
    })
}

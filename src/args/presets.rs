use clap::ArgMatches;
use clap::parser::ValueSource;

use super::cli::TesterArgs;
use super::types::{PositiveU64, PositiveUsize};
use crate::error::AppResult;

pub(crate) fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

/// Applies the selected preset to every load knob not set on the command line.
///
/// # Errors
///
/// Returns an error when a preset value is not a positive number.
pub fn apply_preset(args: &mut TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    let Some(preset) = args.preset else {
        return Ok(());
    };
    let profile = preset.profile();

    if !is_cli(matches, "rate") {
        args.rate = profile.rate;
    }
    if !is_cli(matches, "target_duration") {
        args.target_duration = PositiveU64::try_from(profile.duration_secs)?;
    }
    if !is_cli(matches, "concurrency") {
        args.concurrency = PositiveUsize::try_from(profile.concurrency)?;
    }
    Ok(())
}

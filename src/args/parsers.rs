use std::time::Duration;

use super::types::{PositiveU64, PositiveUsize, RequestRate};
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(crate) fn parse_rate(s: &str) -> AppResult<RequestRate> {
    s.parse::<RequestRate>().map_err(AppError::from)
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::from)
}

const MAX_FRACTION_DIGITS: usize = 3;

/// Parses `<number>[ms|s|m|h]`, defaulting to seconds. The number may carry up
/// to three decimals (`0.5`, `1.25s`). Zero is rejected.
pub(crate) fn parse_duration_value(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }
    let invalid_format = || ValidationError::InvalidDurationFormat {
        value: value.to_owned(),
    };

    let number_len = value
        .find(|ch: char| !ch.is_ascii_digit() && ch != '.')
        .unwrap_or(value.len());
    let (num_part, unit_part) = value.split_at(number_len);
    let (whole_part, fraction_part) = num_part.split_once('.').unwrap_or((num_part, ""));
    if whole_part.is_empty()
        || fraction_part.len() > MAX_FRACTION_DIGITS
        || fraction_part.contains('.')
        || num_part.ends_with('.')
    {
        return Err(invalid_format());
    }

    let number_error = |err| ValidationError::InvalidDurationNumber {
        value: value.to_owned(),
        source: err,
    };
    let whole: u64 = whole_part.parse().map_err(number_error)?;
    let mut fraction: u64 = if fraction_part.is_empty() {
        0
    } else {
        fraction_part.parse().map_err(number_error)?
    };
    for _ in fraction_part.len()..MAX_FRACTION_DIGITS {
        fraction = fraction.saturating_mul(10);
    }
    // Thousandths of the unit.
    let scaled = whole
        .checked_mul(1_000)
        .and_then(|milli| milli.checked_add(fraction))
        .ok_or(ValidationError::DurationOverflow)?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let unit_millis: u64 = match unit {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        _ => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };
    let micros = scaled
        .checked_mul(unit_millis)
        .ok_or(ValidationError::DurationOverflow)?;
    let duration = Duration::from_micros(micros);

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }

    Ok(duration)
}

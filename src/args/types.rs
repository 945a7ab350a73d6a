use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use crate::error::ValidationError;

const MILLIS_PER_UNIT: u64 = 1_000;
const NANOS_PER_KILOSECOND: u64 = 1_000_000_000_000;
const MAX_RATE_FRACTION_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveU64(NonZeroU64);

impl PositiveU64 {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PositiveU64 {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value)
            .map(PositiveU64)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveU64 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .trim()
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveU64::try_from(value)
    }
}

impl From<PositiveU64> for u64 {
    fn from(value: PositiveU64) -> Self {
        value.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveUsize(NonZeroUsize);

impl PositiveUsize {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for PositiveUsize {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(PositiveUsize)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveUsize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveUsize::try_from(value)
    }
}

impl From<PositiveUsize> for usize {
    fn from(value: PositiveUsize) -> Self {
        value.get()
    }
}

/// Target request rate, stored as thousandths of a request per second.
///
/// A rate of zero means the run is unthrottled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestRate {
    millirps: u64,
}

impl RequestRate {
    pub const UNTHROTTLED: Self = Self { millirps: 0 };

    #[must_use]
    pub const fn from_millirps(millirps: u64) -> Self {
        Self { millirps }
    }

    #[must_use]
    pub const fn per_second(rps: u64) -> Option<Self> {
        match rps.checked_mul(MILLIS_PER_UNIT) {
            Some(millirps) => Some(Self { millirps }),
            None => None,
        }
    }

    #[must_use]
    pub const fn millirps(self) -> u64 {
        self.millirps
    }

    #[must_use]
    pub const fn is_unthrottled(self) -> bool {
        self.millirps == 0
    }

    /// Spacing between two consecutive slots; zero when unthrottled.
    #[must_use]
    pub fn interval(self) -> Duration {
        NANOS_PER_KILOSECOND
            .checked_div(self.millirps)
            .map_or(Duration::ZERO, Duration::from_nanos)
    }

    /// Number of requests this rate issues over `secs`, rounded half up.
    #[must_use]
    pub fn requests_over(self, secs: u64) -> Option<u64> {
        let scaled = u128::from(self.millirps)
            .checked_mul(u128::from(secs))?
            .checked_add(u128::from(MILLIS_PER_UNIT / 2))?;
        let requests = scaled.checked_div(u128::from(MILLIS_PER_UNIT))?;
        u64::try_from(requests).ok()
    }
}

impl std::str::FromStr for RequestRate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(ValidationError::RateEmpty);
        }
        let invalid = || ValidationError::InvalidRate {
            value: value.to_owned(),
        };

        let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|ch| ch.is_ascii_digit())
            || !fraction.chars().all(|ch| ch.is_ascii_digit())
            || fraction.len() > MAX_RATE_FRACTION_DIGITS
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|err| ValidationError::InvalidNumber { source: err })?
        };
        let padded = format!("{:0<width$}", fraction, width = MAX_RATE_FRACTION_DIGITS);
        let fraction_millis: u64 = padded
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;

        let millirps = whole
            .checked_mul(MILLIS_PER_UNIT)
            .and_then(|value| value.checked_add(fraction_millis))
            .ok_or(ValidationError::RateOverflow)?;
        Ok(Self { millirps })
    }
}

impl std::fmt::Display for RequestRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.millirps / MILLIS_PER_UNIT;
        let fraction = self.millirps % MILLIS_PER_UNIT;
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:03}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Light,
    Medium,
    Heavy,
}

/// Rate, duration, and concurrency bundled under a preset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetProfile {
    pub rate: RequestRate,
    pub duration_secs: u64,
    pub concurrency: usize,
}

impl Preset {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Preset::Light => "light",
            Preset::Medium => "medium",
            Preset::Heavy => "heavy",
        }
    }

    #[must_use]
    pub const fn profile(self) -> PresetProfile {
        match self {
            Preset::Light => PresetProfile {
                rate: RequestRate::from_millirps(10_000),
                duration_secs: 60,
                concurrency: 10,
            },
            Preset::Medium => PresetProfile {
                rate: RequestRate::from_millirps(50_000),
                duration_secs: 300,
                concurrency: 40,
            },
            Preset::Heavy => PresetProfile {
                rate: RequestRate::from_millirps(200_000),
                duration_secs: 600,
                concurrency: 150,
            },
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Preset::Light),
            "medium" => Ok(Preset::Medium),
            "heavy" => Ok(Preset::Heavy),
            _ => Err(ValidationError::InvalidPreset {
                value: s.to_owned(),
            }),
        }
    }
}

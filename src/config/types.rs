use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_value;
use crate::args::{Preset, RequestRate};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "rate")]
    pub rps: Option<RateValue>,
    pub duration: Option<u64>,
    pub requests: Option<u64>,
    pub concurrency: Option<usize>,
    pub timeout: Option<DurationValue>,
    pub preset: Option<Preset>,
    pub name: Option<String>,
    pub out: Option<String>,
    pub charts_path: Option<String>,
    pub no_charts: Option<bool>,
    pub no_progress: Option<bool>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

/// A rate written as an integer, a decimal, or a string such as `"2.5"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RateValue {
    Whole(u64),
    Decimal(f64),
    Text(String),
}

impl RateValue {
    pub(crate) fn to_rate(&self) -> Result<RequestRate, ValidationError> {
        match self {
            RateValue::Whole(rps) => {
                RequestRate::per_second(*rps).ok_or(ValidationError::RateOverflow)
            }
            RateValue::Decimal(rps) => rps.to_string().parse(),
            RateValue::Text(text) => text.parse(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}

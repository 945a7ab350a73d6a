use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing URL (set --url or provide in config).")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("Rate must not be empty.")]
    RateEmpty,
    #[error("Invalid rate '{value}'. Expected a non-negative number with up to 3 decimals.")]
    InvalidRate { value: String },
    #[error("Rate overflow.")]
    RateOverflow,
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Concurrency {value} exceeds the maximum of {max}.")]
    ConcurrencyTooLarge { value: usize, max: usize },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid preset '{value}'. Use light, medium, or heavy.")]
    InvalidPreset { value: String },
    #[error("Run plans zero requests (rate {rate} rps over {duration_secs}s).")]
    NothingPlanned { rate: String, duration_secs: u64 },
    #[error("Planned request count overflow.")]
    PlannedOverflow,
}

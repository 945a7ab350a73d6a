//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod presets;
mod types;


pub use cli::TesterArgs;
pub use presets::apply_preset;
pub(crate) use presets::is_cli;
pub use types::{PositiveU64, PositiveUsize, Preset, PresetProfile, RequestRate};

pub(crate) use defaults::DEFAULT_USER_AGENT;

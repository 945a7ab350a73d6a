//! Consumers of a finished run: CSV export, summary statistics and charts.
mod charts;
mod csv;
mod summary;


pub use charts::{ChartSet, render_charts};
pub use csv::write_csv;
pub use summary::{RunSummary, format_seconds};

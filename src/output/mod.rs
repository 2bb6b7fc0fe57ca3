//! Report rendering

pub mod formatter;

pub use formatter::{OutputFormatter, ReportGenerator};

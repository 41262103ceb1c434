//! Output module: rendering, reports, console formatting and persistence

pub mod formatter;
pub mod persist;
pub mod renderer;
pub mod report;

pub use formatter::ConsoleFormatter;
pub use renderer::{DocumentRenderer, Renderer};
pub use report::OptimizationReport;

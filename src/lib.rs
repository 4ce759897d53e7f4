//! Crawls the same-origin pages linked from a seed URL, audits each one with
//! axe-core and an optional WCAG contrast scan, and aggregates the findings
//! into a report.

pub mod audit;
pub mod browser;
pub mod cli;
pub mod crawler;
pub mod error;
pub mod report;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types
pub use crawler::{CrawlEvent, CrawlOrchestrator};
pub use error::CrawlError;
pub use report::{CrawlOptions, Report, ReportFormatter};

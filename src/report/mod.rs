pub mod formatter;
pub mod model;
pub mod translate;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

// Re-export common types
pub use formatter::{severity_label, ReportFormatter};
pub use model::{ContrastViolation, CrawlOptions, Impact, NodeSnapshot, PageResult, Report, Violation};
pub use translate::{Language, Translate, Translator};

/// Export format of a saved report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// Render the report in the requested format
pub fn render(report: &Report, format: ExportFormat, formatter: &ReportFormatter<'_>) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(formatter.render(report)),
        ExportFormat::Json => serde_json::to_string_pretty(report).context("Failed to serialize report"),
    }
}

/// Write a rendered report verbatim to `path`
pub fn save(contents: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(path, contents).context(format!("Failed to write report: {}", path.display()))?;
    info!("Report saved to: {}", path.display());

    Ok(())
}

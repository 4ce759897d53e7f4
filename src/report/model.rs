use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::audit::color::Color;
use crate::error::CrawlError;

/// Maximum length of captured HTML and text snippets, in characters
pub const SNIPPET_MAX_CHARS: usize = 100;

/// WCAG AA pass bar for normal text
pub const CONTRAST_THRESHOLD: f64 = 4.5;

/// Truncate a string to at most `max` characters
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Options for a single crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub seed_url: Url,
    pub contrast_check_enabled: bool,
}

impl CrawlOptions {
    /// Validate a seed URL typed by the user
    pub fn new(seed: &str, contrast_check_enabled: bool) -> Result<Self, CrawlError> {
        let seed = seed.trim();
        if seed.is_empty() {
            return Err(CrawlError::InvalidInput("no URL given".to_string()));
        }

        let seed_url = Url::parse(seed)
            .map_err(|e| CrawlError::InvalidInput(format!("{}: {}", seed, e)))?;

        if !matches!(seed_url.scheme(), "http" | "https") || seed_url.host_str().is_none() {
            return Err(CrawlError::InvalidInput(format!(
                "{}: only http and https URLs can be crawled",
                seed
            )));
        }

        Ok(Self {
            seed_url,
            contrast_check_enabled,
        })
    }
}

/// Severity reported by the audit engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
    Unknown,
}

impl Impact {
    pub fn from_engine(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("minor") => Impact::Minor,
            Some("moderate") => Impact::Moderate,
            Some("serious") => Impact::Serious,
            Some("critical") => Impact::Critical,
            _ => Impact::Unknown,
        }
    }
}

/// Textual capture of a DOM node, taken while the page is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub html_snippet: String,
}

impl NodeSnapshot {
    pub fn new(html: &str) -> Self {
        Self {
            html_snippet: truncate_chars(html, SNIPPET_MAX_CHARS),
        }
    }
}

/// A single accessibility rule failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub description: String,
    pub impact: Impact,
    pub help_text: String,
    pub help_url: Option<String>,
    pub affected_nodes: Vec<NodeSnapshot>,
}

/// An element whose text fails the contrast threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastViolation {
    pub element_tag: String,
    pub text: String,
    pub foreground: Color,
    pub background: Color,
    pub ratio: f64,
}

impl ContrastViolation {
    /// Build a violation if `ratio` is below the threshold, `None` otherwise
    pub fn check(
        element_tag: String,
        text: &str,
        foreground: Color,
        background: Color,
        ratio: f64,
    ) -> Option<Self> {
        if ratio < CONTRAST_THRESHOLD {
            Some(Self {
                element_tag,
                text: truncate_chars(text.trim(), SNIPPET_MAX_CHARS),
                foreground,
                background,
                ratio,
            })
        } else {
            None
        }
    }
}

/// Audit results for one visited page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: Url,
    pub accessibility_violations: Vec<Violation>,
    pub contrast_violations: Vec<ContrastViolation>,

    /// Page-wide contrast scan failure, if any
    pub contrast_error: Option<String>,
}

impl PageResult {
    pub fn has_findings(&self) -> bool {
        !self.accessibility_violations.is_empty()
            || !self.contrast_violations.is_empty()
            || self.contrast_error.is_some()
    }
}

/// Aggregated result of one crawl run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub seed_url: Url,
    pub contrast_checked: bool,
    pub pages: Vec<PageResult>,
    pub total_pages_planned: usize,
    pub pages_completed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(options: &CrawlOptions) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed_url: options.seed_url.clone(),
            contrast_checked: options.contrast_check_enabled,
            pages: Vec::new(),
            total_pages_planned: 0,
            pages_completed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn push_page(&mut self, page: PageResult) {
        self.pages.push(page);
        self.pages_completed = self.pages.len();
    }

    pub fn finalize(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn accessibility_violation_count(&self) -> usize {
        self.pages.iter().map(|p| p.accessibility_violations.len()).sum()
    }

    pub fn contrast_violation_count(&self) -> usize {
        self.pages.iter().map(|p| p.contrast_violations.len()).sum()
    }

    /// No violations and no failed contrast scans on any page
    pub fn is_clean(&self) -> bool {
        !self.pages.iter().any(PageResult::has_findings)
    }
}

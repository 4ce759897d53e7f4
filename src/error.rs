use std::error::Error as StdError;
use thiserror::Error;

/// Errors raised by a browser driver implementation
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to navigate to {url}: {message}")]
    Navigation { url: String, message: String },

    /// The element belongs to a page that is no longer loaded, or was detached
    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("browser session error: {0}")]
    Session(String),
}

/// Errors raised by the accessibility audit engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load audit script: {0}")]
    ScriptLoad(String),

    #[error("failed to inject audit script")]
    Inject(#[source] DriverError),

    #[error("audit run failed")]
    Run(#[source] DriverError),

    #[error("audit engine returned malformed results: {0}")]
    MalformedResults(#[from] serde_json::Error),
}

/// Color value that matches neither the hex nor the rgb()/rgba() form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("unparsable color: {0:?}")]
    Unparsable(String),
}

/// Run-level failures of a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed URL: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("a crawl is already in progress")]
    AlreadyRunning,

    #[error("crawl cancelled")]
    Cancelled,
}

/// Full cause chain of an error, one cause per line
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

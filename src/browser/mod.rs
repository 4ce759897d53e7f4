pub mod script;
pub mod session;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::DriverError;

// Re-export common types
pub use script::ScriptLoader;
pub use session::BrowserSession;

/// Opaque reference to an element of the currently loaded page.
///
/// Handles carry the page epoch they were enumerated on; once the driver
/// navigates away every older handle is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    epoch: u64,
    index: usize,
}

impl ElementHandle {
    pub fn new(epoch: u64, index: usize) -> Self {
        Self { epoch, index }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// The operations the crawler needs from a browser automation backend
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url` and wait until the document is queryable
    async fn navigate(&mut self, url: &Url) -> Result<(), DriverError>;

    /// URL of the currently loaded page
    async fn current_url(&self) -> Result<Url, DriverError>;

    /// Raw `href` attributes of all anchor elements currently in the DOM
    async fn find_links(&self) -> Result<Vec<String>, DriverError>;

    /// All elements of the current page, in document order
    async fn enumerate_elements(&self) -> Result<Vec<ElementHandle>, DriverError>;

    /// Resolved value of a CSS property
    async fn computed_style(&self, element: &ElementHandle, property: &str) -> Result<String, DriverError>;

    async fn element_tag(&self, element: &ElementHandle) -> Result<String, DriverError>;

    async fn element_text(&self, element: &ElementHandle) -> Result<String, DriverError>;

    /// Run a synchronous script and return its JSON result
    async fn execute_script(&self, script: &str) -> Result<Value, DriverError>;

    /// Run a script whose last argument is a completion callback
    async fn execute_async_script(&self, script: &str) -> Result<Value, DriverError>;

    /// End the session; further calls fail
    async fn close(&mut self) -> Result<(), DriverError>;
}

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use thirtyfour::prelude::*;
use tokio::sync::Mutex;
use tracing::{debug, error};
use url::Url;

use crate::browser::{BrowserDriver, ElementHandle};
use crate::cli::config::BrowserSettings;
use crate::error::DriverError;

/// Interval between `document.readyState` polls
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// WebDriver-backed browser session
pub struct BrowserSession {
    /// Browser settings
    config: BrowserSettings,

    /// WebDriver instance
    driver: Option<WebDriver>,

    /// Elements of the current page, indexed by `ElementHandle::index`
    elements: Mutex<Vec<WebElement>>,

    /// Bumped on every navigation
    epoch: u64,
}

impl BrowserSession {
    /// Connect to the WebDriver server and start a Chrome session
    pub async fn connect(config: BrowserSettings) -> Result<Self, DriverError> {
        let mut caps = DesiredCapabilities::chrome();

        if config.headless {
            caps.set_headless().map_err(session_error)?;
        }

        caps.add_chrome_arg("--disable-gpu").map_err(session_error)?;
        caps.add_chrome_arg("--no-sandbox").map_err(session_error)?;
        caps.add_chrome_arg("--disable-dev-shm-usage").map_err(session_error)?;
        caps.add_chrome_arg("--ignore-certificate-errors").map_err(session_error)?;
        caps.add_chrome_arg("--disable-web-security").map_err(session_error)?;
        caps.add_chrome_arg(&format!(
            "--window-size={},{}",
            config.window_size.width, config.window_size.height
        ))
        .map_err(session_error)?;

        for arg in &config.extra_args {
            caps.add_chrome_arg(arg).map_err(session_error)?;
        }

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(|e| {
                DriverError::Session(format!(
                    "failed to connect to WebDriver at {}: {}",
                    config.webdriver_url, e
                ))
            })?;

        driver
            .set_page_load_timeout(Duration::from_secs(config.page_load_timeout_secs))
            .await
            .map_err(session_error)?;

        debug!("Browser session connected to {}", config.webdriver_url);

        Ok(Self {
            config,
            driver: Some(driver),
            elements: Mutex::new(Vec::new()),
            epoch: 0,
        })
    }

    fn driver(&self) -> Result<&WebDriver, DriverError> {
        self.driver
            .as_ref()
            .ok_or_else(|| DriverError::Session("browser session is closed".to_string()))
    }

    /// Resolve a handle against the element cache of the current page
    async fn element(&self, handle: &ElementHandle) -> Result<WebElement, DriverError> {
        if handle.epoch() != self.epoch {
            return Err(DriverError::StaleElement(format!(
                "element {} belongs to a previous page",
                handle.index()
            )));
        }

        let elements = self.elements.lock().await;
        elements
            .get(handle.index())
            .cloned()
            .ok_or_else(|| DriverError::StaleElement(format!("unknown element {}", handle.index())))
    }

    /// Poll until the document has finished loading
    async fn wait_until_ready(&self, url: &Url) -> Result<(), DriverError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.page_load_timeout_secs);

        loop {
            let state = self.execute_script("return document.readyState;").await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(DriverError::Navigation {
                    url: url.to_string(),
                    message: format!("page did not finish loading (readyState {})", state),
                });
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

fn session_error(err: WebDriverError) -> DriverError {
    DriverError::Session(err.to_string())
}

fn stale(err: WebDriverError) -> DriverError {
    DriverError::StaleElement(err.to_string())
}

#[async_trait]
impl BrowserDriver for BrowserSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), DriverError> {
        // Handles from the previous page must not resolve any more
        self.epoch += 1;
        self.elements.get_mut().clear();

        debug!("Navigating to: {}", url);
        self.driver()?
            .goto(url.as_str())
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        self.wait_until_ready(url).await
    }

    async fn current_url(&self) -> Result<Url, DriverError> {
        let current = self.driver()?.current_url().await.map_err(session_error)?;
        Url::parse(current.as_str()).map_err(|e| DriverError::Session(e.to_string()))
    }

    async fn find_links(&self) -> Result<Vec<String>, DriverError> {
        let anchors = self
            .driver()?
            .find_all(By::Tag("a"))
            .await
            .map_err(session_error)?;

        let mut links = Vec::new();
        for anchor in anchors {
            // Anchors removed since the query are skipped
            if let Ok(Some(href)) = anchor.attr("href").await {
                links.push(href);
            }
        }

        Ok(links)
    }

    async fn enumerate_elements(&self) -> Result<Vec<ElementHandle>, DriverError> {
        let found = self
            .driver()?
            .find_all(By::Css("*"))
            .await
            .map_err(session_error)?;

        let handles = (0..found.len())
            .map(|index| ElementHandle::new(self.epoch, index))
            .collect();

        *self.elements.lock().await = found;

        Ok(handles)
    }

    async fn computed_style(&self, element: &ElementHandle, property: &str) -> Result<String, DriverError> {
        self.element(element).await?.css_value(property).await.map_err(stale)
    }

    async fn element_tag(&self, element: &ElementHandle) -> Result<String, DriverError> {
        self.element(element).await?.tag_name().await.map_err(stale)
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, DriverError> {
        self.element(element).await?.text().await.map_err(stale)
    }

    async fn execute_script(&self, script: &str) -> Result<Value, DriverError> {
        let ret = self
            .driver()?
            .execute(script, Vec::new())
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;

        Ok(ret.json().clone())
    }

    async fn execute_async_script(&self, script: &str) -> Result<Value, DriverError> {
        let ret = self
            .driver()?
            .execute_async(script, Vec::new())
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;

        Ok(ret.json().clone())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.elements.get_mut().clear();

        if let Some(driver) = self.driver.take() {
            driver.quit().await.map_err(session_error)?;
            debug!("Browser session closed");
        }

        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            // Only reachable if the owner never called close()
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Err(e) = driver.quit().await {
                        error!("Error closing browser session during drop: {}", e);
                    }
                });
            }
        }
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::audit::contrast::ContrastAuditor;
use crate::audit::engine::AccessibilityEngine;
use crate::browser::BrowserDriver;
use crate::error::{error_chain, CrawlError};
use crate::report::model::{CrawlOptions, PageResult};

/// Audits one page: rule engine first, then the optional contrast scan
pub struct PageAuditor {
    engine: Arc<dyn AccessibilityEngine>,

    /// Extra wait after the document reports ready, for late scripts
    settle_delay: Duration,
}

impl PageAuditor {
    pub fn new(engine: Arc<dyn AccessibilityEngine>, settle_delay: Duration) -> Self {
        Self { engine, settle_delay }
    }

    /// Navigate to `url` and audit it.
    ///
    /// Navigation and engine failures are returned as errors. A contrast scan
    /// that cannot enumerate the page is recorded on the result instead.
    pub async fn audit<D: BrowserDriver>(
        &self,
        driver: &mut D,
        url: &Url,
        options: &CrawlOptions,
    ) -> Result<PageResult, CrawlError> {
        let timer = Instant::now();

        driver.navigate(url).await?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let driver: &dyn BrowserDriver = driver;

        self.engine.inject(driver).await?;
        let accessibility_violations = self.engine.run(driver).await?;
        debug!("{}: {} accessibility violations", url, accessibility_violations.len());

        let (contrast_violations, contrast_error) = if options.contrast_check_enabled {
            match ContrastAuditor::scan(driver).await {
                Ok(violations) => (violations, None),
                Err(e) => {
                    warn!("Contrast scan failed on {}: {}", url, e);
                    (Vec::new(), Some(error_chain(&e)))
                }
            }
        } else {
            (Vec::new(), None)
        };

        info!(
            "Audited {} in {} ms ({} violations, {} contrast issues)",
            url,
            timer.elapsed().as_millis(),
            accessibility_violations.len(),
            contrast_violations.len()
        );

        Ok(PageResult {
            url: url.clone(),
            accessibility_violations,
            contrast_violations,
            contrast_error,
        })
    }
}

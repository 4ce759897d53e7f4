//! Text/background contrast scan over the rendered DOM.

use tracing::{debug, trace};

use crate::audit::color::{contrast_ratio, Color};
use crate::browser::{BrowserDriver, ElementHandle};
use crate::error::DriverError;
use crate::report::model::{ContrastViolation, CONTRAST_THRESHOLD};

/// Finds elements whose computed text and background colors fail WCAG AA
pub struct ContrastAuditor;

impl ContrastAuditor {
    /// Scan every element of the loaded page, in enumeration order.
    ///
    /// Elements that cannot be read or whose colors do not parse are skipped.
    /// Only a failure to enumerate the page fails the scan.
    pub async fn scan(driver: &dyn BrowserDriver) -> Result<Vec<ContrastViolation>, DriverError> {
        let elements = driver.enumerate_elements().await?;
        let mut violations = Vec::new();
        let mut skipped = 0usize;

        for element in &elements {
            match Self::inspect(driver, element).await {
                Ok(Some(violation)) => violations.push(violation),
                Ok(None) => {}
                Err(e) => {
                    trace!("Skipping element {}: {}", element.index(), e);
                    skipped += 1;
                }
            }
        }

        debug!(
            "Contrast scan: {} elements, {} violations, {} skipped",
            elements.len(),
            violations.len(),
            skipped
        );

        Ok(violations)
    }

    async fn inspect(
        driver: &dyn BrowserDriver,
        element: &ElementHandle,
    ) -> Result<Option<ContrastViolation>, DriverError> {
        let foreground = driver.computed_style(element, "color").await?;
        let background = driver.computed_style(element, "background-color").await?;

        let (foreground, background) = match (foreground.parse::<Color>(), background.parse::<Color>()) {
            (Ok(fg), Ok(bg)) => (fg, bg),
            _ => return Ok(None),
        };

        let ratio = contrast_ratio(&foreground, &background);
        if ratio >= CONTRAST_THRESHOLD {
            return Ok(None);
        }

        let tag = driver.element_tag(element).await?;
        let text = driver.element_text(element).await?;

        Ok(ContrastViolation::check(tag, &text, foreground, background, ratio))
    }
}

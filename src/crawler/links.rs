use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::browser::BrowserDriver;
use crate::error::DriverError;

/// Same-origin link discovery for the loaded page
pub struct LinkCollector;

impl LinkCollector {
    /// Collect the absolute, same-origin links of the page currently loaded
    pub async fn collect(driver: &dyn BrowserDriver, base: &Url) -> Result<HashSet<Url>, DriverError> {
        let hrefs = driver.find_links().await?;
        let links = Self::same_origin_links(base, hrefs.iter().map(String::as_str));
        debug!("Found {} same-origin links out of {} anchors on {}", links.len(), hrefs.len(), base);
        Ok(links)
    }

    /// Resolve raw `href` values against `base` and keep those on its origin.
    ///
    /// `mailto:` targets and hrefs that fail to resolve are dropped.
    pub fn same_origin_links<'a>(base: &Url, hrefs: impl IntoIterator<Item = &'a str>) -> HashSet<Url> {
        let origin = base.origin();

        hrefs
            .into_iter()
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .filter(|href| !href.to_ascii_lowercase().starts_with("mailto:"))
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!("Skipping unresolvable link {:?}: {}", href, e);
                    None
                }
            })
            .filter(|url| url.origin() == origin)
            .collect()
    }
}

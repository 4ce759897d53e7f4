//! In-memory browser used by unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::browser::{BrowserDriver, ElementHandle};
use crate::error::DriverError;

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub tag: String,
    pub text: String,
    pub color: String,
    pub background: String,
    pub stale: bool,
}

impl FakeElement {
    pub fn new(tag: &str, text: &str, color: &str, background: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            color: color.to_string(),
            background: background.to_string(),
            stale: false,
        }
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    pub links: Vec<String>,
    pub elements: Vec<FakeElement>,
    pub axe_result: Value,
    pub fail_enumeration: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            elements: Vec::new(),
            axe_result: json!({ "violations": [] }),
            fail_enumeration: false,
        }
    }

    pub fn with_links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_axe_result(mut self, result: Value) -> Self {
        self.axe_result = result;
        self
    }

    /// A single violation with the given impact
    pub fn with_violation(self, rule_id: &str, impact: &str) -> Self {
        self.with_axe_result(json!({
            "violations": [{
                "id": rule_id,
                "impact": impact,
                "description": format!("{} description", rule_id),
                "help": format!("{} help", rule_id),
                "nodes": [{ "html": "<img src=\"logo.png\">" }]
            }]
        }))
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }
}

#[derive(Debug, Default)]
struct BrowserLog {
    navigations: Vec<String>,
    injected: Vec<String>,
    closed: usize,
}

/// A site made of fake pages; hands out drivers that share one log
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pages: Arc<HashMap<String, FakePage>>,
    unreachable: Arc<HashSet<String>>,
    log: Arc<Mutex<BrowserLog>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        Arc::make_mut(&mut self.unreachable).insert(url.to_string());
        self
    }

    pub fn driver(&self) -> FakeDriver {
        FakeDriver {
            pages: self.pages.clone(),
            unreachable: self.unreachable.clone(),
            log: self.log.clone(),
            current: None,
            epoch: 0,
            open: true,
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn injected_scripts(&self) -> Vec<String> {
        self.log.lock().unwrap().injected.clone()
    }

    pub fn close_count(&self) -> usize {
        self.log.lock().unwrap().closed
    }
}

pub struct FakeDriver {
    pages: Arc<HashMap<String, FakePage>>,
    unreachable: Arc<HashSet<String>>,
    log: Arc<Mutex<BrowserLog>>,
    current: Option<(Url, FakePage)>,
    epoch: u64,
    open: bool,
}

impl FakeDriver {
    fn page(&self) -> Result<&(Url, FakePage), DriverError> {
        if !self.open {
            return Err(DriverError::Session("closed".to_string()));
        }
        self.current
            .as_ref()
            .ok_or_else(|| DriverError::Session("no page loaded".to_string()))
    }

    fn element(&self, handle: &ElementHandle) -> Result<&FakeElement, DriverError> {
        let (_, page) = self.page()?;
        if handle.epoch() != self.epoch {
            return Err(DriverError::StaleElement("previous page".to_string()));
        }
        match page.elements.get(handle.index()) {
            Some(element) if !element.stale => Ok(element),
            _ => Err(DriverError::StaleElement(format!("element {}", handle.index()))),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn navigate(&mut self, url: &Url) -> Result<(), DriverError> {
        if !self.open {
            return Err(DriverError::Session("closed".to_string()));
        }
        self.log.lock().unwrap().navigations.push(url.to_string());
        self.epoch += 1;
        self.current = None;

        if self.unreachable.contains(url.as_str()) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }

        let page = self.pages.get(url.as_str()).cloned().ok_or_else(|| DriverError::Navigation {
            url: url.to_string(),
            message: "404".to_string(),
        })?;
        self.current = Some((url.clone(), page));
        Ok(())
    }

    async fn current_url(&self) -> Result<Url, DriverError> {
        Ok(self.page()?.0.clone())
    }

    async fn find_links(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.page()?.1.links.clone())
    }

    async fn enumerate_elements(&self) -> Result<Vec<ElementHandle>, DriverError> {
        let (_, page) = self.page()?;
        if page.fail_enumeration {
            return Err(DriverError::Session("document unavailable".to_string()));
        }
        Ok((0..page.elements.len())
            .map(|index| ElementHandle::new(self.epoch, index))
            .collect())
    }

    async fn computed_style(&self, element: &ElementHandle, property: &str) -> Result<String, DriverError> {
        let element = self.element(element)?;
        match property {
            "color" => Ok(element.color.clone()),
            "background-color" => Ok(element.background.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn element_tag(&self, element: &ElementHandle) -> Result<String, DriverError> {
        Ok(self.element(element)?.tag.clone())
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, DriverError> {
        Ok(self.element(element)?.text.clone())
    }

    async fn execute_script(&self, script: &str) -> Result<Value, DriverError> {
        self.page()?;
        self.log.lock().unwrap().injected.push(script.to_string());
        Ok(Value::Null)
    }

    async fn execute_async_script(&self, _script: &str) -> Result<Value, DriverError> {
        Ok(self.page()?.1.axe_result.clone())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.open = false;
        self.current = None;
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::browser::{BrowserDriver, ScriptLoader};
use crate::error::{DriverError, EngineError};
use crate::report::model::{Impact, NodeSnapshot, Violation};

/// Default location of the axe-core script
pub const AXE_CDN_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.8.2/axe.min.js";

const DEFAULT_DESCRIPTION: &str = "no description available";
const DEFAULT_HELP: &str = "no help available";

/// Runs axe and hands back only the fields the report needs
const RUN_SCRIPT: &str = r#"
var done = arguments[arguments.length - 1];
if (typeof axe === 'undefined') {
    done({ error: 'axe is not loaded on this page' });
    return;
}
axe.run(document).then(function (results) {
    done({
        violations: results.violations.map(function (v) {
            return {
                id: v.id,
                impact: v.impact,
                description: v.description,
                help: v.help,
                helpUrl: v.helpUrl,
                nodes: v.nodes.map(function (n) { return { html: n.html }; })
            };
        })
    });
}).catch(function (err) {
    done({ error: String(err) });
});
"#;

/// External accessibility rule engine
#[async_trait]
pub trait AccessibilityEngine: Send + Sync {
    /// Make the engine available on the currently loaded page
    async fn inject(&self, driver: &dyn BrowserDriver) -> Result<(), EngineError>;

    /// Audit the currently loaded page
    async fn run(&self, driver: &dyn BrowserDriver) -> Result<Vec<Violation>, EngineError>;
}

#[derive(Debug, Deserialize)]
struct AxeRun {
    #[serde(default)]
    violations: Vec<AxeViolation>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeViolation {
    id: String,
    impact: Option<String>,
    description: Option<String>,
    help: Option<String>,
    help_url: Option<String>,
    #[serde(default)]
    nodes: Vec<AxeNode>,
}

#[derive(Debug, Deserialize)]
struct AxeNode {
    html: Option<String>,
}

impl From<AxeViolation> for Violation {
    fn from(v: AxeViolation) -> Self {
        Violation {
            rule_id: v.id,
            description: v.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            impact: Impact::from_engine(v.impact.as_deref()),
            help_text: v.help.unwrap_or_else(|| DEFAULT_HELP.to_string()),
            help_url: v.help_url,
            affected_nodes: v
                .nodes
                .into_iter()
                .map(|n| NodeSnapshot::new(n.html.as_deref().unwrap_or_default()))
                .collect(),
        }
    }
}

/// Decode the value returned by the axe run script
pub fn decode_results(value: Value) -> Result<Vec<Violation>, EngineError> {
    let run: AxeRun = serde_json::from_value(value)?;
    if let Some(message) = run.error {
        return Err(EngineError::Run(DriverError::Script(message)));
    }
    Ok(run.violations.into_iter().map(Violation::from).collect())
}

/// axe-core driven through the browser's script execution
pub struct AxeEngine {
    source: String,
}

impl AxeEngine {
    pub fn new(source: String) -> Self {
        Self { source }
    }

    /// Load the axe-core source from a file path or URL
    pub async fn load(location: &str) -> Result<Self, EngineError> {
        let loader = ScriptLoader::new()?;
        Ok(Self::new(loader.load(location).await?))
    }
}

#[async_trait]
impl AccessibilityEngine for AxeEngine {
    async fn inject(&self, driver: &dyn BrowserDriver) -> Result<(), EngineError> {
        driver
            .execute_script(&self.source)
            .await
            .map_err(EngineError::Inject)?;
        debug!("axe injected");
        Ok(())
    }

    async fn run(&self, driver: &dyn BrowserDriver) -> Result<Vec<Violation>, EngineError> {
        let value = driver
            .execute_async_script(RUN_SCRIPT)
            .await
            .map_err(EngineError::Run)?;
        decode_results(value)
    }
}

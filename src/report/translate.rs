use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Language of the fixed report labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    #[default]
    En,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::De => write!(f, "de"),
            Language::En => write!(f, "en"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "de" | "german" | "deutsch" => Ok(Language::De),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("Unknown language: {}", other)),
        }
    }
}

/// Lookup for engine-provided display strings
#[cfg_attr(test, mockall::automock)]
pub trait Translate: Send + Sync {
    /// Translated text for `key`, or `key` itself when there is none
    fn translate(&self, key: &str) -> String;
}

/// Key to value table loaded from a YAML or JSON file
#[derive(Debug, Clone, Default)]
pub struct Translator {
    entries: HashMap<String, String>,
}

impl Translator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load a flat `key: value` mapping
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading translations from: {}", path.display());
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read translations file: {}", path.display()))?;

        let entries: HashMap<String, String> = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse translations file: {}", path.display()))?;

        debug!("Loaded {} translations", entries.len());
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translate for Translator {
    fn translate(&self, key: &str) -> String {
        self.entries.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

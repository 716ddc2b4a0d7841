//! Per-site extraction rules
//!
//! Vendor sites carry their product markup under site-specific DOM nodes, so
//! the light worker resolves a CSS selector per domain from a read-only rules
//! file loaded at startup. An unknown domain is an expected, non-fatal skip;
//! a malformed rules file is a fatal configuration error.

use crate::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Selector key carrying the product page markup
const SOURCE_PAGE_KEY: &str = "SOURCE_PAGE";

/// How to extract content for a configured domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Take the first node matching this CSS selector
    Selector(String),
    /// Domain is listed but carries no source-page selector
    Unconfigured,
}

/// On-disk rules file shape
#[derive(Debug, Deserialize)]
struct RulesFile {
    website: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    domain: String,
    #[serde(default)]
    selectors: HashMap<String, String>,
}

/// Read-only mapping from domain to extraction rule
#[derive(Debug, Clone, Default)]
pub struct SiteRules {
    rules: HashMap<String, ExtractionRule>,
}

impl SiteRules {
    /// Loads rules from a JSON file
    ///
    /// # Errors
    ///
    /// Returns a fatal `ConfigError` when the file is missing or malformed;
    /// workers must not start without their rule table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses rules from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = serde_json::from_str(content)
            .map_err(|e| ConfigError::SiteRules(e.to_string()))?;

        let rules = file
            .website
            .into_iter()
            .map(|entry| {
                let rule = match entry.selectors.get(SOURCE_PAGE_KEY) {
                    Some(selector) => ExtractionRule::Selector(selector.clone()),
                    None => ExtractionRule::Unconfigured,
                };
                (entry.domain, rule)
            })
            .collect();

        Ok(Self { rules })
    }

    /// Resolves the rule for a domain by exact match
    pub fn rule_for(&self, domain: &str) -> Option<&ExtractionRule> {
        self.rules.get(domain)
    }

    /// Number of configured domains
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

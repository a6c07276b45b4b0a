//! Threat model and alert registry — the alert classifier
//!
//! The threat model is a flat mapping from fine-grained alert types
//! ("few downloads", "old package") to broad risk categories ("undesirable").
//! It is loaded once per run and stays immutable; every stage routes its
//! findings through [`AlertRegistry::record`], which drops alert types the
//! model does not know about.

use crate::{VetError, VetResult};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Default threat table shipped in the binary. Two columns per row,
/// `risk_category, alert_type`, header row first. Override with
/// `--threat-model <path>`.
const BUILTIN_THREATS: &str = "\
risk_category,alert_type
undesirable,old package
undesirable,few versions or releases
undesirable,version release after a long gap
undesirable,invalid or no author email (2FA not enabled)
undesirable,no or insufficient readme
undesirable,invalid or no homepage
undesirable,invalid or no source repo
undesirable,few downloads
undesirable,contains known vulnerabilities (CVEs)
harvests file system data,accesses files and dirs
exfiltrates data over the network,communicates with external network
runs arbitrary code,generates new code at runtime
runs arbitrary code,forks or spawns new processes
hides its behavior,accesses obfuscated (hidden) code
harvests environment data,accesses system/environment variables
tampers with the environment,changes system/environment variables
harvests credentials,accesses user accounts or credentials
harvests user input,reads user input
";

// ─── Threat Model ──────────────────────────────────────────────────

/// Mapping from alert type to risk category. Case-sensitive, last row wins
/// on duplicate alert types.
#[derive(Debug, Clone)]
pub struct ThreatModel {
    categories: HashMap<String, String>,
}

impl ThreatModel {
    /// Load a threat model from a tabular file. Fails if the file is
    /// unreadable or any data row does not carry two columns.
    pub fn load(path: &Path) -> VetResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VetError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| VetError::Config(format!("malformed {}: {}", path.display(), e)))
    }

    /// The threat table compiled into the binary.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_THREATS).expect("builtin threat table is valid")
    }

    fn parse(content: &str) -> Result<Self, String> {
        let mut categories = HashMap::new();
        for (line_no, line) in content.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (category, alert_type) = line
                .split_once(',')
                .ok_or_else(|| format!("row {} has fewer than two columns", line_no + 1))?;
            let category = category.trim();
            let alert_type = alert_type.trim();
            if category.is_empty() || alert_type.is_empty() {
                return Err(format!("row {} has an empty column", line_no + 1));
            }
            // last row wins on duplicate alert types
            categories.insert(alert_type.to_string(), category.to_string());
        }
        Ok(Self { categories })
    }

    /// Look up the risk category for an alert type. `None` means "do not
    /// alert" — callers must not treat it as an error.
    pub fn classify(&self, alert_type: &str) -> Option<&str> {
        self.categories.get(alert_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ─── Alert Registry ────────────────────────────────────────────────

/// An alert a stage wants to raise, before threat-model classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAlert {
    pub alert_type: String,
    pub reason: String,
}

impl RawAlert {
    pub fn new(alert_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            alert_type: alert_type.into(),
            reason: reason.into(),
        }
    }
}

/// Accumulates classified alerts across stages, grouped by risk category.
///
/// Append-only and order-preserving: categories appear in first-recorded
/// order, messages within a category in recording order, duplicates kept.
/// Constructed fresh per run and threaded through the pipeline by exclusive
/// ownership.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlertRegistry {
    categories: Vec<(String, Vec<String>)>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one alert. A no-op when the threat model has no category for
    /// `alert_type` — the signal is dropped, but logged so it is not lost
    /// silently.
    pub fn record(&mut self, alert_type: &str, reason: &str, model: &ThreatModel) {
        let Some(category) = model.classify(alert_type) else {
            tracing::debug!("unclassified alert type dropped: {}", alert_type);
            return;
        };
        let message = format!("{}: {}", alert_type, reason);
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, messages)) => messages.push(message),
            None => self.categories.push((category.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Category names in first-recorded order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn messages(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, m)| m.as_slice())
    }

    /// Total message count across all categories.
    pub fn message_count(&self) -> usize {
        self.categories.iter().map(|(_, m)| m.len()).sum()
    }

    /// Grouped category → messages object, in insertion order.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (category, messages) in &self.categories {
            map.insert(
                category.clone(),
                Value::Array(messages.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(map)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

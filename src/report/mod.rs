//! Final report assembly — per-stage fragments plus the grouped risks
//!
//! Section order is stage-execution order; the `risks` section always comes
//! last and is JSON `null` when no alerts were recorded. The artifact name is
//! derived deterministically from the resolved package identity.

use crate::registry::PackageIdentity;
use crate::threat::AlertRegistry;
use crate::VetResult;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Insertion-ordered section → fragment map built up by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    sections: serde_json::Map<String, Value>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: &str, fragment: Value) {
        self.sections.insert(section.to_string(), fragment);
    }

    pub fn get(&self, section: &str) -> Option<&Value> {
        self.sections.get(section)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Assembles the final report artifact.
pub struct ReportBuilder;

impl ReportBuilder {
    /// Copy every fragment under its section name, then append `risks`:
    /// `null` when the registry is empty, else the grouped category →
    /// messages object. Deterministic for identical inputs.
    pub fn finalize(fragments: Fragments, registry: &AlertRegistry) -> Value {
        let mut sections = fragments.sections;
        let risks = if registry.is_empty() {
            Value::Null
        } else {
            registry.to_json()
        };
        sections.insert("risks".to_string(), risks);
        Value::Object(sections)
    }
}

/// Deterministic artifact name: `{ecosystem}-{name}-{version}.json`.
pub fn report_filename(identity: &PackageIdentity) -> PathBuf {
    PathBuf::from(format!(
        "{}-{}-{}.json",
        identity.ecosystem,
        identity.name,
        identity.version.as_deref().unwrap_or("unknown"),
    ))
}

/// Write the report as pretty-printed JSON, once, at the end of the run.
pub fn write_report(path: &Path, report: &Value) -> VetResult<()> {
    let rendered = serde_json::to_string_pretty(report)?;
    std::fs::write(path, rendered)?;
    Ok(())
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Ecosystem;
    use crate::threat::ThreatModel;
    use serde_json::json;

    #[test]
    fn risks_is_null_when_no_alerts() {
        let mut fragments = Fragments::new();
        fragments.insert("version", json!({"tag": "1.0.0"}));
        let report = ReportBuilder::finalize(fragments, &AlertRegistry::new());
        assert_eq!(report["risks"], Value::Null);
        assert_eq!(report["version"]["tag"], "1.0.0");
    }

    #[test]
    fn risks_carries_grouped_categories() {
        let model = ThreatModel::builtin();
        let mut registry = AlertRegistry::new();
        registry.record("old package", "400 days old", &model);

        let report = ReportBuilder::finalize(Fragments::new(), &registry);
        assert_eq!(report["risks"]["undesirable"][0], "old package: 400 days old");
    }

    #[test]
    fn sections_keep_insertion_order_with_risks_last() {
        let mut fragments = Fragments::new();
        fragments.insert("version", json!(1));
        fragments.insert("releases", json!(2));
        fragments.insert("homepage", json!(3));
        let report = ReportBuilder::finalize(fragments, &AlertRegistry::new());

        let keys: Vec<&String> = report.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["version", "releases", "homepage", "risks"]);
    }

    #[test]
    fn filename_from_identity() {
        let identity = PackageIdentity {
            ecosystem: Ecosystem::PyPi,
            name: "requests".into(),
            version: Some("2.31.0".into()),
        };
        assert_eq!(
            report_filename(&identity),
            PathBuf::from("pypi-requests-2.31.0.json")
        );
    }

    #[test]
    fn write_then_reread_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = json!({"version": {"tag": "1.0.0"}, "risks": null});
        write_report(&path, &report).unwrap();
        let reread: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread, report);
    }
}

//! API-usage classification — maps static-analysis usage tags to alerts
//!
//! The static analyzer emits a coarse source/sink tag for every API call it
//! recovers from package source. This module owns the closed tag enumeration
//! and the fixed tag → (alert type, reason) table that turns those tags into
//! threat-model alerts and the `permissions` report fragment.

use crate::threat::RawAlert;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of usage tags the static analyzer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageTag {
    SourceFile,
    SinkFile,
    SourceNetwork,
    SinkNetwork,
    SinkCodeGeneration,
    SinkProcessOperation,
    SourceObfuscation,
    SourceSettings,
    SinkUnclassified,
    SourceAccount,
    SourceUserInput,
}

impl UsageTag {
    /// Parse the analyzer's wire form, e.g. `"SOURCE_FILE"`.
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_string())).ok()
    }
}

/// Raw static-analysis output: usage tag → call-site payloads, in the order
/// the analyzer reported them. Consumed once by [`classify_usage`].
pub type ApiUsageRecord = Vec<(UsageTag, Vec<Value>)>;

/// Fixed lookup: each tag maps to exactly one (alert type, reason) pair.
/// Tags sharing a reason merge their evidence under that reason key in the
/// report fragment.
fn alert_for(tag: UsageTag) -> (&'static str, &'static str) {
    match tag {
        UsageTag::SourceFile => ("accesses files and dirs", "reads files and dirs"),
        UsageTag::SinkFile => ("accesses files and dirs", "writes to files and dirs"),
        UsageTag::SourceNetwork => (
            "communicates with external network",
            "fetches data over the network",
        ),
        UsageTag::SinkNetwork => (
            "communicates with external network",
            "sends data over the network",
        ),
        UsageTag::SinkCodeGeneration => (
            "generates new code at runtime",
            "generates new code at runtime",
        ),
        UsageTag::SinkProcessOperation => (
            "forks or spawns new processes",
            "spawns new processes in background",
        ),
        UsageTag::SourceObfuscation => ("accesses obfuscated (hidden) code", "reads hidden code"),
        UsageTag::SourceSettings => (
            "accesses system/environment variables",
            "reads system settings or environment variables",
        ),
        UsageTag::SinkUnclassified => (
            "changes system/environment variables",
            "modifies system settings or environment variables",
        ),
        UsageTag::SourceAccount => (
            "accesses user accounts or credentials",
            "reads user account or credential data",
        ),
        UsageTag::SourceUserInput => ("reads user input", "reads user input"),
    }
}

/// Classify a usage record into alerts plus the `permissions` fragment.
///
/// The fragment is keyed by *reason*, not by raw tag: payloads for tags that
/// map to the same reason are concatenated, never overwritten. One alert is
/// emitted per tag present, even when reasons collide.
pub fn classify_usage(record: &ApiUsageRecord) -> (Vec<RawAlert>, Value) {
    let mut alerts = Vec::new();
    let mut fragment = serde_json::Map::new();

    for (tag, usage) in record {
        let (alert_type, reason) = alert_for(*tag);
        alerts.push(RawAlert::new(alert_type, reason));

        match fragment.get_mut(reason) {
            Some(Value::Array(existing)) => existing.extend(usage.iter().cloned()),
            _ => {
                fragment.insert(reason.to_string(), Value::Array(usage.clone()));
            }
        }
    }

    (alerts, Value::Object(fragment))
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_wire_tags() {
        assert_eq!(UsageTag::parse("SOURCE_FILE"), Some(UsageTag::SourceFile));
        assert_eq!(UsageTag::parse("SINK_NETWORK"), Some(UsageTag::SinkNetwork));
        assert_eq!(
            UsageTag::parse("SINK_PROCESS_OPERATION"),
            Some(UsageTag::SinkProcessOperation)
        );
        assert_eq!(UsageTag::parse("NOT_A_TAG"), None);
    }

    #[test]
    fn every_tag_maps_to_one_pair() {
        let tags = [
            UsageTag::SourceFile,
            UsageTag::SinkFile,
            UsageTag::SourceNetwork,
            UsageTag::SinkNetwork,
            UsageTag::SinkCodeGeneration,
            UsageTag::SinkProcessOperation,
            UsageTag::SourceObfuscation,
            UsageTag::SourceSettings,
            UsageTag::SinkUnclassified,
            UsageTag::SourceAccount,
            UsageTag::SourceUserInput,
        ];
        for tag in tags {
            let (alert_type, reason) = alert_for(tag);
            assert!(!alert_type.is_empty());
            assert!(!reason.is_empty());
        }
    }

    #[test]
    fn network_tags_get_distinct_reasons() {
        let record: ApiUsageRecord = vec![
            (UsageTag::SinkNetwork, vec![json!("requests.post")]),
            (UsageTag::SourceNetwork, vec![json!("urllib.urlopen")]),
        ];
        let (alerts, fragment) = classify_usage(&record);

        assert_eq!(alerts.len(), 2);
        assert!(alerts
            .iter()
            .all(|a| a.alert_type == "communicates with external network"));
        assert_ne!(alerts[0].reason, alerts[1].reason);

        let obj = fragment.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(
            obj["sends data over the network"],
            json!(["requests.post"])
        );
        assert_eq!(
            obj["fetches data over the network"],
            json!(["urllib.urlopen"])
        );
    }

    #[test]
    fn file_read_and_write_keep_separate_reason_keys() {
        let record: ApiUsageRecord = vec![
            (UsageTag::SourceFile, vec![json!("open"), json!("os.listdir")]),
            (UsageTag::SinkFile, vec![json!("shutil.copy")]),
        ];
        let (alerts, fragment) = classify_usage(&record);
        assert_eq!(alerts.len(), 2);
        let obj = fragment.as_object().unwrap();
        assert_eq!(obj["reads files and dirs"], json!(["open", "os.listdir"]));
        assert_eq!(obj["writes to files and dirs"], json!(["shutil.copy"]));
    }

    #[test]
    fn repeated_tag_concatenates_payloads_under_one_reason() {
        // Analyzers chunk large packages and may report a tag more than once;
        // evidence accumulates under the reason key instead of overwriting.
        let record: ApiUsageRecord = vec![
            (UsageTag::SourceUserInput, vec![json!("input")]),
            (UsageTag::SourceUserInput, vec![json!("getpass.getpass")]),
        ];
        let (alerts, fragment) = classify_usage(&record);
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            fragment["reads user input"],
            json!(["input", "getpass.getpass"])
        );
    }

    #[test]
    fn empty_record_yields_empty_output() {
        let (alerts, fragment) = classify_usage(&Vec::new());
        assert!(alerts.is_empty());
        assert_eq!(fragment, json!({}));
    }
}

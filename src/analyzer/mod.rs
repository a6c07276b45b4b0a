//! Static-analyzer bridge — recovers API usage tags from package source
//!
//! Shells out to an external AST-walking analyzer (`astgen` by default) and
//! parses its JSON output into an [`ApiUsageRecord`]. The analyzer contract
//! is a single JSON object mapping usage tags to call-site arrays:
//!
//! ```json
//! {"SOURCE_FILE": ["open", "os.listdir"], "SINK_NETWORK": ["requests.post"]}
//! ```
//!
//! A missing binary or unparsable output is an ordinary collaborator error,
//! handled by the API-usage stage like any other stage failure.

use crate::classify::{ApiUsageRecord, UsageTag};
use crate::registry::Ecosystem;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Recovers raw API usage tags from a downloaded package archive.
pub trait StaticAnalyzer: Send + Sync {
    fn analyze(&self, archive: &Path, ecosystem: Ecosystem) -> Result<ApiUsageRecord, String>;
}

/// Bridge to the external `astgen` analyzer CLI.
pub struct AstgenAnalyzer {
    program: String,
}

impl AstgenAnalyzer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn language_for(ecosystem: Ecosystem) -> &'static str {
        match ecosystem {
            Ecosystem::PyPi => "python",
            Ecosystem::Npm => "javascript",
        }
    }

    /// Parse the analyzer's tag → call-sites object, dropping keys outside
    /// the closed tag set (newer analyzers may emit tags we do not vet).
    pub(crate) fn parse_output(output: &str) -> Result<ApiUsageRecord, String> {
        let doc: Value =
            serde_json::from_str(output).map_err(|e| format!("parse error: {}", e))?;
        let map = doc.as_object().ok_or("parse error: expected an object")?;

        let mut record = ApiUsageRecord::new();
        for (key, usage) in map {
            let Some(tag) = UsageTag::parse(key) else {
                tracing::debug!("ignoring unknown usage tag: {}", key);
                continue;
            };
            let payload = match usage {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            record.push((tag, payload));
        }
        Ok(record)
    }
}

impl Default for AstgenAnalyzer {
    fn default() -> Self {
        Self::new("astgen")
    }
}

impl StaticAnalyzer for AstgenAnalyzer {
    fn analyze(&self, archive: &Path, ecosystem: Ecosystem) -> Result<ApiUsageRecord, String> {
        let output = Command::new(&self.program)
            .arg("--language")
            .arg(Self::language_for(ecosystem))
            .arg("--json")
            .arg(archive)
            .output()
            .map_err(|e| format!("failed to run {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} failed: {}", self.program, stderr.trim()));
        }

        Self::parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_output() {
        let record = AstgenAnalyzer::parse_output(
            r#"{"SOURCE_FILE": ["open"], "SINK_NETWORK": ["requests.post", "socket.send"]}"#,
        )
        .unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record[0].0, UsageTag::SourceFile);
        assert_eq!(record[1].1, vec![json!("requests.post"), json!("socket.send")]);
    }

    #[test]
    fn unknown_tags_are_dropped() {
        let record =
            AstgenAnalyzer::parse_output(r#"{"FUTURE_TAG": ["x"], "SOURCE_SETTINGS": []}"#)
                .unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record[0].0, UsageTag::SourceSettings);
    }

    #[test]
    fn malformed_output_is_an_error() {
        assert!(AstgenAnalyzer::parse_output("not json").is_err());
        assert!(AstgenAnalyzer::parse_output(r#"["array"]"#).is_err());
    }

    #[test]
    fn missing_binary_is_an_error_not_a_panic() {
        let analyzer = AstgenAnalyzer::new("definitely-not-installed-astgen");
        let err = analyzer
            .analyze(Path::new("/tmp/pkg.tar.gz"), Ecosystem::PyPi)
            .unwrap_err();
        assert!(err.contains("failed to run"));
    }
}

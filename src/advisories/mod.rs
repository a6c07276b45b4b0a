//! Known-vulnerability lookup — OSV.dev advisory database

use crate::registry::Ecosystem;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One advisory affecting the exact package+version under vetting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Vulnerability database with per-version resolution.
pub trait AdvisoryDb: Send + Sync {
    fn lookup(&self, ecosystem: Ecosystem, name: &str, version: &str)
        -> Result<Vec<Advisory>, String>;
}

/// OSV.dev query API client.
pub struct OsvClient {
    client: reqwest::blocking::Client,
}

impl OsvClient {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: crate::registry::build_client()?,
        })
    }
}

impl AdvisoryDb for OsvClient {
    fn lookup(
        &self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Result<Vec<Advisory>, String> {
        let query = json!({
            "package": {"ecosystem": ecosystem.osv_name(), "name": name},
            "version": version,
        });

        let response = self
            .client
            .post("https://api.osv.dev/v1/query")
            .json(&query)
            .send()
            .map_err(|e| format!("OSV query failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("OSV returned {}", response.status()));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| format!("Failed to parse OSV response: {}", e))?;

        let vulns = match body.get("vulns").and_then(|v| v.as_array()) {
            Some(vulns) => vulns,
            // an empty object means "no known vulnerabilities"
            None => return Ok(Vec::new()),
        };

        Ok(vulns
            .iter()
            .filter_map(|v| {
                Some(Advisory {
                    id: v.get("id")?.as_str()?.to_string(),
                    summary: v
                        .get("summary")
                        .and_then(|s| s.as_str())
                        .map(String::from),
                })
            })
            .collect())
    }
}

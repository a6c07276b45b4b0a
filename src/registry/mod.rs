//! Package-registry clients — fetch metadata, versions, and archives
//!
//! One narrow [`Registry`] trait per the vetting pipeline's needs, with a
//! concrete client per supported ecosystem selected by explicit dispatch.
//! Collaborator errors are plain strings; the pipeline converts them into
//! per-stage failures.

pub mod npm;
pub mod pypi;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ─── Ecosystem ─────────────────────────────────────────────────────

/// Supported package ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    PyPi,
    Npm,
}

impl Ecosystem {
    /// Parse the CLI ecosystem argument.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pypi" | "pip" => Ok(Self::PyPi),
            "npm" | "npmjs" => Ok(Self::Npm),
            other => Err(format!(
                "Ecosystem '{}' is not supported — supported: pypi, npm",
                other
            )),
        }
    }

    /// Ecosystem name as OSV spells it.
    pub fn osv_name(&self) -> &'static str {
        match self {
            Self::PyPi => "PyPI",
            Self::Npm => "npm",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PyPi => write!(f, "pypi"),
            Self::Npm => write!(f, "npm"),
        }
    }
}

// ─── Package Identity ──────────────────────────────────────────────

/// The package under vetting. Created once at startup; the name is
/// canonicalized and the version resolved after the first metadata fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: Option<String>,
}

impl PackageIdentity {
    /// Parse the CLI package argument, `name` or `name==version`.
    pub fn parse(ecosystem: Ecosystem, spec: &str) -> Self {
        match spec.split_once("==") {
            Some((name, version)) if !version.is_empty() => Self {
                ecosystem,
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            _ => Self {
                ecosystem,
                name: spec.to_string(),
                version: None,
            },
        }
    }

    pub fn display_name(&self) -> String {
        match &self.version {
            Some(v) => format!("{}:{}=={}", self.ecosystem, self.name, v),
            None => format!("{}:{}", self.ecosystem, self.name),
        }
    }
}

// ─── Metadata Models ───────────────────────────────────────────────

/// Resolved information about one published version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Version tag, e.g. "4.17.21"
    pub tag: String,
    /// Upload timestamp, when the registry exposes one
    pub uploaded: Option<DateTime<Utc>>,
    /// Archive download URL for this version
    pub url: Option<String>,
}

/// One release in a package's publication history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub version: String,
    pub uploaded: Option<DateTime<Utc>>,
    /// Days since the previous release, None for the first one
    pub days_since_prev: Option<i64>,
}

/// Publication history in chronological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseHistory {
    pub entries: Vec<ReleaseEntry>,
}

impl ReleaseHistory {
    /// Build a history from (version, upload time) pairs, sorting by upload
    /// time and filling in the inter-release gaps.
    pub fn from_uploads(mut uploads: Vec<(String, Option<DateTime<Utc>>)>) -> Self {
        uploads.sort_by_key(|(_, t)| *t);
        let mut entries: Vec<ReleaseEntry> = Vec::with_capacity(uploads.len());
        for (version, uploaded) in uploads {
            let days_since_prev = match (uploaded, entries.last().and_then(|e| e.uploaded)) {
                (Some(now), Some(prev)) => Some((now - prev).num_days()),
                _ => None,
            };
            entries.push(ReleaseEntry {
                version,
                uploaded,
                days_since_prev,
            });
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gap in days between `version` and the release before it.
    pub fn gap_for(&self, version: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.version == version)
            .and_then(|e| e.days_since_prev)
    }
}

/// Author identity as declared in package metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: Option<String>,
    pub email: Option<String>,
}

// ─── Registry Trait ────────────────────────────────────────────────

/// Narrow interface over a package registry. `fetch_metadata` performs the
/// single upstream fetch; the accessors are pure views over that document so
/// stages never trigger hidden network calls.
pub trait Registry: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Fetch the package's registry document. Failure here is fatal: no
    /// stage can run without it.
    fn fetch_metadata(&self, name: &str) -> Result<Value, String>;

    /// Registry's canonical spelling of the package name.
    fn canonical_name(&self, metadata: &Value) -> Option<String>;

    /// Resolve the requested (or latest) version from the metadata.
    fn version_info(&self, metadata: &Value, version: Option<&str>) -> Result<VersionInfo, String>;

    fn release_history(&self, metadata: &Value) -> Result<ReleaseHistory, String>;

    /// Weekly download count. The one accessor that needs its own fetch.
    fn weekly_downloads(&self, name: &str) -> Result<u64, String>;

    fn homepage(&self, metadata: &Value) -> Option<String>;

    fn repository(&self, metadata: &Value) -> Option<String>;

    fn download_url(&self, metadata: &Value, version_info: &VersionInfo) -> Option<String>;

    /// Long description / readme text.
    fn description(&self, metadata: &Value) -> Option<String>;

    fn author(&self, metadata: &Value) -> Option<AuthorInfo>;

    /// Download the version archive into `dest_dir`, returning its path.
    fn download_archive(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, String>;
}

/// Select the registry client for an ecosystem.
pub fn for_ecosystem(ecosystem: Ecosystem) -> Result<Box<dyn Registry>, String> {
    match ecosystem {
        Ecosystem::PyPi => Ok(Box::new(pypi::PyPiRegistry::new()?)),
        Ecosystem::Npm => Ok(Box::new(npm::NpmRegistry::new()?)),
    }
}

// ─── Shared HTTP plumbing ──────────────────────────────────────────

pub(crate) fn build_client() -> Result<reqwest::blocking::Client, String> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("pkgvet/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

/// Fetch a JSON document, treating any non-success status as an error.
pub(crate) fn get_json(client: &reqwest::blocking::Client, url: &str) -> Result<Value, String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| format!("Failed to fetch {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!("HTTP {} for {}", response.status(), url));
    }
    response
        .json()
        .map_err(|e| format!("Failed to parse response from {}: {}", url, e))
}

/// Download `url` into `dest_dir`, keeping the remote file name.
pub(crate) fn download_to(
    client: &reqwest::blocking::Client,
    url: &str,
    dest_dir: &Path,
) -> Result<PathBuf, String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!("HTTP {} for {}", response.status(), url));
    }
    let bytes = response
        .bytes()
        .map_err(|e| format!("Failed to read response body: {}", e))?;

    let file_name = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("package.archive");
    let path = dest_dir.join(file_name);
    std::fs::write(&path, &bytes).map_err(|e| format!("Failed to write archive: {}", e))?;
    Ok(path)
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        // PyPI's legacy upload_time has no offset
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(|t| t.and_utc())
                .ok()
        })
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_ecosystem() {
        assert_eq!(Ecosystem::parse("pypi").unwrap(), Ecosystem::PyPi);
        assert_eq!(Ecosystem::parse("NPM").unwrap(), Ecosystem::Npm);
        assert!(Ecosystem::parse("rubygems").is_err());
    }

    #[test]
    fn parse_identity_with_version() {
        let id = PackageIdentity::parse(Ecosystem::PyPi, "requests==2.31.0");
        assert_eq!(id.name, "requests");
        assert_eq!(id.version.as_deref(), Some("2.31.0"));
    }

    #[test]
    fn parse_identity_without_version() {
        let id = PackageIdentity::parse(Ecosystem::Npm, "lodash");
        assert_eq!(id.name, "lodash");
        assert_eq!(id.version, None);

        // trailing "==" is not a version
        let id = PackageIdentity::parse(Ecosystem::Npm, "lodash==");
        assert_eq!(id.name, "lodash==");
        assert_eq!(id.version, None);
    }

    #[test]
    fn release_history_sorts_and_computes_gaps() {
        let t = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).single();
        let history = ReleaseHistory::from_uploads(vec![
            ("2.0.0".into(), t(21)),
            ("1.0.0".into(), t(1)),
            ("1.1.0".into(), t(6)),
        ]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.entries[0].version, "1.0.0");
        assert_eq!(history.entries[0].days_since_prev, None);
        assert_eq!(history.gap_for("1.1.0"), Some(5));
        assert_eq!(history.gap_for("2.0.0"), Some(15));
        assert_eq!(history.gap_for("9.9.9"), None);
    }

    #[test]
    fn parse_both_timestamp_shapes() {
        assert!(parse_timestamp("2023-05-22T15:12:44.175208Z").is_some());
        assert!(parse_timestamp("2023-05-22T15:12:44").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn osv_names() {
        assert_eq!(Ecosystem::PyPi.osv_name(), "PyPI");
        assert_eq!(Ecosystem::Npm.osv_name(), "npm");
    }
}

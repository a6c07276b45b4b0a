//! PyPI registry client — pypi.org JSON API + pypistats.org downloads

use super::{
    build_client, download_to, get_json, parse_timestamp, AuthorInfo, Ecosystem, Registry,
    ReleaseHistory, VersionInfo,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct PyPiRegistry {
    client: reqwest::blocking::Client,
}

impl PyPiRegistry {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// Earliest upload among a version's distribution files.
    fn earliest_upload(files: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
        files
            .as_array()?
            .iter()
            .filter_map(|f| f.get("upload_time_iso_8601").or_else(|| f.get("upload_time")))
            .filter_map(|t| t.as_str())
            .filter_map(parse_timestamp)
            .min()
    }

    /// Prefer the sdist URL, fall back to the first file.
    fn archive_url(files: &Value) -> Option<String> {
        let files = files.as_array()?;
        files
            .iter()
            .find(|f| {
                f.get("packagetype").and_then(|p| p.as_str()) == Some("sdist")
            })
            .or_else(|| files.first())
            .and_then(|f| f.get("url"))
            .and_then(|u| u.as_str())
            .map(String::from)
    }

    fn project_url(metadata: &Value, keys: &[&str]) -> Option<String> {
        let urls = metadata.get("info")?.get("project_urls")?.as_object()?;
        for key in keys {
            if let Some(url) = urls.get(*key).and_then(|u| u.as_str()) {
                if !url.is_empty() {
                    return Some(url.to_string());
                }
            }
        }
        None
    }
}

impl Registry for PyPiRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPi
    }

    fn fetch_metadata(&self, name: &str) -> Result<Value, String> {
        let url = format!("https://pypi.org/pypi/{}/json", name);
        get_json(&self.client, &url).map_err(|_| format!("package '{}' not found on PyPI", name))
    }

    fn canonical_name(&self, metadata: &Value) -> Option<String> {
        metadata
            .get("info")?
            .get("name")?
            .as_str()
            .map(String::from)
    }

    fn version_info(&self, metadata: &Value, version: Option<&str>) -> Result<VersionInfo, String> {
        let tag = match version {
            Some(v) => v.to_string(),
            None => metadata
                .get("info")
                .and_then(|i| i.get("version"))
                .and_then(|v| v.as_str())
                .ok_or("no version in metadata")?
                .to_string(),
        };

        // Version-specific file list lives under "releases"; the top-level
        // "urls" array only describes the latest version, so it is a valid
        // fallback only when the document carries no releases map at all.
        let files = match metadata.get("releases") {
            Some(releases) => releases
                .get(&tag)
                .ok_or_else(|| format!("version {} not found", tag))?,
            None => metadata
                .get("urls")
                .ok_or_else(|| format!("version {} not found", tag))?,
        };

        Ok(VersionInfo {
            uploaded: Self::earliest_upload(files),
            url: Self::archive_url(files),
            tag,
        })
    }

    fn release_history(&self, metadata: &Value) -> Result<ReleaseHistory, String> {
        let releases = metadata
            .get("releases")
            .and_then(|r| r.as_object())
            .ok_or("no release data")?;
        let uploads = releases
            .iter()
            .map(|(version, files)| (version.clone(), Self::earliest_upload(files)))
            .collect();
        Ok(ReleaseHistory::from_uploads(uploads))
    }

    fn weekly_downloads(&self, name: &str) -> Result<u64, String> {
        let url = format!("https://pypistats.org/api/packages/{}/recent", name.to_lowercase());
        let stats = get_json(&self.client, &url)?;
        stats
            .get("data")
            .and_then(|d| d.get("last_week"))
            .and_then(|n| n.as_u64())
            .ok_or_else(|| "no download stats".to_string())
    }

    fn homepage(&self, metadata: &Value) -> Option<String> {
        metadata
            .get("info")
            .and_then(|i| i.get("home_page"))
            .and_then(|h| h.as_str())
            .filter(|h| !h.is_empty())
            .map(String::from)
            .or_else(|| Self::project_url(metadata, &["Homepage", "homepage", "Home"]))
    }

    fn repository(&self, metadata: &Value) -> Option<String> {
        Self::project_url(
            metadata,
            &["Source", "Source Code", "Repository", "Code", "GitHub"],
        )
    }

    fn download_url(&self, metadata: &Value, version_info: &VersionInfo) -> Option<String> {
        version_info.url.clone().or_else(|| {
            metadata
                .get("info")?
                .get("download_url")?
                .as_str()
                .filter(|u| !u.is_empty() && *u != "UNKNOWN")
                .map(String::from)
        })
    }

    fn description(&self, metadata: &Value) -> Option<String> {
        let info = metadata.get("info")?;
        info.get("description")
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
            .or_else(|| info.get("summary").and_then(|s| s.as_str()))
            .map(String::from)
    }

    fn author(&self, metadata: &Value) -> Option<AuthorInfo> {
        let info = metadata.get("info")?;
        let field = |key: &str| {
            info.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let author = AuthorInfo {
            name: field("author").or_else(|| field("maintainer")),
            email: field("author_email").or_else(|| field("maintainer_email")),
        };
        if author.name.is_none() && author.email.is_none() {
            None
        } else {
            Some(author)
        }
    }

    fn download_archive(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, String> {
        download_to(&self.client, url, dest_dir)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

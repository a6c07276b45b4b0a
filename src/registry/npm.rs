//! npm registry client — registry.npmjs.org + api.npmjs.org downloads

use super::{
    build_client, download_to, get_json, parse_timestamp, AuthorInfo, Ecosystem, Registry,
    ReleaseHistory, VersionInfo,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct NpmRegistry {
    client: reqwest::blocking::Client,
}

impl NpmRegistry {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            client: build_client()?,
        })
    }

    fn version_doc<'a>(metadata: &'a Value, tag: &str) -> Option<&'a Value> {
        metadata.get("versions")?.get(tag)
    }

    fn upload_time(metadata: &Value, tag: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        metadata
            .get("time")?
            .get(tag)?
            .as_str()
            .and_then(parse_timestamp)
    }

    /// npm author fields come either structured (`{name, email}`) or as a
    /// single `"Name <email>"` string.
    fn parse_author(value: &Value) -> Option<AuthorInfo> {
        if let Some(obj) = value.as_object() {
            let field = |key: &str| {
                obj.get(key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
            };
            return Some(AuthorInfo {
                name: field("name"),
                email: field("email"),
            });
        }
        let s = value.as_str()?;
        if s.is_empty() {
            return None;
        }
        match (s.find('<'), s.find('>')) {
            (Some(open), Some(close)) if close > open => Some(AuthorInfo {
                name: Some(s[..open].trim().to_string()).filter(|n| !n.is_empty()),
                email: Some(s[open + 1..close].trim().to_string()).filter(|e| !e.is_empty()),
            }),
            _ => Some(AuthorInfo {
                name: Some(s.trim().to_string()),
                email: None,
            }),
        }
    }
}

impl Registry for NpmRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn fetch_metadata(&self, name: &str) -> Result<Value, String> {
        let url = format!("https://registry.npmjs.org/{}", name);
        get_json(&self.client, &url).map_err(|_| format!("package '{}' not found on npm", name))
    }

    fn canonical_name(&self, metadata: &Value) -> Option<String> {
        metadata.get("name")?.as_str().map(String::from)
    }

    fn version_info(&self, metadata: &Value, version: Option<&str>) -> Result<VersionInfo, String> {
        let tag = match version {
            Some(v) => v.to_string(),
            None => metadata
                .get("dist-tags")
                .and_then(|t| t.get("latest"))
                .and_then(|v| v.as_str())
                .ok_or("no latest dist-tag")?
                .to_string(),
        };

        let doc = Self::version_doc(metadata, &tag)
            .ok_or_else(|| format!("version {} not found", tag))?;
        let url = doc
            .get("dist")
            .and_then(|d| d.get("tarball"))
            .and_then(|t| t.as_str())
            .map(String::from);

        Ok(VersionInfo {
            uploaded: Self::upload_time(metadata, &tag),
            url,
            tag,
        })
    }

    fn release_history(&self, metadata: &Value) -> Result<ReleaseHistory, String> {
        let time = metadata
            .get("time")
            .and_then(|t| t.as_object())
            .ok_or("no release data")?;
        let uploads = time
            .iter()
            .filter(|(version, _)| *version != "created" && *version != "modified")
            .map(|(version, t)| (version.clone(), t.as_str().and_then(parse_timestamp)))
            .collect();
        Ok(ReleaseHistory::from_uploads(uploads))
    }

    fn weekly_downloads(&self, name: &str) -> Result<u64, String> {
        let url = format!("https://api.npmjs.org/downloads/point/last-week/{}", name);
        let stats = get_json(&self.client, &url)?;
        stats
            .get("downloads")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| "no download stats".to_string())
    }

    fn homepage(&self, metadata: &Value) -> Option<String> {
        metadata
            .get("homepage")
            .and_then(|h| h.as_str())
            .filter(|h| !h.is_empty())
            .map(String::from)
    }

    fn repository(&self, metadata: &Value) -> Option<String> {
        let repo = metadata.get("repository")?;
        repo.get("url")
            .and_then(|u| u.as_str())
            .or_else(|| repo.as_str())
            .filter(|u| !u.is_empty())
            .map(String::from)
    }

    fn download_url(&self, _metadata: &Value, version_info: &VersionInfo) -> Option<String> {
        version_info.url.clone()
    }

    fn description(&self, metadata: &Value) -> Option<String> {
        metadata
            .get("readme")
            .and_then(|r| r.as_str())
            .filter(|r| !r.is_empty())
            .or_else(|| metadata.get("description").and_then(|d| d.as_str()))
            .map(String::from)
    }

    fn author(&self, metadata: &Value) -> Option<AuthorInfo> {
        metadata
            .get("author")
            .and_then(Self::parse_author)
            .or_else(|| {
                metadata
                    .get("maintainers")?
                    .as_array()?
                    .first()
                    .and_then(Self::parse_author)
            })
    }

    fn download_archive(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, String> {
        download_to(&self.client, url, dest_dir)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "name": "left-pad",
            "dist-tags": {"latest": "1.3.0"},
            "homepage": "https://github.com/stevemao/left-pad",
            "repository": {"type": "git", "url": "git+https://github.com/stevemao/left-pad.git"},
            "author": "Steve Mao <steve@example.com>",
            "readme": "# left-pad\nString left pad",
            "time": {
                "created": "2014-03-22T21:59:05.683Z",
                "modified": "2018-04-10T20:48:01.000Z",
                "1.0.0": "2014-03-22T21:59:05.683Z",
                "1.3.0": "2018-02-12T18:41:27.343Z"
            },
            "versions": {
                "1.3.0": {
                    "dist": {"tarball": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz"}
                }
            }
        })
    }

    #[test]
    fn resolves_latest_from_dist_tags() {
        let reg = NpmRegistry::new().unwrap();
        let info = reg.version_info(&fixture(), None).unwrap();
        assert_eq!(info.tag, "1.3.0");
        assert!(info.url.as_deref().unwrap().ends_with("left-pad-1.3.0.tgz"));
        assert!(info.uploaded.is_some());
    }

    #[test]
    fn unknown_version_is_an_error() {
        let reg = NpmRegistry::new().unwrap();
        assert!(reg.version_info(&fixture(), Some("9.9.9")).is_err());
    }

    #[test]
    fn history_skips_created_and_modified() {
        let reg = NpmRegistry::new().unwrap();
        let history = reg.release_history(&fixture()).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.entries.iter().all(|e| e.version != "created"));
        assert!(history.gap_for("1.3.0").unwrap() > 1000);
    }

    #[test]
    fn parses_string_author() {
        let author = NpmRegistry::parse_author(&json!("Steve Mao <steve@example.com>")).unwrap();
        assert_eq!(author.name.as_deref(), Some("Steve Mao"));
        assert_eq!(author.email.as_deref(), Some("steve@example.com"));

        let bare = NpmRegistry::parse_author(&json!("Just A Name")).unwrap();
        assert_eq!(bare.name.as_deref(), Some("Just A Name"));
        assert_eq!(bare.email, None);
    }

    #[test]
    fn parses_structured_author() {
        let author =
            NpmRegistry::parse_author(&json!({"name": "Steve", "email": "s@example.com"})).unwrap();
        assert_eq!(author.email.as_deref(), Some("s@example.com"));
    }

    #[test]
    fn repository_url_from_object() {
        let reg = NpmRegistry::new().unwrap();
        assert_eq!(
            reg.repository(&fixture()).as_deref(),
            Some("git+https://github.com/stevemao/left-pad.git")
        );
    }
}

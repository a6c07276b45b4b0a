//! Source-repository validity — a vetted package should point at a real,
//! allow-listed forge, not a template left over from a project skeleton
//!
//! When the metadata carries no repository link, the homepage and download
//! URL are tried as fallbacks, accepted only when they already point at a
//! known forge.

use crate::pipeline::{Context, Stage, StageError, StageOutput};

const ALERT_TYPE: &str = "invalid or no source repo";

/// Forges we accept as a source-code home.
const HOSTED_FORGES: &[&str] = &[
    "https://github.com/",
    "https://gitlab.com/",
    "https://bitbucket.org/",
    "git+https://github.com/",
    "git://github.com/",
];

/// Known placeholder/template repositories that packaging tutorials leave
/// behind.
const PLACEHOLDER_REPOS: &[&str] = &[
    "https://github.com/pypa/sampleproject",
    "https://github.com/kubernetes/kubernetes",
];

fn on_known_forge(url: &str) -> bool {
    HOSTED_FORGES.iter().any(|f| url.starts_with(f))
}

fn is_placeholder(url: &str) -> bool {
    let trimmed = url.trim_end_matches('/');
    PLACEHOLDER_REPOS.iter().any(|p| trimmed == *p)
}

pub struct RepoStage;

impl Stage for RepoStage {
    fn name(&self) -> &'static str {
        "repo"
    }

    fn describe(&self) -> &'static str {
        "Checking repo"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let repo = ctx
            .registry
            .repository(&ctx.metadata)
            .or_else(|| {
                ctx.registry
                    .homepage(&ctx.metadata)
                    .filter(|url| on_known_forge(url))
            })
            .or_else(|| {
                ctx.registry
                    .download_url(&ctx.metadata, &ctx.version_info)
                    .filter(|url| on_known_forge(url))
            });

        let Some(repo) = repo else {
            return Ok(StageOutput::new("none").alert(ALERT_TYPE, "no source repo found"));
        };

        let mut output = StageOutput::new(repo.clone());
        if !on_known_forge(&repo) || is_placeholder(&repo) {
            output = output.alert(ALERT_TYPE, format!("invalid source repo {}", repo));
        }

        Ok(output.fragment(serde_json::Value::String(repo)))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_allowlist() {
        assert!(on_known_forge("https://github.com/psf/requests"));
        assert!(on_known_forge("git+https://github.com/stevemao/left-pad.git"));
        assert!(on_known_forge("https://gitlab.com/group/project"));
        assert!(!on_known_forge("https://my-own-git.example.org/repo"));
        assert!(!on_known_forge("http://github.com/psf/requests"));
    }

    #[test]
    fn placeholder_denylist() {
        assert!(is_placeholder("https://github.com/pypa/sampleproject"));
        assert!(is_placeholder("https://github.com/pypa/sampleproject/"));
        assert!(!is_placeholder("https://github.com/pypa/sampleproject-fork"));
    }
}

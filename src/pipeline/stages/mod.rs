//! Vetting stages — one module per heuristic check
//!
//! Stage order is fixed: metadata-only checks first, then the checks that
//! need their own network round-trips, and finally the static API-usage
//! classification, which is gated on a retrievable package archive.

pub mod advisories;
pub mod api_usage;
pub mod author;
pub mod downloads;
pub mod homepage;
pub mod readme;
pub mod releases;
pub mod repo;
pub mod version;

use super::Stage;

/// Build the full stage list in execution order.
pub fn build_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(version::VersionStage),
        Box::new(releases::ReleasesStage),
        Box::new(author::AuthorStage),
        Box::new(readme::ReadmeStage),
        Box::new(homepage::HomepageStage),
        Box::new(repo::RepoStage),
        Box::new(downloads::DownloadsStage),
        Box::new(advisories::AdvisoryStage),
        Box::new(api_usage::ApiUsageStage),
    ]
}

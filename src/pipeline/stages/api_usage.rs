//! Static API-usage classification — the richest signal source
//!
//! Downloads the version archive, hands it to the static analyzer, and
//! classifies the recovered usage tags into alerts plus the `permissions`
//! fragment. Skipped entirely, without a progress line, when the registry
//! exposes no archive to retrieve.

use crate::classify::classify_usage;
use crate::pipeline::{Context, Stage, StageError, StageOutput};

pub struct ApiUsageStage;

impl Stage for ApiUsageStage {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn describe(&self) -> &'static str {
        "Analyzing APIs"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.registry
            .download_url(&ctx.metadata, &ctx.version_info)
            .is_some()
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let url = ctx
            .registry
            .download_url(&ctx.metadata, &ctx.version_info)
            .ok_or(StageError::NoData)?;

        // Archive lives only as long as this stage
        let workdir = tempfile::tempdir()
            .map_err(|e| StageError::External(format!("tempdir failed: {}", e)))?;
        let archive = ctx
            .registry
            .download_archive(&url, workdir.path())
            .map_err(StageError::External)?;

        let record = ctx
            .analyzer
            .analyze(&archive, ctx.identity.ecosystem)
            .map_err(StageError::External)?;
        if record.is_empty() {
            return Err(StageError::External("no APIs found".into()));
        }

        let (alerts, fragment) = classify_usage(&record);
        let mut output = StageOutput::new(format!("{} analyzed", record.len()));
        output.alerts = alerts;
        Ok(output.fragment(fragment))
    }
}

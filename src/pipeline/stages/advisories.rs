//! Known-vulnerability lookup for the exact package+version

use crate::pipeline::{Context, Stage, StageError, StageOutput};

const ALERT_TYPE: &str = "contains known vulnerabilities (CVEs)";

pub struct AdvisoryStage;

impl Stage for AdvisoryStage {
    fn name(&self) -> &'static str {
        "vulnerabilities"
    }

    fn describe(&self) -> &'static str {
        "Checking for CVEs"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let advisories = ctx
            .advisories
            .lookup(
                ctx.identity.ecosystem,
                &ctx.identity.name,
                &ctx.version_info.tag,
            )
            .map_err(StageError::External)?;

        let mut output = StageOutput::new(format!("{} found", advisories.len()));
        if !advisories.is_empty() {
            let ids: Vec<&str> = advisories.iter().map(|a| a.id.as_str()).collect();
            output = output.alert(ALERT_TYPE, format!("contains {}", ids.join(",")));
        }

        let fragment = serde_json::to_value(&advisories).map_err(|_| StageError::Parse)?;
        Ok(output.fragment(fragment))
    }
}

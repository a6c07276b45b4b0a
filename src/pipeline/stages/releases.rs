//! Release-history cadence — few releases, or a long gap before this one

use crate::pipeline::{Context, Stage, StageError, StageOutput};

/// A release arriving after a gap this long is a takeover indicator.
const MAX_GAP_DAYS: i64 = 180;

pub struct ReleasesStage;

impl Stage for ReleasesStage {
    fn name(&self) -> &'static str {
        "releases"
    }

    fn describe(&self) -> &'static str {
        "Checking release history"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let history = ctx
            .registry
            .release_history(&ctx.metadata)
            .map_err(StageError::External)?;
        if history.is_empty() {
            return Err(StageError::NoData);
        }

        let mut output = StageOutput::new(format!("{} versions", history.len()));

        if history.len() < 2 {
            output = output.alert(
                "few versions or releases",
                format!("only {} versions released", history.len()),
            );
        } else if let Some(gap) = history.gap_for(&ctx.version_info.tag) {
            if gap > MAX_GAP_DAYS {
                output = output.alert(
                    "version release after a long gap",
                    format!("version released after {} days", gap),
                );
            }
        }

        let fragment = serde_json::to_value(&history).map_err(|_| StageError::Parse)?;
        Ok(output.fragment(fragment))
    }
}

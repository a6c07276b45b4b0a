//! Description/readme completeness — throwaway packages rarely bother

use crate::pipeline::{Context, Stage, StageError, StageOutput};

/// Anything shorter than this is not a real description.
const MIN_DESCRIPTION_BYTES: usize = 100;

const ALERT_TYPE: &str = "no or insufficient readme";

pub struct ReadmeStage;

impl Stage for ReadmeStage {
    fn name(&self) -> &'static str {
        "readme"
    }

    fn describe(&self) -> &'static str {
        "Checking readme"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let description = ctx.registry.description(&ctx.metadata);

        let output = match description {
            None => StageOutput::new("0 bytes").alert(ALERT_TYPE, "no description"),
            Some(text) => {
                let output = StageOutput::new(format!("{} bytes", text.len()));
                if text.len() < MIN_DESCRIPTION_BYTES {
                    output.alert(ALERT_TYPE, "insufficient description")
                } else {
                    output
                }
            }
        };

        Ok(output)
    }
}

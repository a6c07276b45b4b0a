//! Author identity — a package without a working author email is a takeover
//! and account-recovery risk

use crate::net::EmailVerdict;
use crate::pipeline::{Context, Stage, StageError, StageOutput};

const ALERT_TYPE: &str = "invalid or no author email (2FA not enabled)";

pub struct AuthorStage;

impl Stage for AuthorStage {
    fn name(&self) -> &'static str {
        "author"
    }

    fn describe(&self) -> &'static str {
        "Checking author"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let author = ctx
            .registry
            .author(&ctx.metadata)
            .ok_or(StageError::NoData)?;
        let fragment = serde_json::to_value(&author).map_err(|_| StageError::Parse)?;

        let output = match author.email.as_deref() {
            None => StageOutput::new("no email").alert(ALERT_TYPE, "no email"),
            Some(email) => {
                let output = StageOutput::new(email);
                match ctx.email.verify(email) {
                    EmailVerdict::Valid => output,
                    EmailVerdict::BadSyntax => output.alert(ALERT_TYPE, "invalid author email"),
                    EmailVerdict::DeadDomain => {
                        output.alert(ALERT_TYPE, "expired author email domain")
                    }
                }
            }
        };

        Ok(output.fragment(fragment))
    }
}

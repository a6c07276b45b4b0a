//! Homepage validity — absent, insecure, dead, or hiding behind a domain
//! too popular to be a dedicated package homepage
//!
//! The scheme, reachability, and popularity checks are independent: an
//! `http://` homepage raises "insecure webpage" even when the site answers.

use crate::net::{domain_too_popular, SiteStatus};
use crate::pipeline::{Context, Stage, StageError, StageOutput};

const ALERT_TYPE: &str = "invalid or no homepage";

pub struct HomepageStage;

impl Stage for HomepageStage {
    fn name(&self) -> &'static str {
        "homepage"
    }

    fn describe(&self) -> &'static str {
        "Checking homepage"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let Some(homepage) = ctx.registry.homepage(&ctx.metadata) else {
            return Ok(StageOutput::new("none").alert(ALERT_TYPE, "no homepage"));
        };

        let parsed = url::Url::parse(&homepage).map_err(|_| StageError::Parse)?;
        let mut output = StageOutput::new(homepage.clone());

        if parsed.scheme() != "https" {
            output = output.alert(ALERT_TYPE, "insecure webpage");
        }

        match ctx.probe.check_site(&homepage) {
            SiteStatus::Unreachable(reason) => {
                output = output.alert(ALERT_TYPE, reason);
            }
            SiteStatus::Reachable => {
                if domain_too_popular(&homepage) {
                    output = output.alert(ALERT_TYPE, "invalid (popular) webpage");
                }
            }
        }

        Ok(output.fragment(serde_json::Value::String(homepage)))
    }
}

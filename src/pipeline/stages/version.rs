//! Version freshness — flags packages whose latest upload is stale

use crate::pipeline::{Context, Stage, StageError, StageOutput};
use chrono::{DateTime, Utc};

/// A release older than this is treated as unmaintained.
const MAX_AGE_DAYS: i64 = 365;

const ALERT_TYPE: &str = "old package";

pub struct VersionStage;

impl Stage for VersionStage {
    fn name(&self) -> &'static str {
        "version"
    }

    fn describe(&self) -> &'static str {
        "Checking version"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let info = &ctx.version_info;
        let fragment = serde_json::to_value(info).map_err(|_| StageError::Parse)?;

        let output = match info.uploaded {
            None => StageOutput::new("unknown upload date").alert(ALERT_TYPE, "no release date"),
            Some(uploaded) => {
                let days = age_in_days(uploaded);
                let output = StageOutput::new(format!("{} days old", days));
                if days > MAX_AGE_DAYS {
                    output.alert(ALERT_TYPE, format!("{} days old", days))
                } else {
                    output
                }
            }
        };

        Ok(output.fragment(fragment))
    }
}

/// Age of an upload, clamped at zero: registry clock skew can put a fresh
/// upload slightly in the future.
fn age_in_days(uploaded: DateTime<Utc>) -> i64 {
    (Utc::now() - uploaded).num_days().max(0)
}

// ─── Tests ─────────────────────────────────────────────────────────

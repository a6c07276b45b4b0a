//! Download popularity — packages nobody installs deserve extra suspicion

use crate::pipeline::{Context, Stage, StageError, StageOutput};

/// Weekly download floor below which a package counts as unpopular.
const MIN_WEEKLY_DOWNLOADS: u64 = 1000;

pub struct DownloadsStage;

impl Stage for DownloadsStage {
    fn name(&self) -> &'static str {
        "downloads"
    }

    fn describe(&self) -> &'static str {
        "Checking downloads"
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError> {
        let weekly = ctx
            .registry
            .weekly_downloads(&ctx.identity.name)
            .map_err(StageError::External)?;

        let mut output = StageOutput::new(format!("{} weekly", human_count(weekly)));
        if weekly < MIN_WEEKLY_DOWNLOADS {
            output = output.alert(
                "few downloads",
                format!("only {} weekly downloads", weekly),
            );
        }
        Ok(output)
    }
}

/// Human-readable count, e.g. 12_400_000 → "12.4M".
fn human_count(n: u64) -> String {
    const UNITS: &[(u64, &str)] = &[(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];
    for (scale, suffix) in UNITS {
        if n >= *scale {
            let value = n as f64 / *scale as f64;
            return if value >= 100.0 {
                format!("{:.0}{}", value, suffix)
            } else {
                format!("{:.1}{}", value, suffix)
            };
        }
    }
    n.to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_counts() {
        assert_eq!(human_count(0), "0");
        assert_eq!(human_count(999), "999");
        assert_eq!(human_count(1_500), "1.5K");
        assert_eq!(human_count(123_000), "123K");
        assert_eq!(human_count(12_400_000), "12.4M");
        assert_eq!(human_count(3_000_000_000), "3.0B");
    }
}

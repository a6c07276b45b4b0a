//! Vetting pipeline — failure-isolated staged execution
//!
//! Each heuristic check implements [`Stage`] and returns a pure delta: the
//! alerts it wants to raise plus its report fragment. The pipeline drives
//! stages in strict declaration order, prints one progress line per stage,
//! and pattern-matches on each stage's `Result` so "skip on failure" is an
//! explicit branch — a failing stage contributes nothing and never stops the
//! stages after it.

pub mod stages;

use crate::advisories::AdvisoryDb;
use crate::analyzer::StaticAnalyzer;
use crate::net::{EmailVerifier, WebProbe};
use crate::registry::{PackageIdentity, Registry, VersionInfo};
use crate::report::Fragments;
use crate::threat::{AlertRegistry, RawAlert, ThreatModel};
use serde_json::Value;
use std::io::Write;
use thiserror::Error;

// ─── Stage Failure ─────────────────────────────────────────────────

/// A single stage's internal failure. Caught at the stage boundary and
/// rendered as a `FAILED [...]` progress line; never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The signal source returned nothing to inspect
    #[error("no data")]
    NoData,

    /// The signal source returned something we could not interpret
    #[error("parse error")]
    Parse,

    /// An external collaborator failed
    #[error("{0}")]
    External(String),
}

impl From<String> for StageError {
    fn from(message: String) -> Self {
        Self::External(message)
    }
}

// ─── Stage Output ──────────────────────────────────────────────────

/// What a successful stage contributes: a one-line summary for the progress
/// log, zero or more raw alerts, and at most one report fragment.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub summary: String,
    pub alerts: Vec<RawAlert>,
    pub fragment: Option<Value>,
}

impl StageOutput {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn alert(mut self, alert_type: &str, reason: impl Into<String>) -> Self {
        self.alerts.push(RawAlert::new(alert_type, reason.into()));
        self
    }

    pub fn fragment(mut self, fragment: Value) -> Self {
        self.fragment = Some(fragment);
        self
    }
}

// ─── Context ───────────────────────────────────────────────────────

/// Everything a stage may read: the resolved package identity, the fetched
/// registry document, and the injected collaborators. Constructed fresh per
/// run and immutable while stages execute, so no stage can leak state into
/// another.
pub struct Context {
    pub identity: PackageIdentity,
    pub metadata: Value,
    pub version_info: VersionInfo,
    pub registry: Box<dyn Registry>,
    pub probe: Box<dyn WebProbe>,
    pub email: Box<dyn EmailVerifier>,
    pub advisories: Box<dyn AdvisoryDb>,
    pub analyzer: Box<dyn StaticAnalyzer>,
}

impl Context {
    /// Fetch metadata and resolve the package identity. Failure here is a
    /// fatal registry error: the pipeline cannot start without it.
    pub fn resolve(
        mut identity: PackageIdentity,
        registry: Box<dyn Registry>,
        probe: Box<dyn WebProbe>,
        email: Box<dyn EmailVerifier>,
        advisories: Box<dyn AdvisoryDb>,
        analyzer: Box<dyn StaticAnalyzer>,
    ) -> Result<Self, crate::VetError> {
        let metadata = registry
            .fetch_metadata(&identity.name)
            .map_err(crate::VetError::Registry)?;

        if let Some(canonical) = registry.canonical_name(&metadata) {
            identity.name = canonical;
        }

        let version_info = registry
            .version_info(&metadata, identity.version.as_deref())
            .map_err(crate::VetError::Registry)?;
        identity.version = Some(version_info.tag.clone());

        Ok(Self {
            identity,
            metadata,
            version_info,
            registry,
            probe,
            email,
            advisories,
            analyzer,
        })
    }
}

// ─── Stage Trait ───────────────────────────────────────────────────

/// One isolated heuristic check against a single signal source.
///
/// Stages are:
/// - **Independent**: each reads only the shared [`Context`]
/// - **Pure deltas**: `run()` returns what to merge, it mutates nothing
/// - **Failure-isolated**: any [`StageError`] is confined to this stage
pub trait Stage: Send + Sync {
    /// Report section this stage's fragment lands under
    fn name(&self) -> &'static str;

    /// Progress-line label, e.g. "Checking version"
    fn describe(&self) -> &'static str;

    /// Whether this stage applies at all (skipped silently when false)
    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StageOutput, StageError>;
}

// ─── Pipeline Execution ────────────────────────────────────────────

/// Runs an ordered list of stages against a shared context, isolating each
/// stage's failure and merging the successful deltas.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The full vetting pipeline in its fixed stage order.
    pub fn vetting() -> Self {
        Self::new(stages::build_stages())
    }

    /// Execute every stage in order. Alerts flow through the threat model
    /// into `alerts`; fragments land in `fragments` under each stage's
    /// section name. Completes regardless of how many stages fail.
    pub fn run(
        &self,
        ctx: &Context,
        model: &ThreatModel,
        alerts: &mut AlertRegistry,
        fragments: &mut Fragments,
    ) {
        for stage in &self.stages {
            run_stage(stage.as_ref(), ctx, model, alerts, fragments);
        }
    }
}

/// Execute a single stage with progress output and failure isolation.
pub fn run_stage(
    stage: &dyn Stage,
    ctx: &Context,
    model: &ThreatModel,
    alerts: &mut AlertRegistry,
    fragments: &mut Fragments,
) {
    if !stage.should_run(ctx) {
        tracing::debug!("skipping stage: {}", stage.name());
        return;
    }

    print!("[+] {}...", stage.describe());
    let _ = std::io::stdout().flush();
    let start = std::time::Instant::now();

    match stage.run(ctx) {
        Ok(output) => {
            for alert in &output.alerts {
                alerts.record(&alert.alert_type, &alert.reason, model);
            }
            if let Some(fragment) = output.fragment {
                fragments.insert(stage.name(), fragment);
            }
            println!("OK [{}]", output.summary);
            tracing::debug!(
                "stage {} ok in {}ms ({} alerts)",
                stage.name(),
                start.elapsed().as_millis(),
                output.alerts.len()
            );
        }
        Err(e) => {
            println!("FAILED [{}]", e);
            tracing::debug!(
                "stage {} failed in {}ms: {}",
                stage.name(),
                start.elapsed().as_millis(),
                e
            );
        }
    }
}

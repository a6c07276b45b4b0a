//! # pkgvet — supply-chain risk vetting for published packages
//!
//! Vets a single published package (ecosystem + name + optional version) for
//! supply-chain risk indicators and produces a categorized JSON risk report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Pipeline                             │
//! │  ┌──────────┐ ┌───────────┐ ┌──────────┐ ┌───────────────┐  │
//! │  │ Registry │ │ WebProbe/ │ │ Advisory │ │ StaticAnalyzer│  │
//! │  │ client   │ │ Email     │ │ DB (OSV) │ │ (astgen)      │  │
//! │  └────┬─────┘ └────┬──────┘ └────┬─────┘ └──────┬────────┘  │
//! │       │            │             │              │           │
//! │  ┌────▼────────────▼─────────────▼──────────────▼─────────┐ │
//! │  │  9 Independent Vetting Stages (failure-isolated)       │ │
//! │  │  Version │ Releases │ Author │ Readme │ Homepage │ ... │ │
//! │  └────────────────────────┬───────────────────────────────┘ │
//! │                           │                                 │
//! │  ┌────────────────────────▼───────────────────────────────┐ │
//! │  │ ThreatModel classify → AlertRegistry → ReportBuilder   │ │
//! │  └────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage inspects one signal source (release cadence, author identity,
//! hosting links, download counts, advisories, statically-recovered API
//! usage), emits zero or more alerts through the threat-model-driven
//! classifier, and contributes one fragment to the final report. A failing
//! stage never aborts the others: its error is caught at the stage boundary,
//! logged as a `FAILED [...]` progress line, and the run continues.

pub mod advisories;
pub mod analyzer;
pub mod classify;
pub mod net;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod threat;

// Re-exports for convenience
pub use classify::{ApiUsageRecord, UsageTag};
pub use pipeline::{Context, Pipeline, Stage, StageError, StageOutput};
pub use registry::{Ecosystem, PackageIdentity, Registry};
pub use report::{Fragments, ReportBuilder};
pub use threat::{AlertRegistry, ThreatModel};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VetError {
    /// Threat-model source unreadable or malformed. Fatal during setup.
    #[error("Threat model error: {0}")]
    Config(String),

    /// Package/version not found or registry unreachable before any stage ran.
    #[error("Registry error: {0}")]
    Registry(String),

    /// A single stage's internal failure. The pipeline catches these at the
    /// stage boundary; they surface here only from direct stage calls.
    #[error("Stage error: {0}")]
    Stage(#[from] pipeline::StageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type VetResult<T> = Result<T, VetError>;

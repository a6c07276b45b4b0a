//! pkgvet CLI — vet one published package and write its risk report

use clap::Parser;
use pkgvet::advisories::OsvClient;
use pkgvet::analyzer::AstgenAnalyzer;
use pkgvet::net::{DnsEmailVerifier, HttpProbe};
use pkgvet::report::{report_filename, write_report};
use pkgvet::{
    registry, AlertRegistry, Context, Ecosystem, Fragments, PackageIdentity, Pipeline,
    ReportBuilder, ThreatModel, VetError, VetResult,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "pkgvet",
    version,
    about = "Vet a published package for supply-chain risk indicators",
    after_help = "Examples:\n  pkgvet pypi requests\n  pkgvet npm left-pad==1.3.0"
)]
struct Cli {
    /// Package ecosystem (pypi, npm)
    ecosystem: String,

    /// Package name, optionally pinned as name==version
    package: String,

    /// Threat-model table overriding the built-in one
    #[arg(long, value_name = "PATH")]
    threat_model: Option<PathBuf>,

    /// External static-analyzer command for the API-usage stage
    #[arg(long, value_name = "CMD", default_value = "astgen")]
    analyzer: String,

    /// Directory the report artifact is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "pkgvet=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pkgvet: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> VetResult<()> {
    // Setup failures are fatal; once the pipeline starts, the run always
    // completes and emits a report.
    let model = match &cli.threat_model {
        Some(path) => ThreatModel::load(path)?,
        None => ThreatModel::builtin(),
    };
    tracing::debug!("threat model: {} alert types", model.len());

    let ecosystem = Ecosystem::parse(&cli.ecosystem).map_err(VetError::Registry)?;
    let identity = PackageIdentity::parse(ecosystem, &cli.package);

    let registry = registry::for_ecosystem(ecosystem).map_err(VetError::Registry)?;
    let probe = HttpProbe::new().map_err(VetError::Registry)?;
    let advisories = OsvClient::new().map_err(VetError::Registry)?;

    print!("[+] Fetching '{}' from {}...", identity.name, ecosystem);
    let _ = std::io::stdout().flush();
    let ctx = match Context::resolve(
        identity,
        registry,
        Box::new(probe),
        Box::new(DnsEmailVerifier),
        Box::new(advisories),
        Box::new(AstgenAnalyzer::new(cli.analyzer)),
    ) {
        Ok(ctx) => {
            println!("OK [ver {}]", ctx.version_info.tag);
            ctx
        }
        Err(e) => {
            println!("FAILED [{}]", e);
            return Err(e);
        }
    };

    let mut alerts = AlertRegistry::new();
    let mut fragments = Fragments::new();
    Pipeline::vetting().run(&ctx, &model, &mut alerts, &mut fragments);

    println!("=============================================");
    if alerts.is_empty() {
        println!("[+] No risks found!");
    } else {
        println!(
            "[+] {} risk(s) found, package is {}!",
            alerts.message_count(),
            alerts.category_names().join(", ")
        );
    }

    let report = ReportBuilder::finalize(fragments, &alerts);
    let path = cli.output_dir.join(report_filename(&ctx.identity));
    write_report(&path, &report)?;
    println!("=> Complete report: {}", path.display());

    Ok(())
}

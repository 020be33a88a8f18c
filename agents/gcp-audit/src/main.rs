//! GCP Self-Audit - Standalone Binary
//!
//! Audits one project and writes `<label>_<year><period>_<project>.xlsx`.
//!
//! ## Usage
//!
//! ```bash
//! # Audit with Application Default Credentials
//! gcp-audit --project gcp-lornu-ai --year 2025 --period H1
//!
//! # Run sections concurrently and print the result as JSON
//! gcp-audit --project gcp-lornu-ai --year 2025 --period H2 --parallel --output json
//! ```
//!
//! Exit codes: 0 SUCCESS, 1 FAILED, 2 AUTH_REQUIRED.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_audit::{AuditConfig, AuditRequest, AuditResult, AuditStatus, Auditor};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// GCP Self-Audit - IAM, BYOK and firewall compliance report
#[derive(Parser, Debug)]
#[command(name = "gcp-audit", version, about)]
struct Args {
    /// GCP Project ID
    #[arg(long, env = "GCP_PROJECT_ID")]
    project: String,

    /// Audit year (e.g. 2025)
    #[arg(long)]
    year: String,

    /// Audit period: H1 or H2
    #[arg(long)]
    period: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Primary report directory (defaults to the home directory)
    #[arg(long, env = "GCP_AUDIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Fallback report directory (defaults to the system temp dir)
    #[arg(long, env = "GCP_AUDIT_FALLBACK_DIR")]
    fallback_dir: Option<PathBuf>,

    /// Report file name prefix
    #[arg(long, env = "GCP_AUDIT_REPORT_LABEL")]
    label: Option<String>,

    /// Fetch the three sections concurrently (also GCP_AUDIT_PARALLEL)
    #[arg(long)]
    parallel: bool,

    /// Pre-issued OAuth token instead of ADC
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

fn exit_code(status: AuditStatus) -> u8 {
    match status {
        AuditStatus::Success => 0,
        AuditStatus::Failed => 1,
        AuditStatus::AuthRequired => 2,
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
    .context("Failed to initialize logging")
}

fn build_config(args: &Args) -> AuditConfig {
    let mut config = AuditConfig::from_env();

    // Absent flag defers to GCP_AUDIT_PARALLEL
    if args.parallel {
        config = config.with_parallel_sections(true);
    }

    if let Some(dir) = &args.output_dir {
        config = config.with_primary_dir(dir);
    }
    if let Some(dir) = &args.fallback_dir {
        config = config.with_fallback_dir(dir);
    }
    if let Some(label) = &args.label {
        config = config.with_report_label(label);
    }
    config
}

async fn run(args: &Args) -> Result<AuditResult> {
    let config = build_config(args);

    let auditor = match &args.access_token {
        Some(token) => Auditor::with_access_token(config, token),
        None => Auditor::from_config(config),
    }
    .context("Failed to initialize auditor")?;

    let result = match AuditRequest::new(&args.project, &args.year, &args.period) {
        Ok(request) => auditor.run_audit(&request).await,
        Err(e) => {
            warn!(error = %e, "Rejected audit request");
            AuditResult::rejected(&args.project, &args.year, &args.period, &e)
        }
    };

    Ok(result)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args)?;

    info!(
        project = %args.project,
        year = %args.year,
        period = %args.period,
        parallel = args.parallel,
        "Starting GCP Self-Audit"
    );

    let result = run(&args).await?;

    match args.output {
        OutputFormat::Text => {
            println!("{}", result.summary());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?
            );
        }
    }

    Ok(ExitCode::from(exit_code(result.status)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(AuditStatus::Success), 0);
        assert_eq!(exit_code(AuditStatus::Failed), 1);
        assert_eq!(exit_code(AuditStatus::AuthRequired), 2);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "gcp-audit",
            "--project",
            "proj-1",
            "--year",
            "2025",
            "--period",
            "H1",
            "--parallel",
            "--output",
            "json",
            "--label",
            "Audit",
        ])
        .unwrap();

        assert_eq!(args.project, "proj-1");
        assert!(args.parallel);
        assert!(matches!(args.output, OutputFormat::Json));

        let config = build_config(&args);
        assert_eq!(config.report_label, "Audit");
        assert!(config.parallel_sections);
    }

    #[test]
    fn test_parallel_env_survives_without_flag() {
        std::env::set_var("GCP_AUDIT_PARALLEL", "1");
        let args = Args::try_parse_from([
            "gcp-audit",
            "--project",
            "proj-1",
            "--year",
            "2025",
            "--period",
            "H1",
        ])
        .unwrap();
        let config = build_config(&args);
        std::env::remove_var("GCP_AUDIT_PARALLEL");

        assert!(!args.parallel);
        assert!(config.parallel_sections);
    }
}

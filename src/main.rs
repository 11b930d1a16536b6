use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod analytics;
mod auth;
mod config;
mod error;
mod models;
mod report;
mod skills;
mod usage;
mod validate;

use analytics::Ga4Client;
use auth::Credentials;
use config::{ReportArgs, ReportConfig, ValidateArgs, ValidateConfig};
use error::{ReportError, ValidateError};
use skills::FrontmatterValidator;

#[derive(Parser)]
#[command(name = "usage-tools")]
#[command(about = "GA4 user usage reporting and skill directory validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report per-user pageviews and sessions over a trailing window
    Report(ReportArgs),
    /// Validate every skill directory under a root
    ValidateSkills(ValidateArgs),
}

const SERVICE_CHECKLIST: &str = "\
Troubleshooting:
  1. GOOGLE_APPLICATION_CREDENTIALS points at a readable service account key
     (or GA4_ACCESS_TOKEN holds a current access token)
  2. The service account has Viewer access on the GA4 property
  3. GA4_PROPERTY_ID is the numeric property id, not a measurement id (G-XXXX)
  4. The Google Analytics Data API is enabled for the key's project";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("usage_tools=info,reqwest=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => match run_report(args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                report_failure(&err);
                ExitCode::FAILURE
            }
        },
        Commands::ValidateSkills(args) => match run_validate(args.into()) {
            Ok(code) => ExitCode::from(code),
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run_report(args: ReportArgs) -> Result<(), ReportError> {
    let config = ReportConfig::try_from(args)?;
    let credentials = Credentials::from_env()?;
    let http = reqwest::Client::builder()
        .user_agent(concat!("usage-tools/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(error::ServiceError::from)?;
    let client = Ga4Client::new(http, credentials);

    let today = Utc::now().date_naive();
    let mut stdout = io::stdout().lock();
    usage::generate_report(&client, &config, today, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

fn run_validate(config: ValidateConfig) -> Result<u8, ValidateError> {
    let validator = FrontmatterValidator::new()?;
    let mut stdout = io::stdout().lock();
    let summary = validate::validate_all(&validator, &config.root, &mut stdout)?;
    stdout.flush()?;
    Ok(summary.exit_code())
}

fn report_failure(err: &ReportError) {
    eprintln!("Error: {err}");
    if matches!(err, ReportError::Service(_)) {
        eprintln!();
        eprintln!("{SERVICE_CHECKLIST}");
    }
}

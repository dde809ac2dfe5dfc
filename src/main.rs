// src/main.rs
mod config;
mod edgar;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use clap::Parser;
use config::{PipelineConfig, DEFAULT_TICKERS_PATH};
use edgar::client::{EdgarHttpClient, Fetcher};
use edgar::directory::{refresh_snapshot, IssuerDirectory};
use edgar::models::AccessionNumber;
use extractors::{SecApiClient, Statement};
use pipeline::FilingPipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use storage::StorageManager;
use utils::AppError;

/// Fetch the cash-flow statement of a company's most recent 10-K filing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company (matched exactly, e.g. AAPL)
    #[arg(short, long)]
    ticker: String,

    /// Specific SEC accession number (optional, skips the 10-K lookup)
    #[arg(short, long)]
    accession_number: Option<String>,

    /// Local issuer directory snapshot (SEC company_tickers.json)
    #[arg(long, default_value = DEFAULT_TICKERS_PATH)]
    tickers_file: PathBuf,

    /// Download a fresh issuer directory snapshot before running
    #[arg(long)]
    refresh_directory: bool,

    /// Statement sections to extract (repeatable, default: cash-flow)
    #[arg(long = "statement", value_enum)]
    statements: Vec<Statement>,

    /// Name sent in the EDGAR User-Agent header
    #[arg(long, env = "SEC_USER_AGENT_NAME")]
    user_agent_name: String,

    /// Contact email sent in the EDGAR User-Agent header
    #[arg(long, env = "SEC_USER_AGENT_EMAIL")]
    user_agent_email: String,

    /// API key for the sec-api.io XBRL-to-JSON service
    #[arg(long, env = "SEC_API_KEY", hide_env_values = true)]
    sec_api_key: String,

    /// Retries for transient network failures
    #[arg(long, default_value = "2")]
    max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Directory to store the statements and metadata (optional)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            self.user_agent_name.clone(),
            self.user_agent_email.clone(),
            self.sec_api_key.clone(),
        )
        .with_statements(&self.statements);
        config.tickers_path = self.tickers_file.clone();
        config.retry.max_retries = self.max_retries;
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(if args.verbose { "debug" } else { "info" });
    tracing::info!("Starting statement retrieval for ticker {}", args.ticker);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            tracing::error!(exit_code = code, "{}", e);
            ExitCode::from(code)
        }
    }
}

async fn run(args: &Args) -> Result<(), AppError> {
    // 3. Build and check the configuration
    let config = args.to_config();
    config.validate()?;
    let accession = args
        .accession_number
        .as_deref()
        .map(AccessionNumber::parse)
        .transpose()
        .map_err(AppError::Config)?;

    // 4. Clients
    let fetcher: Arc<dyn Fetcher> = Arc::new(EdgarHttpClient::new(
        &config.user_agent(),
        config.request_timeout,
        config.request_interval,
    )?);
    let converter = Arc::new(SecApiClient::new(
        config.endpoints.xbrl_to_json.clone(),
        config.sec_api_key.clone(),
        config.request_timeout,
    )?);

    // 5. Issuer directory
    let directory = if args.refresh_directory {
        refresh_snapshot(
            fetcher.as_ref(),
            config.endpoints.tickers_url.as_str(),
            &config.retry,
            &config.tickers_path,
        )
        .await?
    } else {
        IssuerDirectory::load(&config.tickers_path).await?
    };

    // 6. Run the pipeline
    let pipeline = FilingPipeline::new(&config, Arc::new(directory), fetcher, converter);
    let report = match pipeline.run(&args.ticker, accession).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(
                stage = %e.stage,
                kind = ?e.kind(),
                status = ?e.status(),
                "Pipeline stopped for ticker {}",
                args.ticker
            );
            return Err(e.into());
        }
    };
    tracing::info!(
        "Retrieved {} from {} ({})",
        report.statements.keys().cloned().collect::<Vec<_>>().join(", "),
        report.document_url,
        report.accession_number
    );

    // 7. Optionally persist
    if let Some(output_dir) = &args.output_dir {
        let storage = StorageManager::new(output_dir)?;
        storage.save_statements(&report)?;
        storage.save_report_metadata(&report)?;
    }

    println!("{}", serde_json::to_string_pretty(&report.statements)?);
    Ok(())
}

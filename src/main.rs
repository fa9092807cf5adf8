use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Instrument};

use site_verifier::config::SiteVerifierConfig;
use site_verifier::console::Console;
use site_verifier::telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
use site_verifier::verification::SiteVerificationClient;
use site_verifier::workflows::{CleanupOutcome, VerificationWorkflow, WorkflowError};

#[derive(Parser)]
#[command(name = "site-verifier")]
#[command(about = "Interactive walkthrough of the Google Site Verification API")]
#[command(long_about = "Requests a meta tag verification token for a site, waits while you publish it, \
                       verifies ownership, lists your verified sites and optionally delegates \
                       co-ownership and unverifies the site again. Run it with a test account: \
                       your verification data may be modified.")]
struct Cli {
    /// Configuration file layered over site-verifier.toml
    #[arg(long, value_name = "FILE", help = "Read settings from this TOML file")]
    config: Option<PathBuf>,
    /// OAuth2 access token with the siteverification scope
    #[arg(
        long,
        env = "GOOGLE_OAUTH_ACCESS_TOKEN",
        hide_env_values = true,
        help = "OAuth2 access token (defaults to gcloud auth print-access-token)"
    )]
    access_token: Option<String>,
    /// Root of the Site Verification REST API
    #[arg(long, value_name = "URL", help = "Override the API base URL")]
    api_base_url: Option<String>,
    /// Log API traffic and state transitions to stderr
    #[arg(long, short = 'v', help = "Enable debug logging on stderr")]
    verbose: bool,
    /// Emit logs as JSON records
    #[arg(long, help = "Write log records as JSON")]
    json_logs: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e:?}");
            return ExitCode::FAILURE;
        }
    };

    install_panic_logging();

    let client = {
        println!("🔑 Getting an OAuth access token...");
        match settings
            .api
            .resolve_access_token()
            .and_then(|token| SiteVerificationClient::new(&settings.api, token))
        {
            Ok(client) => client,
            Err(e) => {
                error!("Could not set up the Site Verification client: {}", e);
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{e:?}");
            return ExitCode::FAILURE;
        }
    };

    let correlation_id = generate_correlation_id();
    let span = create_workflow_span(&correlation_id);
    let mut console = Console::stdio();
    let mut workflow = VerificationWorkflow::new(client);

    let result = runtime.block_on(workflow.run(&mut console).instrument(span));

    match result {
        Ok(outcome) => {
            if matches!(outcome.cleanup, CleanupOutcome::Rejected | CleanupOutcome::Failed { .. }) {
                info!("Run ended with the site still verified");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(e),
    }
}

fn load_settings(cli: &Cli) -> Result<SiteVerifierConfig> {
    let env_file_loaded = SiteVerifierConfig::load_env_file().context("Failed to read .env file")?;
    let mut settings = SiteVerifierConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(token) = &cli.access_token {
        settings.api.access_token = Some(token.clone());
    }
    if let Some(base_url) = &cli.api_base_url {
        settings.api.base_url = base_url.clone();
    }
    if cli.verbose {
        settings.observability.log_level = "debug".to_string();
    }
    if cli.json_logs {
        settings.observability.json_logs = true;
    }

    init_telemetry(&settings.observability).context("Failed to initialize logging")?;
    if env_file_loaded {
        info!("Loaded environment variables from .env file");
    }
    Ok(settings)
}

fn report_failure(e: WorkflowError) -> ExitCode {
    if e.is_io_kind() {
        error!(error = %e, "Verification workflow aborted");
        eprintln!("{e}");
    } else {
        error!(error = ?e, "Verification workflow failed unexpectedly");
        eprintln!("{:?}", anyhow::Error::new(e));
    }
    ExitCode::FAILURE
}

/// Route panics through the log before the default report
fn install_panic_logging() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(panic = %panic_info, "Unexpected failure");
        default_hook(panic_info);
    }));
}

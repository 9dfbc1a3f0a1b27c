//! DTS command-line client
//!
//! Lists databases, searches them, fetches file metadata, and submits,
//! watches and cancels transfers on a Data Transfer System server.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use dts_client::cli::{
    handle_auth, handle_config, handle_databases, handle_metadata, handle_search,
    handle_transfer, Cli, Commands, Session,
};
use dts_client::config::AppConfig;
use dts_client::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        debug!("Failure category: {}", e.category());
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config);
    info!("dts v{} starting", env!("CARGO_PKG_VERSION"));

    let session = Session::resolve(&cli.global, config);
    debug!("Using server {}", session.server);

    match cli.command {
        Commands::Databases => handle_databases(&session).await,
        Commands::Search(args) => handle_search(&session, args).await,
        Commands::Metadata(args) => handle_metadata(&session, args).await,
        Commands::Transfer(args) => handle_transfer(&session, args).await,
        Commands::Auth(args) => handle_auth(&session, args).await,
        Commands::Config(args) => handle_config(&session, args).await,
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|l| l.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("dts_client={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(config.logging.colored_output)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}

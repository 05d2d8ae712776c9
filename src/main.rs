//! Movie Feed CLI application
//!
//! Command-line interface for browsing the popular-movies feed of a movie
//! metadata API, with thumbnail downloads and connectivity-aware retries.

use std::process;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use movie_feed::cli::{Cli, Commands, handle_config, handle_detail, handle_popular, handle_watch};
use movie_feed::config::AppConfig;
use movie_feed::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
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

    info!("Movie Feed v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Popular(args) => {
            info!("Executing popular command");
            handle_popular(args, &config).await
        }
        Commands::Detail(args) => {
            info!("Executing detail command");
            handle_detail(args, &config).await
        }
        Commands::Watch(args) => {
            info!("Executing watch command");
            handle_watch(args, &config).await
        }
        Commands::Config(args) => handle_config(args, &config, cli.global.config.clone()).await,
    }
}

/// Initialize logging from CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level_override()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("movie_feed={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}

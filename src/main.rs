//! GLIMPS CLI Entry Point
//!
//! - `glimps login` / `glimps logout` - Manage the stored session
//! - `glimps projects|molecules|models` - Manage backend resources
//! - `glimps jobs watch` - Follow training and inference jobs
//! - `glimps view <file>` - Export a structure as a 3D viewer page

use glimps::cli::{commands, Cli};
use glimps::utils::config::GlimpsConfig;
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let config = GlimpsConfig::load(&cli.config)?;
    init_tracing(&config, cli.verbose);

    tracing::debug!(config = %cli.config.display(), api = %config.api.base_url, "Configuration loaded");
    commands::execute(cli, config).await
}

fn init_tracing(config: &GlimpsConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so command output stays pipeable.
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

//! noticegen - Notice-of-meeting generation
//!
//! Entry point for the noticegen CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use noticegen::cli::{Cli, Commands};
use noticegen::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose and the config file.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let explicit_filter = env_filter.is_some() || cli.verbose;
    let initial = env_filter.unwrap_or_else(|| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            noticegen::cli::completions::write_completions(shell, &mut std::io::stdout());
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            if !explicit_filter {
                match EnvFilter::try_new(&settings.general.log_level) {
                    Ok(filter) => {
                        let _ = filter_handle.reload(filter);
                    }
                    Err(e) => tracing::warn!(
                        "Ignoring invalid log level '{}': {}",
                        settings.general.log_level,
                        e
                    ),
                }
            }

            // Execute command
            match command {
                Commands::Serve { host, port } => {
                    noticegen::cli::commands::serve(&settings, host, port).await?;
                }
                Commands::Generate(args) => {
                    noticegen::cli::commands::generate_notice(&settings, args).await?;
                }
                Commands::Format(args) => {
                    noticegen::cli::commands::format_reply(args)?;
                }
                Commands::Config(config_cmd) => {
                    noticegen::cli::commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}

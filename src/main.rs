//! Laere CLI entry point.

use anyhow::Result;
use clap::Parser;
use laere::cli::{commands, Cli, Commands};
use laere::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; -v flags override the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("laere={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Generate {
            prompt,
            github_token,
            files_url,
            priority,
            model,
            output,
        } => {
            commands::run_generate(
                prompt,
                github_token.clone(),
                files_url.clone(),
                priority.clone(),
                model.clone(),
                output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Index { paths, force } => {
            commands::run_index(paths, *force, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
            priority,
        } => {
            commands::run_search(query, *limit, *min_score, priority.clone(), settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}

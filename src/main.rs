use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript_service::provider::YoutubeProvider;
use yt_transcript_service::server::{self, AppState};
use yt_transcript_service::{output, Cli, Commands, Config, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    init_tracing(cli.verbose, config.logging.json);
    match Config::config_file() {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config file"),
        None => tracing::debug!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let pipeline = build_pipeline(&config)?;
            server::serve(AppState::new(pipeline), &config.server).await?;
        }
        Commands::Fetch {
            url,
            output,
            format,
        } => {
            let pipeline = build_pipeline(&config)?;

            tracing::info!(%format, "Fetching transcript for URL: {}", url);

            let progress = if cli.quiet {
                ProgressBar::hidden()
            } else {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
                spinner.set_message("Fetching transcript...");
                spinner.enable_steady_tick(Duration::from_millis(100));
                spinner
            };

            let result = pipeline.transcribe_from_url(Some(url.as_str())).await;
            progress.finish_and_clear();
            let result = result?;

            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration is read from the first existing file of:");
                for path in Config::search_paths() {
                    println!("  {}", path.display());
                }
                println!("Environment overrides: {}", Config::ENV_OVERRIDES.join(", "));
                println!("Run `yt-transcript config --show` to print the effective settings.");
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> Result<TranscriptPipeline> {
    let provider = YoutubeProvider::from_config(config)?;
    Ok(TranscriptPipeline::new(
        Arc::new(provider),
        config.transcript.languages.clone(),
    ))
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "yt_transcript_service=debug,yt_transcript=debug,tower_http=debug"
    } else {
        "yt_transcript_service=info,yt_transcript=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

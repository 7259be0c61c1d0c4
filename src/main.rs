use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wijkkaart::publish::{GithubPublisher, Publisher};
use wijkkaart::{config, data, processing, publish, render, server};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the map page and publish it
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Only write the local file
        #[arg(long)]
        no_publish: bool,
    },
    /// Serve the generated page and marker API locally
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config, no_publish } => {
            info!("Generating map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Credentials are resolved up front so a bad setup fails before any work.
            let publisher = match (&app_config.publish, *no_publish) {
                (Some(publish_config), false) => {
                    Some(GithubPublisher::from_config(publish_config)?)
                }
                (Some(_), true) => {
                    info!("Publishing disabled for this run");
                    None
                }
                (None, _) => None,
            };

            // 1. Load rows
            let rows = data::load_rows(&app_config.input.rows_csv, &app_config.input.columns)?;

            // 2. Validate, group, aggregate, build markers
            let build = processing::process_rows(&app_config, &rows);
            if !build.skipped.is_empty() {
                warn!("{} of {} rows left off the map", build.skipped.len(), rows.len());
            }

            // 3. Render and save
            let document = render::render_document(&app_config, &build)
                .context("Failed to serialize marker data")?;
            publish::write_document(&app_config.output.html_path, &document)?;

            // 4. Publish
            if let Some(publisher) = publisher {
                let outcome = publisher.publish(&document)?;
                info!("Published ({}): {}", outcome, document.summary);
            }

            info!("Generation complete! {}", document.summary);
        }
        Commands::Serve { config } => {
            info!("Serving map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let rows = data::load_rows(&app_config.input.rows_csv, &app_config.input.columns)?;
            let build = processing::process_rows(&app_config, &rows);

            server::start_server(app_config, build).await?;
        }
    }

    Ok(())
}

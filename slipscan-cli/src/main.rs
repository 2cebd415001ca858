//! slipscan - terminal client for the SlipScan relay

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use slipscan_cli::client::{load_batch, DEFAULT_RELAY_URL, ENV_RELAY_URL};
use slipscan_cli::output::{json, table};
use slipscan_cli::RelayClient;
use slipscan_common::models::EXPORT_FILENAME;
use slipscan_common::{ExtractionResult, ResultSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "slipscan",
    version,
    about = "Extract transfer receipt data through a SlipScan relay"
)]
struct Cli {
    /// Relay base URL
    #[arg(long, global = true, env = ENV_RELAY_URL, default_value = DEFAULT_RELAY_URL)]
    relay: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 180)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload 1 to 10 receipt images and print the extracted data
    Extract {
        /// Image files (PNG, JPEG, WebP, ...)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,

        /// Also download the spreadsheet to FILE
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
    /// Build the spreadsheet from previously saved JSON results
    Export {
        /// JSON file written by `extract --output json`
        input_file: PathBuf,

        /// Spreadsheet path
        #[arg(short = 'O', long = "out", value_name = "FILE", default_value = EXPORT_FILENAME)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = RelayClient::new(&cli.relay, Duration::from_secs(cli.timeout))
        .context("Invalid relay URL")?;

    match cli.command {
        Commands::Extract {
            images,
            output,
            export,
        } => extract(&client, &images, output, export.as_deref()).await,
        Commands::Export { input_file, out } => export_saved(&client, &input_file, &out).await,
    }
}

async fn extract(
    client: &RelayClient,
    images: &[PathBuf],
    output: OutputFormat,
    export: Option<&Path>,
) -> Result<()> {
    let batch = load_batch(images).await?;
    let results = client.extract(&batch).await?;

    match output {
        OutputFormat::Table => {
            print!("{}", table::render(&results));
            println!();
            println!("{}", table::summary(&results));
        }
        OutputFormat::Json => println!("{}", json::render(&results)?),
    }

    if let Some(path) = export {
        // Results are already printed; an export failure only gets reported
        if let Err(e) = write_export(client, &results, path).await {
            bail!("Export failed: {e:#}");
        }
        eprintln!("Spreadsheet written to {}", path.display());
    }

    Ok(())
}

async fn export_saved(client: &RelayClient, input_file: &Path, out: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(input_file)
        .await
        .with_context(|| format!("Could not read {}", input_file.display()))?;
    let set: ResultSet = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a results file", input_file.display()))?;

    write_export(client, &set.results, out).await?;
    println!("Spreadsheet written to {}", out.display());
    Ok(())
}

async fn write_export(client: &RelayClient, results: &[ExtractionResult], path: &Path) -> Result<()> {
    let bytes = client.export(results).await?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Could not write {}", path.display()))?;
    info!(bytes = bytes.len(), path = %path.display(), "Spreadsheet saved");
    Ok(())
}

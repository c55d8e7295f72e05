use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use esingest::config::Config;
use esingest::elastic::ElasticService;
use esingest::pipeline::{IngestService, resolve_overlays, resolve_single};
use esingest::{embedding, logging};

#[derive(Parser)]
#[command(
    name = "esingest",
    about = "Chunk local documents, embed them, and load them into Elasticsearch"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Ingest each immediate subdirectory of DATA_BASE_DIR into its own index.
    Overlays,
    /// Ingest DOCS_DIR into the single index named by ES_INDEX.
    Single,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_tracing();

    match run(cli.mode.unwrap_or(Mode::Overlays)).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!("Ingestion aborted: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(mode: Mode) -> anyhow::Result<bool> {
    let started = std::time::Instant::now();
    let config = Config::from_env().context("invalid configuration")?;
    let embedder = embedding::build_embedding_client(&config)
        .context("failed to construct embedding client")?;
    let elastic =
        ElasticService::connect(&config).context("failed to construct Elasticsearch client")?;

    match elastic.info().await {
        Ok(info) => tracing::info!(
            cluster = %info.cluster_name,
            version = %info.version.number,
            "Connected to Elasticsearch"
        ),
        Err(error) => {
            tracing::warn!(error = %error, "Could not fetch cluster info; continuing anyway");
        }
    }

    let targets = match mode {
        Mode::Overlays => resolve_overlays(&config.data_base_dir)?,
        Mode::Single => resolve_single(&config)?,
    };

    if targets.is_empty() {
        tracing::info!("No overlay directories found; nothing to ingest");
        return Ok(true);
    }

    let service = IngestService::new(&config, embedder.as_ref(), &elastic)?;
    let summary = service.run(&targets).await;

    tracing::info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        inserted = summary.total_inserted(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Ingestion finished"
    );

    Ok(summary.is_success())
}

//! Fixwidth Worker - fixed-width to CSV ingestion

use anyhow::{Context, Result};
use clap::Parser;
use fixwidth_common::logging::{init_logging, LogConfig, LogLevel};
use fixwidth_worker::api::BackendClient;
use fixwidth_worker::collaborators::ChunkStream;
use fixwidth_worker::config::ConfigOverrides;
use fixwidth_worker::notify::PgNotificationSource;
use fixwidth_worker::schema::IngestionConfig;
use fixwidth_worker::storage::S3OutputStore;
use fixwidth_worker::{
    Dispatcher, IngestionPipeline, JobFailure, JobRunner, Schema, WorkerConfig,
};
use futures::{stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

/// Read size for local input files
const FILE_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Parser, Debug)]
#[command(name = "fixwidth-worker")]
#[command(author, version, about = "Fixed-width to CSV ingestion worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend API base URL
    #[arg(long, global = true, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// PostgreSQL URL used for notifications
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Notification channel to listen on
    #[arg(long, global = true, env = "INGEST_CHANNEL")]
    channel: Option<String>,
}

impl Cli {
    /// Environment settings with command line flags on top
    fn worker_config(&self) -> Result<WorkerConfig> {
        let overrides = ConfigOverrides {
            backend_url: self.backend_url.clone(),
            database_url: self.database_url.clone(),
            channel: self.channel.clone(),
        };

        Ok(WorkerConfig::load()?.with_overrides(overrides)?)
    }
}

#[derive(Parser, Debug)]
enum Command {
    /// Listen for job notifications and process them one at a time
    Listen,

    /// Process a single job by id, then exit
    Run {
        /// Bulk file id
        job_id: String,
    },

    /// Convert a local file with an ingestion config, without the backend
    Convert {
        /// JSON file holding an ingestionConfig object
        #[arg(short, long)]
        schema: PathBuf,

        /// Fixed-width input file
        #[arg(short, long)]
        input: PathBuf,

        /// CSV output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("fixwidth-worker")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    match &cli.command {
        Command::Listen => {
            let config = cli.worker_config()?;
            let runner = job_runner(&config)?;
            let notifications =
                PgNotificationSource::connect(&config.database_url, &config.channel).await?;

            info!(backend = %config.backend_url, channel = %config.channel, "Worker started");

            Dispatcher::new(notifications, runner)
                .with_reconnect_delay(config.reconnect_delay())
                .run()
                .await;
        },
        Command::Run { job_id } => {
            let config = cli.worker_config()?;
            let summary = job_runner(&config)?.run(job_id.trim()).await?;
            println!("{}", serde_json::to_string_pretty(&summary.reported())?);
        },
        Command::Convert {
            schema,
            input,
            output,
        } => {
            let raw = tokio::fs::read_to_string(schema)
                .await
                .with_context(|| format!("Failed to read {}", schema.display()))?;
            let ingestion_config: IngestionConfig = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid ingestion config in {}", schema.display()))?;
            if !ingestion_config.is_fixed_width() {
                return Err(JobFailure::UnsupportedFormat(ingestion_config.format).into());
            }
            let schema = Schema::from_config(&ingestion_config)?;

            let chunks = file_chunks(input).await?;
            let sink = std::fs::File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let summary = IngestionPipeline::new(&schema).run(chunks, sink).await?;

            info!(output = %output.display(), "Conversion written");
            println!("{}", serde_json::to_string_pretty(&summary.reported())?);
        },
    }

    Ok(())
}

fn job_runner(config: &WorkerConfig) -> Result<JobRunner> {
    let backend = Arc::new(BackendClient::new(
        config.backend_url.clone(),
        config.http_timeout(),
    )?);
    let storage = Arc::new(S3OutputStore::new(config.storage.clone()));

    Ok(
        JobRunner::new(backend.clone(), backend.clone(), backend, storage)
            .with_max_line_bytes(config.max_line_bytes),
    )
}

async fn file_chunks(path: &Path) -> Result<ChunkStream> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    Ok(stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; FILE_CHUNK_SIZE];
        let n = file.read(&mut buf).await.context("Failed to read input")?;
        buf.truncate(n);
        anyhow::Ok((n > 0).then_some((buf, file)))
    })
    .boxed())
}

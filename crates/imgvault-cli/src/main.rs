//! imgvault - 画像の取り込み・復元・control-plane の待機
//!
//! ## Usage
//!
//! ```bash
//! # ディレクトリ配下の画像を取り込む
//! IMGVAULT_MONGODB_URI=mongodb://localhost:27017 imgvault ingest ./images
//!
//! # 保存済み画像をファイルに戻す
//! imgvault restore logo.png ./out
//!
//! # cluster が IDLE になるまで待つ
//! imgvault wait https://cloud.example.com/api/atlas/v2/groups/G/clusters cluster-idle --cluster Cluster0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use imgvault_core::app::{IngestPipeline, PollPolicy, Poller, Readiness, restore_image};
use imgvault_core::codec::{CodecConfig, ImageCodec};
use imgvault_core::config::{ControlPlaneConfig, StoreConfig};
use imgvault_core::domain::{PollError, RestoreError, StoreError};
use imgvault_core::impls::{HttpJsonSource, MongoContentStore, TracingEventSink};
use imgvault_core::ports::ContentStore;

#[derive(Parser, Debug)]
#[command(name = "imgvault")]
#[command(version)]
#[command(about = "Store images in a document database and wait on control-plane state", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every image under a directory
    Ingest {
        root: PathBuf,

        /// zlib level (0-9)
        #[arg(long, default_value_t = CodecConfig::default().level)]
        level: u32,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a stored image back to disk
    Restore { name: String, output_dir: PathBuf },

    /// Poll a JSON status endpoint until a condition holds
    Wait {
        url: String,

        #[command(subcommand)]
        condition: Condition,

        /// Seconds between attempts
        #[arg(long, global = true, default_value_t = 10)]
        interval: u64,

        #[arg(long, global = true)]
        max_attempts: Option<u32>,

        /// Give up after this many seconds
        #[arg(long, global = true)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum Condition {
    /// A cluster in `results[]` reports stateName IDLE
    ClusterIdle {
        #[arg(long)]
        cluster: String,
    },
    /// The first online archive is ACTIVE
    ArchiveActive,
    /// The first online archive finished a run
    ArchiveRunComplete,
    /// The value at a JSON pointer equals the given value
    Field {
        #[arg(long)]
        pointer: String,

        /// JSON literal; plain text is compared as a string
        #[arg(long)]
        equals: String,
    },
}

impl From<Condition> for Readiness {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::ClusterIdle { cluster } => Readiness::cluster_idle(cluster),
            Condition::ArchiveActive => Readiness::archive_active(),
            Condition::ArchiveRunComplete => Readiness::ArchiveRunCompleted,
            Condition::Field { pointer, equals } => Readiness::FieldEquals {
                pointer,
                expected: serde_json::from_str(&equals)
                    .unwrap_or(serde_json::Value::String(equals)),
            },
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Ingest { root, level, json } => ingest(root, level, json).await,
        Command::Restore { name, output_dir } => restore(name, output_dir).await,
        Command::Wait {
            url,
            condition,
            interval,
            max_attempts,
            timeout,
        } => {
            let mut policy = PollPolicy::every(Duration::from_secs(interval));
            if let Some(n) = max_attempts {
                policy = policy.with_max_attempts(n);
            }
            if let Some(secs) = timeout {
                policy = policy.with_deadline(Duration::from_secs(secs));
            }
            wait(url, condition.into(), policy).await
        }
    }
}

async fn connect_store() -> anyhow::Result<Arc<dyn ContentStore>> {
    let config = StoreConfig::from_env()?;
    let store = MongoContentStore::connect(&config)
        .await
        .context("connecting to the content store")?;
    store.initialize().await.context("creating the name index")?;
    Ok(Arc::new(store))
}

async fn ingest(root: PathBuf, level: u32, json: bool) -> anyhow::Result<ExitCode> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let store = connect_store().await?;
    let pipeline = IngestPipeline::new(store, ImageCodec::new(CodecConfig { level }))
        .with_events(Arc::new(TracingEventSink));

    let report = pipeline.run(&root).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "run {}: {} stored, {} already present, {} failed",
            report.run_id,
            report.stored.len(),
            report.already_present.len(),
            report.failures.len()
        );
        for failure in &report.failures {
            let path = failure
                .path
                .as_ref()
                .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
            println!("  failed {path}: {}", failure.reason);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn restore(name: String, output_dir: PathBuf) -> anyhow::Result<ExitCode> {
    let store = connect_store().await?;
    match restore_image(store.as_ref(), &ImageCodec::default(), &name, &output_dir).await {
        Ok(path) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(RestoreError::Store(StoreError::NotFound(_))) => {
            warn!(image = %name, "no stored image with this name");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn wait(url: String, readiness: Readiness, policy: PollPolicy) -> anyhow::Result<ExitCode> {
    let source = HttpJsonSource::new(url, &ControlPlaneConfig::from_env())?;

    // Ctrl-C でポーリングを止める
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        } else {
            // シグナルを待てない環境では sender を保持し続ける（drop はキャンセル扱い）
            std::future::pending::<()>().await;
        }
    });

    info!(url = source.url(), condition = %readiness.describe(), "waiting");
    let poller = Poller::new(policy)
        .with_events(Arc::new(TracingEventSink))
        .with_cancellation(cancel_rx);

    match poller.until(&source, |doc| readiness.is_ready(doc)).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.state)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ PollError::Cancelled { .. }) => {
            warn!(error = %e, "stopped waiting");
            Ok(ExitCode::from(130))
        }
        Err(e) => {
            warn!(error = %e, attempts = e.attempts(), "condition not reached");
            Ok(ExitCode::FAILURE)
        }
    }
}

//! HeartMuLa worker daemon — Unix socket, line-delimited JSON.
//!
//! Keeps the pipeline resident across jobs. Each client connection sends one
//! JSON job line and receives one JSON response line, then closes.
//!
//! # Socket path
//!
//! Default: `/tmp/heartmula-worker.sock`. Override with `--socket`.
//!
//! # Protocol
//!
//! **Job** (one JSON line):
//! ```json
//! {
//!   "id": "job-1",
//!   "input": {
//!     "lyrics": "la la la",
//!     "tags": "piano, happy, pop",
//!     "duration_ms": 120000,    // optional, default 120s
//!     "temperature": 1.0,       // optional
//!     "topk": 50,               // optional
//!     "cfg_scale": 1.5          // optional
//!   }
//! }
//! ```
//!
//! **Response on success** (one JSON line):
//! ```json
//! {"status": "success", "audio_base64": "...", "duration_ms": 120000,
//!  "inference_time_sec": 45.2, "file_size_mb": 1.8}
//! ```
//!
//! **Response on error** (one JSON line):
//! ```json
//! {"status": "error", "message": "lyrics is required"}
//! ```
//!
//! # Environment
//!
//! `CHECKPOINTS_PATH`, `MAX_DURATION_MS`, `JOB_TIMEOUT_SEC` (advisory only).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use heartmula_worker::{
    config::WorkerConfig,
    handler::Worker,
    job::{Job, Response},
    pipeline::{CheckpointedLoader, PipelineLoader, ToneLoader},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "heartmula-worker",
    about = "HeartMuLa worker daemon — resident pipeline, Unix socket JSON interface"
)]
struct Args {
    /// Unix socket path to listen on.
    #[arg(long, default_value = "/tmp/heartmula-worker.sock")]
    socket: PathBuf,

    /// Ensure model checkpoints are on the volume before constructing the
    /// engine (downloads on a cold volume; requires network access).
    #[arg(long, default_value_t = false)]
    fetch_checkpoints: bool,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = WorkerConfig::from_env();

    tracing::info!(checkpoints_path = %config.checkpoints_path.display(), "starting worker");
    tracing::info!(
        max_duration_ms = config.max_duration_ms,
        job_timeout_sec = config.job_timeout_sec,
        "limits (timeout is advisory, enforced by the hosting runtime)"
    );

    // Remove stale socket file if present.
    if args.socket.exists() {
        std::fs::remove_file(&args.socket)?;
    }

    // Bind the socket immediately so callers can connect right away.
    // Jobs that arrive before preload completes pay the load on first handle.
    let listener = UnixListener::bind(&args.socket)?;
    tracing::info!("listening on {:?} (loading pipeline...)", args.socket);

    let loader: Box<dyn PipelineLoader> = if args.fetch_checkpoints {
        Box::new(CheckpointedLoader::new(config.clone(), ToneLoader))
    } else {
        Box::new(ToneLoader)
    };
    let worker = Arc::new(Worker::new(config, loader));

    // Preload the model; a failed preload is not fatal — the first job retries.
    let preload_worker = Arc::clone(&worker);
    match tokio::task::spawn_blocking(move || preload_worker.preload()).await {
        Ok(Ok(())) => tracing::info!("pipeline ready"),
        Ok(Err(error)) => {
            tracing::warn!(%error, "preload failed, will retry on first job");
        }
        Err(join_error) => {
            tracing::warn!(%join_error, "preload task panicked, will retry on first job");
        }
    }

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let worker = Arc::clone(&worker);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, worker).await {
                        tracing::warn!("connection error: {e}");
                    }
                });
            }
            Err(e) => {
                tracing::error!("accept error: {e}");
            }
        }
    }
}

// ── Connection handler ────────────────────────────────────────────────────────

async fn handle_connection(stream: UnixStream, worker: Arc<Worker>) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Read exactly one line (the JSON job).
    let line = match lines.next_line().await? {
        Some(l) if !l.trim().is_empty() => l,
        _ => {
            send_response(&mut writer, Response::err("empty request")).await?;
            return Ok(());
        }
    };

    let response = process_job(&line, worker).await;
    send_response(&mut writer, response).await?;
    Ok(())
}

async fn process_job(line: &str, worker: Arc<Worker>) -> Response {
    let job: Job = match serde_json::from_str(line) {
        Ok(job) => job,
        Err(e) => return Response::err(format!("invalid JSON job: {e}")),
    };

    // The handler is synchronous and may block for the full generation.
    match tokio::task::spawn_blocking(move || worker.handle(&job)).await {
        Ok(response) => response,
        Err(join_error) => Response::err(format!("worker task panicked: {join_error}")),
    }
}

async fn send_response(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    response: Response,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(&response)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    Ok(())
}

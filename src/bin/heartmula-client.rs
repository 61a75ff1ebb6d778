//! Command-line client for the HeartMuLa worker daemon.
//!
//! Connects to the Unix socket, sends one JSON job, waits for the response,
//! decodes the returned audio to a file, and exits 0 on success or 1 on error.
//!
//! # Usage
//!
//! ```sh
//! heartmula-client \
//!   --lyrics "la la la" \
//!   --tags "piano, happy, pop" \
//!   --output /tmp/song.wav \
//!   --duration-ms 60000
//! ```

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use heartmula_worker::job::{Job, Response};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    time::timeout,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "heartmula-client", about = "Send one job to the HeartMuLa worker")]
struct Args {
    /// Lyrics text (required, non-empty)
    #[arg(long)]
    lyrics: String,

    /// Style tags, e.g. "piano, happy, pop" (required, non-empty)
    #[arg(long)]
    tags: String,

    /// Output file for the decoded audio
    #[arg(long)]
    output: PathBuf,

    /// Requested duration in milliseconds (default: 120000)
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Sampling temperature (default: 1.0)
    #[arg(long)]
    temperature: Option<f64>,

    /// Top-k sampling cutoff (default: 50)
    #[arg(long)]
    topk: Option<u32>,

    /// Classifier-free guidance scale (default: 1.5)
    #[arg(long)]
    cfg_scale: Option<f64>,

    /// Socket path (default: /tmp/heartmula-worker.sock)
    #[arg(long, default_value = "/tmp/heartmula-worker.sock")]
    socket: PathBuf,

    /// Seconds to wait for generation (default: 300)
    #[arg(long, default_value = "300")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut input = serde_json::Map::new();
    input.insert("lyrics".into(), args.lyrics.into());
    input.insert("tags".into(), args.tags.into());
    if let Some(duration_ms) = args.duration_ms {
        input.insert("duration_ms".into(), duration_ms.into());
    }
    if let Some(temperature) = args.temperature {
        input.insert("temperature".into(), temperature.into());
    }
    if let Some(topk) = args.topk {
        input.insert("topk".into(), topk.into());
    }
    if let Some(cfg_scale) = args.cfg_scale {
        input.insert("cfg_scale".into(), cfg_scale.into());
    }

    let job = Job {
        id: Uuid::new_v4().to_string(),
        input: serde_json::Value::Object(input),
    };
    let job_line = serde_json::to_string(&job)? + "\n";

    let stream = timeout(Duration::from_secs(10), UnixStream::connect(&args.socket))
        .await
        .context("timed out connecting to worker socket")?
        .with_context(|| format!("failed to connect to {}", args.socket.display()))?;

    let (reader, mut writer) = stream.into_split();

    writer
        .write_all(job_line.as_bytes())
        .await
        .context("failed to send job")?;
    writer.flush().await?;
    // Signal EOF so the daemon knows we're done writing.
    drop(writer);

    let mut reader = BufReader::new(reader);
    let mut response_line = String::new();

    timeout(
        Duration::from_secs(args.timeout_secs),
        reader.read_line(&mut response_line),
    )
    .await
    .context("timed out waiting for worker response")?
    .context("failed to read response")?;

    if response_line.is_empty() {
        bail!("worker closed connection without sending a response");
    }

    let response: Response =
        serde_json::from_str(response_line.trim()).context("failed to parse worker response")?;

    match response {
        Response::Success {
            audio_base64,
            duration_ms,
            inference_time_sec,
            file_size_mb,
        } => {
            let audio_bytes = BASE64
                .decode(audio_base64)
                .context("worker sent invalid base64 audio")?;
            std::fs::write(&args.output, audio_bytes)
                .with_context(|| format!("failed to write {}", args.output.display()))?;
            eprintln!(
                "generated {duration_ms}ms of audio in {inference_time_sec}s ({file_size_mb}MB) → {}",
                args.output.display()
            );
            println!("{}", args.output.display());
            Ok(())
        }
        Response::Error { message } => {
            bail!("generation failed: {message}");
        }
    }
}

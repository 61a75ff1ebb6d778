//! The request handler.
//!
//! One job in, one response out, synchronous, no streaming. Every failure is
//! converted into a structured error response at this boundary; nothing
//! propagates to the hosting runtime.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use uuid::Uuid;

use crate::cache::ModelCache;
use crate::config::WorkerConfig;
use crate::job::{Job, Response};
use crate::params::GenerationParams;
use crate::pipeline::{Pipeline, PipelineLoader};
use crate::{Error, Result};

/// The worker: configuration, the model cache, and the loader that fills it.
pub struct Worker {
    config: WorkerConfig,
    cache: ModelCache,
    loader: Box<dyn PipelineLoader>,
}

impl Worker {
    pub fn new(config: WorkerConfig, loader: Box<dyn PipelineLoader>) -> Self {
        Self {
            config,
            cache: ModelCache::new(),
            loader,
        }
    }

    /// Warm the model cache ahead of the first job.
    ///
    /// Cold-start cost is paid here when called at process start; per-job
    /// `ensure_loaded` calls then reduce to a cheap no-op.
    pub fn preload(&self) -> Result<()> {
        self.cache.ensure_loaded(self.loader.as_ref()).map(|_| ())
    }

    /// Handle one job. Never returns an error — failures become
    /// `{status: "error", message}` payloads.
    pub fn handle(&self, job: &Job) -> Response {
        let params = match GenerationParams::from_input(&job.input, &self.config) {
            Ok(params) => params,
            // Validation failures short-circuit before any model work.
            Err(Error::Validation(message)) => {
                tracing::warn!(job = %job.id, %message, "job rejected");
                return Response::err(message);
            }
            Err(error) => {
                tracing::warn!(job = %job.id, %error, "job rejected");
                return Response::err(error.to_string());
            }
        };

        tracing::info!(
            job = %job.id,
            lyrics_chars = params.lyrics.len(),
            tags = %params.tags,
            duration_ms = params.max_audio_length_ms,
            "handling job"
        );

        let pipeline = match self.cache.ensure_loaded(self.loader.as_ref()) {
            Ok(pipeline) => pipeline,
            Err(error) => {
                tracing::error!(job = %job.id, %error, "model load failed");
                return Response::err(format!("Model load failed: {error}"));
            }
        };

        match generate(&job.id, pipeline.as_ref(), &params) {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(job = %job.id, %error, "generation failed");
                Response::err(format!("Generation failed: {error}"))
            }
        }
    }
}

/// Run the pipeline into a temp artifact, read it back, encode, clean up.
fn generate(job_id: &str, pipeline: &dyn Pipeline, params: &GenerationParams) -> Result<Response> {
    // The artifact is removed when the guard drops — on the error path too.
    let artifact = TempArtifact::new(pipeline.output_extension());

    let started = Instant::now();
    pipeline.generate(params, artifact.path())?;
    let inference_time = started.elapsed().as_secs_f64();

    let audio_bytes = fs::read(artifact.path())?;
    drop(artifact);

    let file_size_mb = audio_bytes.len() as f64 / (1024.0 * 1024.0);
    tracing::info!(
        job = %job_id,
        inference_s = inference_time,
        size_mb = file_size_mb,
        "generated"
    );

    Ok(Response::Success {
        audio_base64: BASE64.encode(&audio_bytes),
        duration_ms: params.max_audio_length_ms,
        inference_time_sec: round_to(inference_time, 10.0),
        file_size_mb: round_to(file_size_mb, 100.0),
    })
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

/// Uniquely named temp file, removed on drop.
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(extension: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{}.{extension}", Uuid::new_v4().simple()));
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %error, "temp artifact not removed");
            }
        }
    }
}

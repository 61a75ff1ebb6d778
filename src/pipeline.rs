//! The generation pipeline seam.
//!
//! The model itself is an external collaborator: the worker only knows the
//! call contract. [`Pipeline`] is the per-request surface (generate into a
//! file), [`PipelineLoader`] is the cold-start surface (construct once,
//! expensive). The HeartMuLa engine binding implements both downstream;
//! [`TonePipeline`] is the in-tree placeholder used for smoke runs.

use std::path::Path;
use std::sync::Arc;

use crate::audio;
use crate::config::WorkerConfig;
use crate::params::GenerationParams;
use crate::Result;

/// Fixed model version the worker is built against.
pub const MODEL_VERSION: &str = "3B";

/// A loaded generation pipeline.
///
/// `generate` writes the audio artifact to `save_path` as a side effect and
/// returns nothing else; the handler reads the file back.
pub trait Pipeline: Send + Sync {
    fn generate(&self, params: &GenerationParams, save_path: &Path) -> Result<()>;

    /// File extension of the artifact this engine writes.
    fn output_extension(&self) -> &'static str {
        "wav"
    }
}

/// Constructs a pipeline once per process.
///
/// Expected to be expensive (tens of seconds for the real engine); the
/// [`crate::cache::ModelCache`] guarantees it runs at most once.
pub trait PipelineLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Pipeline>>;
}

/// Placeholder engine: renders a deterministic test tone of the requested
/// duration. Lets the whole job lifecycle run without the model weights.
pub struct TonePipeline {
    sample_rate: u32,
}

impl TonePipeline {
    pub fn new() -> Self {
        Self {
            sample_rate: 16_000,
        }
    }
}

impl Default for TonePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline for TonePipeline {
    fn generate(&self, params: &GenerationParams, save_path: &Path) -> Result<()> {
        let samples = audio::render_tone(params.max_audio_length_ms, self.sample_rate);
        audio::write_wav(save_path, &samples, self.sample_rate)
    }
}

/// Loader for the placeholder engine.
pub struct ToneLoader;

impl PipelineLoader for ToneLoader {
    fn load(&self) -> Result<Arc<dyn Pipeline>> {
        tracing::info!(version = MODEL_VERSION, engine = "tone", "constructing pipeline");
        Ok(Arc::new(TonePipeline::new()))
    }
}

/// Decorates a loader with the checkpoint-presence gate: the marker check
/// (and the download on a cold volume) runs before the inner construction.
pub struct CheckpointedLoader<L> {
    config: WorkerConfig,
    inner: L,
}

impl<L: PipelineLoader> CheckpointedLoader<L> {
    pub fn new(config: WorkerConfig, inner: L) -> Self {
        Self { config, inner }
    }
}

impl<L: PipelineLoader> PipelineLoader for CheckpointedLoader<L> {
    fn load(&self) -> Result<Arc<dyn Pipeline>> {
        crate::checkpoints::ensure_checkpoints(&self.config)?;
        self.inner.load()
    }
}

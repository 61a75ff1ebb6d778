//! Serverless worker for HeartMuLa music generation.
//!
//! Strictly orchestration: validate a job, lazily load the generation
//! pipeline once per process, invoke it, and package the resulting audio as a
//! base64 response. The generation engine itself is an external collaborator
//! reached through the [`pipeline::Pipeline`] trait.
//!
//! ## Request lifecycle
//!
//! ```text
//! Job ──▶ validate + normalize (params)
//!     ──▶ ensure pipeline loaded (cache, cold start pays checkpoints + load)
//!     ──▶ generate into a uuid-named temp file
//!     ──▶ read, base64-encode, delete temp file
//!     ──▶ {status: "success", audio_base64, ...} | {status: "error", message}
//! ```
//!
//! ## Modules
//!
//! - [`config`] — process configuration, read once from the environment
//! - [`job`] — job envelope and response wire types
//! - [`params`] — input validation, forgiving numeric parsing, clamping
//! - [`checkpoints`] — checkpoint-volume population with a completion marker
//! - [`pipeline`] — the engine seam (traits + placeholder tone engine)
//! - [`cache`] — process-wide one-time pipeline load
//! - [`handler`] — the request handler
//! - [`audio`] — WAV output for the placeholder engine

pub mod audio;
pub mod cache;
pub mod checkpoints;
pub mod config;
pub mod handler;
pub mod job;
pub mod params;
pub mod pipeline;

mod error;

pub use error::{Error, Result};

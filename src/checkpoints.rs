//! Checkpoint-volume population.
//!
//! The checkpoint root lives on a network volume that persists across worker
//! restarts. A marker file written after all downloads succeed is the sole
//! signal that later cold starts may skip fetching.

use std::fs;
use std::path::Path;
use std::time::Instant;

use hf_hub::api::sync::Api;

use crate::config::WorkerConfig;
use crate::Result;

/// Marker file name under the checkpoint root.
pub const DOWNLOAD_MARKER: &str = ".download_complete";

/// One artifact set fetched onto the volume.
struct CheckpointSet {
    repo_id: &'static str,
    /// Subdirectory under the checkpoint root; `None` = the root itself.
    subdir: Option<&'static str>,
}

const CHECKPOINT_SETS: &[CheckpointSet] = &[
    CheckpointSet {
        repo_id: "HeartMuLa/HeartMuLaGen",
        subdir: None,
    },
    CheckpointSet {
        repo_id: "HeartMuLa/HeartMuLa-oss-3B-happy-new-year",
        subdir: Some("HeartMuLa-oss-3B"),
    },
    CheckpointSet {
        repo_id: "HeartMuLa/HeartCodec-oss-20260123",
        subdir: Some("HeartCodec-oss"),
    },
];

/// Download checkpoints to the volume if not already present.
///
/// The marker is written only after every artifact set downloaded, so a
/// partially fetched volume is re-fetched on the next cold start.
pub fn ensure_checkpoints(config: &WorkerConfig) -> Result<()> {
    let root = &config.checkpoints_path;
    let marker = root.join(DOWNLOAD_MARKER);
    if marker.exists() {
        tracing::info!("checkpoints already on volume (marker found)");
        return Ok(());
    }

    tracing::info!(root = %root.display(), "checkpoints not found, downloading");
    fs::create_dir_all(root)?;

    let api = Api::new()?;
    for set in CHECKPOINT_SETS {
        let dest = match set.subdir {
            Some(subdir) => root.join(subdir),
            None => root.clone(),
        };
        tracing::info!(repo = set.repo_id, dest = %dest.display(), "downloading");
        let started = Instant::now();
        download_repo(&api, set.repo_id, &dest)?;
        tracing::info!(
            repo = set.repo_id,
            elapsed_s = started.elapsed().as_secs(),
            "downloaded"
        );
    }

    fs::write(&marker, b"")?;
    tracing::info!("all checkpoints downloaded");
    Ok(())
}

/// Fetch every file of a Hub repo into `dest`, preserving relative paths.
///
/// Files already present on the volume are skipped, so an interrupted fetch
/// resumes where it stopped. Files land under their final name only via
/// [`place_file`], so an existing target is always a complete copy.
fn download_repo(api: &Api, repo_id: &str, dest: &Path) -> Result<()> {
    let repo = api.model(repo_id.to_string());
    let info = repo.info()?;
    for sibling in &info.siblings {
        let target = dest.join(&sibling.rfilename);
        if target.exists() {
            continue;
        }
        let cached = repo.get(&sibling.rfilename)?;
        place_file(&cached, &target)?;
    }
    Ok(())
}

/// Copy `source` to `target` via a `.part` staging name and an atomic rename.
///
/// A process dying mid-copy leaves only the staging file behind, never a
/// truncated `target`, so the resume check in [`download_repo`] cannot accept
/// a partial copy as complete. A stale `.part` from an earlier crash is
/// simply overwritten.
fn place_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut staged = target.as_os_str().to_owned();
    staged.push(".part");
    let staged = std::path::PathBuf::from(staged);

    fs::copy(source, &staged)?;
    fs::rename(&staged, target)?;
    Ok(())
}

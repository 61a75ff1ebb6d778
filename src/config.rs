//! Worker configuration.
//!
//! Read once from the environment at process start and passed by reference —
//! no ad-hoc `env::var` calls inside request handling.

use std::path::PathBuf;

/// Default checkpoint root on the network volume.
pub const DEFAULT_CHECKPOINTS_PATH: &str = "/runpod-volume/checkpoints";

/// Default upper clamp for requested audio duration (4 minutes).
pub const DEFAULT_MAX_DURATION_MS: u64 = 240_000;

/// Default advisory job timeout (5 minutes). Not enforced inside the worker.
pub const DEFAULT_JOB_TIMEOUT_SEC: u64 = 300;

/// Process-wide configuration for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Filesystem root holding model weights and the download marker.
    pub checkpoints_path: PathBuf,

    /// Upper clamp bound for `duration_ms` in job input.
    pub max_duration_ms: u64,

    /// Advisory timeout communicated to the hosting runtime. The worker itself
    /// never cancels a running generation.
    pub job_timeout_sec: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            checkpoints_path: PathBuf::from(DEFAULT_CHECKPOINTS_PATH),
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            job_timeout_sec: DEFAULT_JOB_TIMEOUT_SEC,
        }
    }
}

impl WorkerConfig {
    /// Build the configuration from process environment variables:
    /// `CHECKPOINTS_PATH`, `MAX_DURATION_MS`, `JOB_TIMEOUT_SEC`.
    ///
    /// Unset or unparseable values fall back to the documented defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let checkpoints_path = lookup("CHECKPOINTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINTS_PATH));

        let max_duration_ms = lookup("MAX_DURATION_MS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_DURATION_MS);

        let job_timeout_sec = lookup("JOB_TIMEOUT_SEC")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_JOB_TIMEOUT_SEC);

        Self {
            checkpoints_path,
            max_duration_ms,
            job_timeout_sec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = WorkerConfig::from_lookup(|_| None);
        assert_eq!(
            config.checkpoints_path,
            PathBuf::from(DEFAULT_CHECKPOINTS_PATH)
        );
        assert_eq!(config.max_duration_ms, DEFAULT_MAX_DURATION_MS);
        assert_eq!(config.job_timeout_sec, DEFAULT_JOB_TIMEOUT_SEC);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = WorkerConfig::from_lookup(lookup_from(&[
            ("CHECKPOINTS_PATH", "/mnt/weights"),
            ("MAX_DURATION_MS", "60000"),
            ("JOB_TIMEOUT_SEC", "120"),
        ]));
        assert_eq!(config.checkpoints_path, PathBuf::from("/mnt/weights"));
        assert_eq!(config.max_duration_ms, 60_000);
        assert_eq!(config.job_timeout_sec, 120);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = WorkerConfig::from_lookup(lookup_from(&[
            ("MAX_DURATION_MS", "four minutes"),
            ("JOB_TIMEOUT_SEC", ""),
        ]));
        assert_eq!(config.max_duration_ms, DEFAULT_MAX_DURATION_MS);
        assert_eq!(config.job_timeout_sec, DEFAULT_JOB_TIMEOUT_SEC);
    }
}

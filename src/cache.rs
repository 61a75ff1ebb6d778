//! Process-wide model cache.
//!
//! Holds at most one loaded pipeline per process, populated lazily on first
//! use and never evicted. Replaces an implicit global with an explicitly
//! owned, mutex-guarded slot: concurrent first calls serialize on the lock,
//! the winner loads, late-comers block and then reuse its instance.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::pipeline::{Pipeline, PipelineLoader};
use crate::Result;

/// One-time-initialized pipeline slot.
pub struct ModelCache {
    slot: Mutex<Option<Arc<dyn Pipeline>>>,
}

impl ModelCache {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached pipeline, loading it via `loader` on first call.
    ///
    /// Idempotent: a second call is a cheap clone of the cached handle. A
    /// failed load leaves the slot empty so the next call retries. The first
    /// successful call blocks for the full load duration; callers should
    /// ideally trigger it once at process start before serving.
    pub fn ensure_loaded(&self, loader: &dyn PipelineLoader) -> Result<Arc<dyn Pipeline>> {
        // A poisoned lock only means a previous loader panicked before the
        // slot was written; the slot itself is still consistent.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(pipeline) = slot.as_ref() {
            tracing::debug!("pipeline already loaded, reusing");
            return Ok(Arc::clone(pipeline));
        }

        tracing::info!("loading pipeline (cold start)");
        let started = Instant::now();
        let pipeline = loader.load()?;
        tracing::info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            "pipeline loaded"
        );

        *slot = Some(Arc::clone(&pipeline));
        Ok(pipeline)
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::Error;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopPipeline;

    impl Pipeline for NoopPipeline {
        fn generate(&self, _params: &GenerationParams, _save_path: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl CountingLoader {
        fn new() -> Self {
            Self {
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl PipelineLoader for CountingLoader {
        fn load(&self) -> Result<Arc<dyn Pipeline>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NoopPipeline))
        }
    }

    struct FailingLoader;

    impl PipelineLoader for FailingLoader {
        fn load(&self) -> Result<Arc<dyn Pipeline>> {
            Err(Error::ModelLoad("weights corrupted".into()))
        }
    }

    #[test]
    fn test_second_call_reuses_instance() {
        let cache = ModelCache::new();
        let loader = CountingLoader::new();

        let first = cache.ensure_loaded(&loader).unwrap();
        let second = cache.ensure_loaded(&loader).unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_load_leaves_cache_empty_for_retry() {
        let cache = ModelCache::new();

        let err = cache.ensure_loaded(&FailingLoader).map(|_| ()).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
        assert!(!cache.is_loaded());

        // The next call retries and succeeds.
        let loader = CountingLoader::new();
        cache.ensure_loaded(&loader).unwrap();
        assert!(cache.is_loaded());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_calls_load_once() {
        let cache = Arc::new(ModelCache::new());
        let loader = Arc::new(CountingLoader::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loader = Arc::clone(&loader);
                std::thread::spawn(move || cache.ensure_loaded(loader.as_ref()).map(|_| ()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }
}

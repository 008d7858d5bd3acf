// src/engine/scheduler.rs
//
// Execution scheduler: runs the transform engine inline or on a worker pool.
//
// Buffer hand-off:
// - submission: the input is moved or copied into an Arc<[u8]> owned by the
//   job, so the caller may drop or reuse its buffer immediately;
// - completion: the encoded Vec moves into the one-shot slot and from there
//   to the caller; the worker keeps nothing.
//
// Options are resolved on the calling thread in both paths, so validation
// errors are returned directly and never through a Deferred.

use crate::config::EngineConfig;
use crate::engine::codec::{ImageCodec, NativeCodec};
use crate::engine::common::run_with_panic_policy;
use crate::engine::deferred::{self, Deferred};
use crate::engine::options::resolve;
use crate::engine::pool::build_pool;
use crate::engine::transform::Transformer;
use crate::error::Result;
use crate::ops::TransformRequest;
use parking_lot::Mutex;
use rayon::ThreadPool;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub struct Scheduler {
    transformer: Arc<Transformer>,
    pool: ThreadPool,
}

impl Scheduler {
    pub fn new(codec: Arc<dyn ImageCodec>, config: EngineConfig) -> Result<Self> {
        Self::from_transformer(Arc::new(Transformer::new(codec, config)))
    }

    /// Build a pool sized from the transformer's config around an existing
    /// transformer.
    pub fn from_transformer(transformer: Arc<Transformer>) -> Result<Self> {
        let config = transformer.config();
        let pool = build_pool(config.worker_threads)?;
        tracing::debug!(
            target: "cimgres::scheduler",
            workers = pool.current_num_threads(),
            default_quality = config.default_quality,
            max_input_bytes = ?config.max_input_bytes,
            "scheduler ready"
        );
        Ok(Self { transformer, pool })
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::new(Arc::new(NativeCodec), config)
    }

    pub fn transformer(&self) -> &Arc<Transformer> {
        &self.transformer
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Resolve and transform on the calling thread.
    pub fn run_sync(&self, input: &[u8], options: &Value) -> Result<Vec<u8>> {
        let request = resolve(options)?;
        self.transformer.transform(input, &request)
    }

    /// Resolve on the calling thread, then transform on a worker.
    pub fn submit(&self, input: impl Into<Arc<[u8]>>, options: &Value) -> Result<Deferred> {
        let request = resolve(options)?;
        Ok(self.submit_request(input.into(), request))
    }

    /// Queue an already resolved request.
    pub fn submit_request(&self, input: Arc<[u8]>, request: TransformRequest) -> Deferred {
        let (completer, deferred) = deferred::channel();
        let transformer = Arc::clone(&self.transformer);
        tracing::debug!(
            target: "cimgres::scheduler",
            transform = request.transform.name(),
            bytes_in = input.len(),
            "request queued"
        );
        self.pool.spawn(move || {
            completer.start();
            let result = run_with_panic_policy("transform", || {
                transformer.transform(&input, &request)
            });
            if let Err(err) = &result {
                tracing::debug!(
                    target: "cimgres::scheduler",
                    category = err.category().as_str(),
                    error = %err,
                    "request failed"
                );
            }
            // Input is released before the caller is woken
            drop(input);
            completer.complete(result);
        });
        deferred
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("transformer", &self.transformer)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

static TRANSFORMER: OnceLock<Arc<Transformer>> = OnceLock::new();
static SCHEDULER: OnceLock<Scheduler> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Process-wide transformer, configured from the environment.
///
/// Building it starts no threads; paths that run on the caller's thread or
/// on libuv use it without paying for the worker pool.
pub fn shared_transformer() -> Result<&'static Arc<Transformer>> {
    if let Some(transformer) = TRANSFORMER.get() {
        return Ok(transformer);
    }
    let _guard = INIT_LOCK.lock();
    if let Some(transformer) = TRANSFORMER.get() {
        return Ok(transformer);
    }
    let config = EngineConfig::from_env()?;
    Ok(TRANSFORMER.get_or_init(|| Arc::new(Transformer::native(config))))
}

/// Initialize the process-wide scheduler from the environment.
///
/// Idempotent: the first successful call builds the worker pool, later calls
/// return the same instance. A failed call leaves nothing behind, so it can
/// be retried after fixing the configuration.
pub fn init() -> Result<&'static Scheduler> {
    if let Some(scheduler) = SCHEDULER.get() {
        return Ok(scheduler);
    }
    // Taken before INIT_LOCK, which shared_transformer also locks
    let transformer = Arc::clone(shared_transformer()?);
    let _guard = INIT_LOCK.lock();
    if let Some(scheduler) = SCHEDULER.get() {
        return Ok(scheduler);
    }
    let scheduler = Scheduler::from_transformer(transformer)?;
    Ok(SCHEDULER.get_or_init(|| scheduler))
}

/// Synchronous resize with the process-wide transformer. Starts no workers.
pub fn resize_sync(input: &[u8], options: &Value) -> Result<Vec<u8>> {
    let request = resolve(options)?;
    shared_transformer()?.transform(input, &request)
}

/// Asynchronous resize through the process-wide scheduler.
pub fn resize(input: impl Into<Arc<[u8]>>, options: &Value) -> Result<Deferred> {
    init()?.submit(input, options)
}

// src/engine/pool.rs
//
// Worker pool for the asynchronous path.
//
// Each Scheduler owns one rayon pool, sized from EngineConfig (CIMGRES_THREADS,
// else available parallelism minus the libuv reservation). Jobs are spawned
// one per request; a request never fans out inside the pool.

use crate::config::MIN_WORKER_THREADS;
use crate::error::{CimgresError, Result};
use rayon::ThreadPool;

pub(crate) fn build_pool(threads: usize) -> Result<ThreadPool> {
    let threads = threads.max(MIN_WORKER_THREADS);
    match builder(threads).build() {
        Ok(pool) => Ok(pool),
        Err(e) if threads > MIN_WORKER_THREADS => {
            // Fallback: a minimal pool beats refusing every async request
            tracing::warn!(
                target: "cimgres::scheduler",
                threads,
                error = %e,
                "failed to build worker pool, retrying with a single thread"
            );
            builder(MIN_WORKER_THREADS).build().map_err(|fallback| {
                CimgresError::config(
                    "CIMGRES_THREADS",
                    format!(
                        "failed to build worker pool with {threads} threads ({e}) \
                         or {MIN_WORKER_THREADS} thread ({fallback})"
                    ),
                )
            })
        }
        Err(e) => Err(CimgresError::config(
            "CIMGRES_THREADS",
            format!("failed to build worker pool with {threads} thread: {e}"),
        )),
    }
}

fn builder(threads: usize) -> rayon::ThreadPoolBuilder {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("cimgres-worker-{index}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_uses_requested_size() {
        let pool = build_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }

    #[test]
    fn test_zero_threads_is_clamped() {
        let pool = build_pool(0).unwrap();
        assert_eq!(pool.current_num_threads(), 1);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = build_pool(1).unwrap();
        let name = pool.install(|| std::thread::current().name().map(str::to_owned));
        assert_eq!(name.as_deref(), Some("cimgres-worker-0"));
    }
}

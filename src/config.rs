// src/config.rs
//
// Engine configuration, read once at startup.
//
// Environment variables:
// - CIMGRES_THREADS: worker pool size (overrides detection)
// - CIMGRES_DEFAULT_QUALITY: lossy quality used when a request has none (1-100)
// - CIMGRES_MAX_INPUT_BYTES: reject larger inputs before decoding (0 = no limit)
// - UV_THREADPOOL_SIZE: libuv threads reserved when sizing the pool (Node.js default 4)

use crate::error::{CimgresError, Result};

/// Default libuv thread pool size (Node.js default)
const DEFAULT_LIBUV_THREADPOOL_SIZE: usize = 4;

/// Minimum number of worker threads
pub(crate) const MIN_WORKER_THREADS: usize = 1;

/// Quality used by lossy encoders when the request does not set one
pub const DEFAULT_QUALITY: u8 = 80;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Background worker count for the async path
    pub worker_threads: usize,
    pub default_quality: u8,
    /// Inputs larger than this are rejected before decode
    pub max_input_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: detect_worker_threads(DEFAULT_LIBUV_THREADPOOL_SIZE),
            default_quality: DEFAULT_QUALITY,
            max_input_bytes: None,
        }
    }
}

impl EngineConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by from_env and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uv_reserve = match lookup("UV_THREADPOOL_SIZE") {
            Some(raw) => parse_usize("UV_THREADPOOL_SIZE", &raw)?,
            None => DEFAULT_LIBUV_THREADPOOL_SIZE,
        };

        let worker_threads = match lookup("CIMGRES_THREADS") {
            Some(raw) => {
                let threads = parse_usize("CIMGRES_THREADS", &raw)?;
                if threads == 0 {
                    return Err(CimgresError::config(
                        "CIMGRES_THREADS",
                        "must be at least 1",
                    ));
                }
                threads
            }
            None => detect_worker_threads(uv_reserve),
        };

        let default_quality = match lookup("CIMGRES_DEFAULT_QUALITY") {
            Some(raw) => {
                let quality = parse_usize("CIMGRES_DEFAULT_QUALITY", &raw)?;
                if !(1..=100).contains(&quality) {
                    return Err(CimgresError::config(
                        "CIMGRES_DEFAULT_QUALITY",
                        format!("expected 1-100, got {quality}"),
                    ));
                }
                quality as u8
            }
            None => DEFAULT_QUALITY,
        };

        let max_input_bytes = match lookup("CIMGRES_MAX_INPUT_BYTES") {
            Some(raw) => match parse_usize("CIMGRES_MAX_INPUT_BYTES", &raw)? {
                0 => None,
                limit => Some(limit),
            },
            None => None,
        };

        Ok(Self {
            worker_threads,
            default_quality,
            max_input_bytes,
        })
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(MIN_WORKER_THREADS);
        self
    }

    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| CimgresError::config(key, format!("'{raw}' is not a valid count: {e}")))
}

// Respects cgroup/CPU quota via available_parallelism and leaves room for libuv.
fn detect_worker_threads(uv_reserve: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKER_THREADS)
        .saturating_sub(uv_reserve)
        .max(MIN_WORKER_THREADS)
}

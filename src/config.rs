//! Process configuration (AMBIENT, spec §6 "Environment inputs consumed by
//! the core"). Plain `std::env` reads with defaults, matching the teacher's
//! minimalism — no config-framework crate for a handful of variables.
//! `.env` ingestion via `dotenvy`, as in `foiacquire`'s `main.rs`.

use std::env;
use std::path::PathBuf;

/// Environment inputs the core needs at startup (spec §6).
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Document-store connection string. The in-process store (spec §9
    /// Design Note) does not dial out, but the variable is still read so an
    /// external store can be swapped in behind the same trait later.
    pub document_store_uri: String,
    /// Index-store connection string and index name (default `search_index`).
    pub index_store_uri: String,
    pub index_name: String,
    /// Job-queue Redis URI (default `tcp://redis:6379`).
    pub job_queue_redis_uri: String,
    /// Worker count for the job pool.
    pub worker_count: usize,
    /// Crawl templates path: a directory of `.json` files or a single file.
    pub templates_path: Option<PathBuf>,
    /// Address the HTTP surface binds to.
    pub http_bind_addr: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

impl CoreConfig {
    /// Loads `.env` (if present) then reads the environment, falling back
    /// to the defaults spec §6 names.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            document_store_uri: env_or("DOCUMENT_STORE_URI", "memory://local"),
            index_store_uri: env_or("SEARCH_REDIS_URI", "tcp://redis:6379"),
            index_name: env_or("SEARCH_INDEX_NAME", "search_index"),
            job_queue_redis_uri: env_or("JOB_QUEUE_REDIS_URI", "tcp://redis:6379"),
            worker_count: env::var("JOB_QUEUE_WORKER_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            templates_path: env::var("CRAWL_TEMPLATES_PATH").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            http_bind_addr: env_or("HTTP_BIND_ADDR", "0.0.0.0:8080"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_environment_is_unset() {
        env::remove_var("JOB_QUEUE_WORKER_COUNT");
        env::remove_var("SEARCH_INDEX_NAME");
        let config = CoreConfig::from_env();
        assert_eq!(config.index_name, "search_index");
        assert_eq!(config.worker_count, 4);
    }
}

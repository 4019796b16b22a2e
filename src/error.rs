//! Error taxonomy for the crawler/query/storage/queue core.
//!
//! Internal components return [`Result<T>`] through every boundary; only the
//! outermost HTTP handler or job-worker loop converts a [`CoreError`] into a
//! user-visible shape (see `http::search` and `queue::handlers`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("permanent HTTP failure ({status}): {message}")]
    PermanentHttp { status: u16, message: String },

    #[error("permanent transport failure: {0}")]
    PermanentTransport(String),

    #[error("blocked by robots.txt")]
    RobotsBlocked,

    #[error("redirect loop or too many redirects")]
    RedirectLoop,

    #[error("failed to parse query: {0}")]
    QueryParse(String),

    #[error("full-text index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("job handler failed: {0}")]
    JobHandler(String),

    #[error("invalid request: {field}: {message}")]
    InvalidRequest { field: String, message: String },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

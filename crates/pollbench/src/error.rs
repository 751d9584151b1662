//! Error types for the bench library.

use std::net::SocketAddr;
use std::path::PathBuf;

/// All errors that can occur while preparing or running a bench.
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Refusing non-loopback target {0}; the bench only drives local mock services")]
    NonLoopback(SocketAddr),

    #[error("Name list {path}: {reason}")]
    NameList { path: PathBuf, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

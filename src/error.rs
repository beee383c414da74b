//! Error types for the locus library.

/// Unified error type for locus.
#[derive(Debug, thiserror::Error)]
pub enum LocusError {
    /// The AST provider could not be initialized. This is the only error
    /// that aborts a scan before any file is visited.
    #[error("AST provider unavailable: {0}")]
    Provider(String),

    /// A single file failed to parse. Scans log this and move on.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, LocusError>;

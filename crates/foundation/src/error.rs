//! Foundation errors

use thiserror::Error;

/// Foundation result type
pub type Result<T> = std::result::Result<T, Error>;

/// Foundation errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration key: {0}")]
    MissingKey(String),

    #[error("malformed value for {key}: {value}")]
    MalformedValue { key: String, value: String },

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("covariance matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

//! Controller errors

use thiserror::Error;

/// Controller result type
pub type Result<T> = std::result::Result<T, Error>;

/// Controller errors
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] btbfit_foundation::Error),

    #[error("malformed prior range for {key}: {value}")]
    BadRange { key: String, value: String },

    #[error("parameters file {0} is missing but a step has been taken")]
    MissingParameters(String),

    #[error("state file is corrupt: {0}")]
    BadState(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {message}")]
    BadResults { path: String, message: String },
}

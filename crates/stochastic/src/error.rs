//! Simulation driver errors

use thiserror::Error;

/// Driver result type
pub type Result<T> = std::result::Result<T, Error>;

/// Driver errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid kernel rate: {rate}")]
    InvalidRate { rate: f64 },

    #[error("step size must be positive, got {step}")]
    InvalidStep { step: i32 },
}

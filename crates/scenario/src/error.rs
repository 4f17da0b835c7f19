//! Scenario errors

use thiserror::Error;

/// Scenario result type
pub type Result<T> = std::result::Result<T, Error>;

/// Scenario errors
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] btbfit_foundation::Error),

    #[error(transparent)]
    Simulation(#[from] btbfit_stochastic::Error),

    #[error("could not parse date {value} with format {format}")]
    BadDate { value: String, format: String },

    #[error("unrecognised diversity model: {0}")]
    UnknownDiversityModel(String),

    #[error("malformed line in {file}: {line}")]
    MalformedLine { file: String, line: String },

    #[error("unknown farm {farm} referenced by {context}")]
    UnknownFarm { farm: String, context: String },

    #[error("multinomial distribution error: Sum_x [{sum}] != number of samples [{expected}]")]
    BinSumMismatch { sum: u64, expected: u64 },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write results: {0}")]
    Save(String),
}

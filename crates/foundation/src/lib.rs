//! btbfit Foundation
//!
//! Shared numeric and configuration primitives for the btbfit workspace:
//! streaming sample statistics, integer histograms, log-factorials,
//! truncated multivariate normal sampling, weighted/subset selection, and
//! the key=value configuration file reader.

pub mod choice;
pub mod config;
pub mod error;
pub mod factorial;
pub mod histogram;
pub mod samples;
pub mod tmvn;

pub use choice::{pick_weighted, sample_indices};
pub use config::KeyValueFile;
pub use error::{Error, Result};
pub use factorial::ln_factorial;
pub use histogram::IntegerHistogram;
pub use samples::Samples;
pub use tmvn::TruncatedMvNormal;

//! btbfit Stochastic
//!
//! Fixed-step tau-leap machinery: the transition kernel container, the
//! theta-event queue for deterministic scheduled events, and the step
//! driver that walks a model from its start date to its end date.

pub mod error;
pub mod kernel;
pub mod simulator;
pub mod thetas;

pub use error::{Error, Result};
pub use kernel::TransitionKernel;
pub use simulator::{StepModel, TauLeapFixedStep};
pub use thetas::ThetaQueue;

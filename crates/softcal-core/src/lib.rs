//! Core traits, types, and error types for the softcal recalibration library.
//!
//! This crate defines the shared interfaces (`ScoreSource`), result and
//! warning types (`CalibratedScore`, `CalibrationWarning`, `FitReport`),
//! error types (`CalibrateError`), configuration, numeric primitives
//! (stable softmax, sigmoid, argmax), and tracing conventions used across
//! the softcal crates.
//!
//! It has minimal external dependencies and is intended to be depended on by
//! every other crate in the workspace.

pub mod config;
pub mod error;
pub mod numeric;
pub mod tracing_config;
pub mod traits;
pub mod types;

pub use config::CalibrationConfig;
pub use error::{CalibrateError, CalibrateResult};
pub use numeric::{argmax, confidence, log_sum_exp, scaled_softmax, sigmoid, softmax};
pub use traits::{InMemoryScoreSource, ScoreSource};
pub use types::{CalibratedScore, CalibrationWarning, CalibratorKind, FitReport};

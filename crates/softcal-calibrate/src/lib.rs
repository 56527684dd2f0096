//! Recalibration algorithms and orchestration for softcal.
//!
//! This crate provides:
//! - **Temperature scaling**: one global `T` fit by validation NLL descent.
//! - **Class-wise temperature scaling**: one `T_k` per class, fit one-vs-rest.
//! - **Histogram binning**: frozen per-bin accuracy table with linear
//!   rescaling of the non-argmax mass.
//! - **`Calibrator`**: the sum type unifying the three methods, with JSON
//!   save/load of fitted state.
//! - **`CalibrationDriver`**: fit-then-apply sequencing over a `ScoreSource`.
//! - **Metrics**: expected calibration error and Brier score audit numbers.

pub mod calibrator;
pub mod classwise;
pub mod driver;
pub mod histogram;
pub mod metrics;
pub mod temperature;

mod optim;
mod validate;

pub use calibrator::Calibrator;
pub use classwise::ClasswiseTemperatureScaler;
pub use driver::CalibrationDriver;
pub use histogram::{Bin, HistogramBinningCalibrator};
pub use metrics::{brier_score, expected_calibration_error};
pub use temperature::TemperatureScaler;

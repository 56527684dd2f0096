//! # softcal
//!
//! Post-hoc confidence recalibration for frozen classifiers.
//!
//! A trained classifier that reports 90% confidence should be right about 90%
//! of the time; modern networks usually are not. softcal fits a recalibration
//! transform on a held-out validation set and applies it unchanged at test
//! time, leaving the classifier's weights — and, for global temperature
//! scaling, its predictions — untouched.
//!
//! # Methods
//!
//! | Calibrator | Parameters | Argmax |
//! |------------|------------|--------|
//! | [`TemperatureScaler`] | one global `T` | preserved |
//! | [`ClasswiseTemperatureScaler`] | one `T_k` per class | may move |
//! | [`HistogramBinningCalibrator`] | per-bin accuracy table | may move |
//!
//! # Quick Start
//!
//! ```rust
//! use softcal::prelude::*;
//!
//! // Logits exported from the frozen classifier (2 classes).
//! let validation = vec![
//!     vec![4.0, 0.0],
//!     vec![3.5, 0.5],
//!     vec![0.5, 3.0],
//!     vec![4.2, -0.3],
//! ];
//! let labels = vec![0, 1, 1, 0];
//!
//! let source = InMemoryScoreSource::new(validation).unwrap();
//! let mut driver = CalibrationDriver::new(
//!     source,
//!     CalibratorKind::Temperature,
//!     CalibrationConfig::default(),
//! )
//! .unwrap();
//!
//! let report = driver.fit([(vec![0, 1, 2, 3], labels)]).unwrap();
//! assert_eq!(report.examples, 4);
//!
//! let scores = driver.apply([(vec![0, 1], None)]).unwrap();
//! let sum: f64 = scores[0].probabilities.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-6);
//! ```
//!
//! ## Crate Layout
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `softcal-core` | Types, traits, errors, config, numeric primitives |
//! | `softcal-calibrate` | The three calibrators, metrics, and the driver |
//!
//! ## Key Types
//!
//! - [`CalibrationDriver`] — fit-then-apply orchestration over a [`ScoreSource`]
//! - [`Calibrator`] — sum type over the three methods, with JSON save/load
//! - [`CalibrationConfig`] — bin count, iteration cap, tolerance, step size
//! - [`FitReport`] — example counts, warnings, before/after ECE and Brier
//! - [`CalibrationWarning`] — recoverable degradations (empty bin, unseen
//!   class, diverged fit)

pub use softcal_calibrate::{
    Bin, CalibrationDriver, Calibrator, ClasswiseTemperatureScaler, HistogramBinningCalibrator,
    TemperatureScaler, brier_score, expected_calibration_error,
};
pub use softcal_core::{
    CalibrateError, CalibrateResult, CalibratedScore, CalibrationConfig, CalibrationWarning,
    CalibratorKind, FitReport, InMemoryScoreSource, ScoreSource,
};

/// Re-exports of the numeric primitives for consumers that pre- or
/// post-process score vectors themselves.
pub mod numeric {
    pub use softcal_core::numeric::{argmax, confidence, log_sum_exp, scaled_softmax, sigmoid, softmax};
}

/// Everything needed for the common fit-then-apply workflow.
pub mod prelude {
    pub use softcal_calibrate::{Calibrator, CalibrationDriver};
    pub use softcal_core::{
        CalibrateError, CalibrateResult, CalibratedScore, CalibrationConfig, CalibratorKind,
        FitReport, InMemoryScoreSource, ScoreSource,
    };
}

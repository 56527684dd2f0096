use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Calibrator selection
// ---------------------------------------------------------------------------

/// Which recalibration method to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CalibratorKind {
    /// One global temperature minimizing validation NLL.
    #[default]
    Temperature,
    /// One temperature per class, each fit one-vs-rest.
    ClasswiseTemperature,
    /// Equal-width histogram binning with linear rescaling of the remainder.
    HistogramBinning,
}

impl CalibratorKind {
    /// Stable identifier used in logs and serialized state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::ClasswiseTemperature => "classwise_temperature",
            Self::HistogramBinning => "histogram_binning",
        }
    }
}

impl fmt::Display for CalibratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Per-example output
// ---------------------------------------------------------------------------

/// One calibrated test example.
///
/// `predicted` is the argmax of the calibrated probability vector. For global
/// temperature scaling this always equals the raw argmax; class-wise scaling
/// and histogram rescaling may legitimately move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedScore {
    /// Calibrated probability vector (non-negative, sums to 1).
    pub probabilities: Vec<f64>,
    /// Predicted class index (argmax of `probabilities`).
    pub predicted: usize,
    /// Whether the prediction matched the true label, when a label was given.
    pub correct: Option<bool>,
}

// ---------------------------------------------------------------------------
// Recoverable degradations
// ---------------------------------------------------------------------------

/// A non-fatal degradation recorded during fitting.
///
/// Warnings never abort a fit: each one degrades only the class or bin it
/// names, with the documented identity-style fallback applied. Callers should
/// audit them — a warning-heavy fit usually means too little validation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalibrationWarning {
    /// Temperature optimization produced a non-finite or non-positive value
    /// and was reverted to the identity `T = 1.0`.
    OptimizationDiverged {
        /// The affected class for class-wise fits; `None` for the global fit.
        class: Option<usize>,
        /// Iterations completed before divergence was detected.
        iterations: usize,
    },
    /// A class had no positive examples in the validation set, so its
    /// calibration cannot be estimated; its temperature stays at `1.0`.
    UnseenClass {
        /// The class without positives.
        class: usize,
    },
    /// A histogram bin received no validation examples; its accuracy falls
    /// back to the bin midpoint (identity mapping).
    EmptyBin {
        /// Index of the empty bin.
        bin: usize,
        /// Midpoint confidence recorded as the bin's accuracy.
        midpoint: f64,
    },
}

impl fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptimizationDiverged { class: Some(class), iterations } => write!(
                f,
                "temperature for class {class} diverged after {iterations} iterations; reverted to T = 1.0"
            ),
            Self::OptimizationDiverged { class: None, iterations } => write!(
                f,
                "global temperature diverged after {iterations} iterations; reverted to T = 1.0"
            ),
            Self::UnseenClass { class } => write!(
                f,
                "class {class} has no positive validation examples; temperature fixed at 1.0"
            ),
            Self::EmptyBin { bin, midpoint } => write!(
                f,
                "bin {bin} is empty; accuracy falls back to midpoint {midpoint:.4}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Fit diagnostics
// ---------------------------------------------------------------------------

/// Summary diagnostics for one driver fit pass.
///
/// The before/after pairs compare top-1 confidence against empirical
/// correctness on the validation set itself — an audit number, not a holdout
/// estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Which calibrator was fit.
    pub kind: CalibratorKind,
    /// Number of validation examples consumed.
    pub examples: usize,
    /// Class count established from the score vectors.
    pub num_classes: usize,
    /// Recoverable degradations recorded during the fit.
    pub warnings: Vec<CalibrationWarning>,
    /// Expected calibration error of the raw softmax outputs.
    pub ece_before: f64,
    /// Expected calibration error after calibration.
    pub ece_after: f64,
    /// Brier score of the raw softmax outputs.
    pub brier_before: f64,
    /// Brier score after calibration.
    pub brier_after: f64,
}

//! The calibrator sum type.
//!
//! Each recalibration method is a variant holding its own immutable fitted
//! state, so multiple calibrators can be fit side by side from the same
//! validation data and compared. The enum serializes as internally-tagged
//! JSON for the save/load convenience API.

use std::path::Path;

use serde::{Deserialize, Serialize};
use softcal_core::numeric::softmax;
use softcal_core::{
    CalibrateError, CalibrateResult, CalibrationConfig, CalibrationWarning, CalibratorKind,
};

use crate::classwise::ClasswiseTemperatureScaler;
use crate::histogram::HistogramBinningCalibrator;
use crate::temperature::TemperatureScaler;

/// A fitted calibrator of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Calibrator {
    /// Global temperature scaling.
    Temperature(TemperatureScaler),
    /// Per-class one-vs-rest temperature scaling.
    ClasswiseTemperature(ClasswiseTemperatureScaler),
    /// Histogram binning with linear rescaling.
    HistogramBinning(HistogramBinningCalibrator),
}

impl Calibrator {
    /// Fit the selected method on validation logits and labels.
    ///
    /// Histogram binning derives softmax vectors from the logits internally,
    /// so all three methods share one input shape.
    ///
    /// # Errors
    ///
    /// Returns configuration and input-shape errors; degenerate statistics
    /// degrade into [`warnings`](Self::warnings) instead.
    pub fn fit(
        kind: CalibratorKind,
        logits: &[Vec<f64>],
        labels: &[usize],
        config: &CalibrationConfig,
    ) -> CalibrateResult<Self> {
        config.validate()?;
        match kind {
            CalibratorKind::Temperature => {
                TemperatureScaler::fit(logits, labels, config).map(Self::Temperature)
            }
            CalibratorKind::ClasswiseTemperature => {
                ClasswiseTemperatureScaler::fit(logits, labels, config)
                    .map(Self::ClasswiseTemperature)
            }
            CalibratorKind::HistogramBinning => {
                let softmaxes: Vec<Vec<f64>> = logits.iter().map(|z| softmax(z)).collect();
                HistogramBinningCalibrator::fit(&softmaxes, labels, config.n_bins)
                    .map(Self::HistogramBinning)
            }
        }
    }

    /// Calibrate one logit vector into a probability vector.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::DimensionMismatch`] when the class-wise
    /// scaler receives a vector of the wrong length.
    pub fn apply(&self, logits: &[f64]) -> CalibrateResult<Vec<f64>> {
        match self {
            Self::Temperature(scaler) => Ok(scaler.apply(logits)),
            Self::ClasswiseTemperature(scaler) => scaler.apply(logits),
            Self::HistogramBinning(calibrator) => Ok(calibrator.apply(&softmax(logits))),
        }
    }

    /// Which method this calibrator implements.
    #[must_use]
    pub const fn kind(&self) -> CalibratorKind {
        match self {
            Self::Temperature(_) => CalibratorKind::Temperature,
            Self::ClasswiseTemperature(_) => CalibratorKind::ClasswiseTemperature,
            Self::HistogramBinning(_) => CalibratorKind::HistogramBinning,
        }
    }

    /// Stable method name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Recoverable degradations recorded during the fit.
    #[must_use]
    pub fn warnings(&self) -> &[CalibrationWarning] {
        match self {
            Self::Temperature(scaler) => scaler.warnings(),
            Self::ClasswiseTemperature(scaler) => scaler.warnings(),
            Self::HistogramBinning(calibrator) => calibrator.warnings(),
        }
    }

    /// Persist the fitted state as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::StateEncode`] or [`CalibrateError::Io`].
    pub fn save(&self, path: &Path) -> CalibrateResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| CalibrateError::StateEncode { source })?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), calibrator = self.name(), "calibrator state saved");
        Ok(())
    }

    /// Load a previously saved fitted state.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::Io`] when the file is unreadable and
    /// [`CalibrateError::StateDecode`] when its contents do not parse.
    pub fn load(path: &Path) -> CalibrateResult<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|source| CalibrateError::StateDecode {
            path: path.to_path_buf(),
            source,
        })
    }
}

//! Fit-then-apply orchestration over a [`ScoreSource`].
//!
//! The driver owns the frozen classifier handle and one calibrator slot. It
//! drains validation batches, delegates fitting to the selected method,
//! reports before/after diagnostics, and then maps test batches to
//! [`CalibratedScore`]s in input order. All algorithmic content lives in the
//! calibrators; this is sequencing only.

use softcal_core::numeric::{argmax, softmax};
use softcal_core::{
    CalibrateError, CalibrateResult, CalibratedScore, CalibrationConfig, CalibratorKind,
    FitReport, ScoreSource,
};

use crate::calibrator::Calibrator;
use crate::metrics::{brier_score, expected_calibration_error};

/// Orchestrates one calibration run: validation fit, then test-time apply.
#[derive(Debug)]
pub struct CalibrationDriver<S: ScoreSource> {
    source: S,
    kind: CalibratorKind,
    config: CalibrationConfig,
    fitted: Option<Calibrator>,
}

impl<S: ScoreSource> CalibrationDriver<S> {
    /// Create a driver for the given source and method.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidConfig`] for invalid knobs.
    pub fn new(
        source: S,
        kind: CalibratorKind,
        config: CalibrationConfig,
    ) -> CalibrateResult<Self> {
        config.validate()?;
        Ok(Self {
            source,
            kind,
            config,
            fitted: None,
        })
    }

    /// Fit the calibrator on validation batches of `(inputs, labels)`.
    ///
    /// Batch boundaries are irrelevant to the result: all batches are
    /// accumulated and fit in one pass, so any partitioning of the same
    /// examples produces the same calibrator.
    ///
    /// # Errors
    ///
    /// Propagates score-source failures and input-shape errors. A repeated
    /// call refits from scratch and replaces the previous calibrator.
    pub fn fit<I>(&mut self, validation: I) -> CalibrateResult<FitReport>
    where
        I: IntoIterator<Item = (Vec<S::Input>, Vec<usize>)>,
    {
        let mut logits: Vec<Vec<f64>> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        for (inputs, batch_labels) in validation {
            if inputs.len() != batch_labels.len() {
                return Err(CalibrateError::LengthMismatch {
                    vectors: inputs.len(),
                    labels: batch_labels.len(),
                });
            }
            let mut batch = self.source.logits(&inputs)?;
            tracing::trace!(batch_size = batch.len(), "scored validation batch");
            logits.append(&mut batch);
            labels.extend_from_slice(&batch_labels);
        }
        if logits.is_empty() {
            return Err(CalibrateError::EmptyValidationSet);
        }

        let calibrator = Calibrator::fit(self.kind, &logits, &labels, &self.config)?;

        let (raw_confidences, raw_correct) = top1_outcomes_raw(&logits, &labels);
        let mut calibrated_confidences = Vec::with_capacity(logits.len());
        let mut calibrated_correct = Vec::with_capacity(logits.len());
        for (z, &y) in logits.iter().zip(labels.iter()) {
            let probs = calibrator.apply(z)?;
            if let Some(pred) = argmax(&probs) {
                calibrated_confidences.push(probs[pred]);
                calibrated_correct.push(pred == y);
            }
        }

        let report = FitReport {
            kind: self.kind,
            examples: logits.len(),
            num_classes: logits[0].len(),
            warnings: calibrator.warnings().to_vec(),
            ece_before: expected_calibration_error(
                &raw_confidences,
                &raw_correct,
                self.config.n_bins,
            ),
            ece_after: expected_calibration_error(
                &calibrated_confidences,
                &calibrated_correct,
                self.config.n_bins,
            ),
            brier_before: brier_score(&raw_confidences, &raw_correct),
            brier_after: brier_score(&calibrated_confidences, &calibrated_correct),
        };
        tracing::info!(
            event = "calibrator_fitted",
            calibrator = self.kind.name(),
            examples = report.examples,
            num_classes = report.num_classes,
            warnings = report.warnings.len(),
            ece_before = report.ece_before,
            ece_after = report.ece_after,
            brier_before = report.brier_before,
            brier_after = report.brier_after,
            "calibrator fitted"
        );

        self.fitted = Some(calibrator);
        Ok(report)
    }

    /// Calibrate test batches, preserving input order.
    ///
    /// Labels are optional; when present they yield the `correct` flag of
    /// each [`CalibratedScore`], otherwise the flag is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::NotFitted`] before a successful
    /// [`fit`](Self::fit), and propagates score-source failures.
    pub fn apply<I>(&self, test: I) -> CalibrateResult<Vec<CalibratedScore>>
    where
        I: IntoIterator<Item = (Vec<S::Input>, Option<Vec<usize>>)>,
    {
        let calibrator = self.fitted.as_ref().ok_or(CalibrateError::NotFitted)?;

        let mut scores = Vec::new();
        for (inputs, batch_labels) in test {
            if let Some(labels) = &batch_labels
                && labels.len() != inputs.len()
            {
                return Err(CalibrateError::LengthMismatch {
                    vectors: inputs.len(),
                    labels: labels.len(),
                });
            }
            let batch = self.source.logits(&inputs)?;
            for (i, z) in batch.iter().enumerate() {
                let probabilities = calibrator.apply(z)?;
                let predicted = argmax(&probabilities).unwrap_or_default();
                let correct = batch_labels.as_ref().map(|labels| labels[i] == predicted);
                scores.push(CalibratedScore {
                    probabilities,
                    predicted,
                    correct,
                });
            }
        }
        tracing::debug!(
            calibrator = calibrator.name(),
            examples = scores.len(),
            "test set calibrated"
        );
        Ok(scores)
    }

    /// The fitted calibrator, once [`fit`](Self::fit) has succeeded.
    #[must_use]
    pub fn calibrator(&self) -> Option<&Calibrator> {
        self.fitted.as_ref()
    }

    /// Consume the driver, returning the fitted calibrator for persistence.
    #[must_use]
    pub fn into_calibrator(self) -> Option<Calibrator> {
        self.fitted
    }

    /// The configured method.
    #[must_use]
    pub const fn kind(&self) -> CalibratorKind {
        self.kind
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}

/// Top-1 confidence and correctness of the raw (uncalibrated) softmax.
fn top1_outcomes_raw(logits: &[Vec<f64>], labels: &[usize]) -> (Vec<f64>, Vec<bool>) {
    let mut confidences = Vec::with_capacity(logits.len());
    let mut correct = Vec::with_capacity(logits.len());
    for (z, &y) in logits.iter().zip(labels.iter()) {
        let probs = softmax(z);
        if let Some(pred) = argmax(&probs) {
            confidences.push(probs[pred]);
            correct.push(pred == y);
        }
    }
    (confidences, correct)
}

//! The boundary between softcal and the frozen classifier it recalibrates.
//!
//! softcal never trains or inspects the model: it only asks a [`ScoreSource`]
//! for logit vectors. Softmax probabilities are always derived inside softcal
//! (see [`crate::numeric::softmax`]) so every calibrator sees identically
//! normalized inputs.

use crate::error::{CalibrateError, CalibrateResult};
use crate::numeric::softmax;

/// A frozen classifier that maps input batches to per-class logits.
///
/// Implementations are synchronous and blocking: calibration is a one-shot
/// bulk pass over fully enumerated validation/test sets, so there is nothing
/// to overlap with. Device placement, batching strategy, and any internal
/// parallelism are the implementor's concern — softcal only requires that the
/// same input always produces the same logits (determinism invariant).
pub trait ScoreSource {
    /// Opaque input type consumed by the classifier (image tensor, token
    /// batch, feature row — softcal never looks inside).
    type Input;

    /// Number of classes `C`; every returned logit vector has this length.
    fn num_classes(&self) -> usize;

    /// Produce one logit vector per input, in input order.
    ///
    /// # Errors
    ///
    /// Implementations should wrap internal failures in
    /// [`CalibrateError::ScoreSourceFailed`].
    fn logits(&self, inputs: &[Self::Input]) -> CalibrateResult<Vec<Vec<f64>>>;

    /// Softmax probability vectors for a batch, derived from [`logits`](Self::logits).
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`logits`](Self::logits) failure.
    fn softmaxes(&self, inputs: &[Self::Input]) -> CalibrateResult<Vec<Vec<f64>>> {
        Ok(self
            .logits(inputs)?
            .iter()
            .map(|z| softmax(z))
            .collect())
    }
}

/// A [`ScoreSource`] over precomputed logits, addressed by index.
///
/// The standard test double, and also useful in production when logits were
/// exported ahead of time (e.g. scored on another machine): calibration then
/// runs without the model in memory.
#[derive(Debug, Clone)]
pub struct InMemoryScoreSource {
    logits: Vec<Vec<f64>>,
    num_classes: usize,
}

impl InMemoryScoreSource {
    /// Wrap precomputed logit vectors.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::EmptyValidationSet`] for an empty collection
    /// and [`CalibrateError::DimensionMismatch`] if vectors disagree on length.
    pub fn new(logits: Vec<Vec<f64>>) -> CalibrateResult<Self> {
        let Some(first) = logits.first() else {
            return Err(CalibrateError::EmptyValidationSet);
        };
        let num_classes = first.len();
        for (index, row) in logits.iter().enumerate() {
            if row.len() != num_classes {
                return Err(CalibrateError::DimensionMismatch {
                    expected: num_classes,
                    found: row.len(),
                    index,
                });
            }
        }
        Ok(Self {
            logits,
            num_classes,
        })
    }

    /// Number of stored examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logits.len()
    }

    /// True when no examples are stored (unreachable after `new`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logits.is_empty()
    }
}

impl ScoreSource for InMemoryScoreSource {
    type Input = usize;

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn logits(&self, inputs: &[usize]) -> CalibrateResult<Vec<Vec<f64>>> {
        inputs
            .iter()
            .map(|&idx| {
                self.logits.get(idx).cloned().ok_or_else(|| {
                    CalibrateError::ScoreSourceFailed {
                        source: format!(
                            "index {idx} out of range for {} stored logit vectors",
                            self.logits.len()
                        )
                        .into(),
                    }
                })
            })
            .collect()
    }
}

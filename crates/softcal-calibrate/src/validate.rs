//! Input validation shared by the calibrator fit paths.

use softcal_core::{CalibrateError, CalibrateResult};

/// Check that `vectors` is a non-empty, rectangular batch parallel to
/// `labels`, with every label a valid class index. Returns the class count.
pub(crate) fn validate_batch(vectors: &[Vec<f64>], labels: &[usize]) -> CalibrateResult<usize> {
    let Some(first) = vectors.first() else {
        return Err(CalibrateError::EmptyValidationSet);
    };
    if vectors.len() != labels.len() {
        return Err(CalibrateError::LengthMismatch {
            vectors: vectors.len(),
            labels: labels.len(),
        });
    }
    let num_classes = first.len();
    for (index, row) in vectors.iter().enumerate() {
        if row.len() != num_classes {
            return Err(CalibrateError::DimensionMismatch {
                expected: num_classes,
                found: row.len(),
                index,
            });
        }
    }
    for (index, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(CalibrateError::LabelOutOfRange {
                label,
                num_classes,
                index,
            });
        }
    }
    Ok(num_classes)
}

use std::path::PathBuf;

/// Unified error type covering all failure modes across the softcal calibration pipeline.
///
/// Every variant includes an actionable error message guiding the consumer toward
/// resolution. Only invalid inputs are surfaced as errors: degenerate statistics
/// (empty bins, unseen classes) and numeric instability during optimization are
/// recovered locally with documented fallbacks and reported as
/// [`CalibrationWarning`](crate::types::CalibrationWarning)s instead.
#[derive(Debug, thiserror::Error)]
pub enum CalibrateError {
    // === Input validation errors ===
    /// The validation set contains no examples.
    #[error(
        "Validation set is empty. Fitting requires at least one (logits, label) example; check that the data loader yielded batches."
    )]
    EmptyValidationSet,

    /// A logit or softmax vector does not match the established class count.
    #[error(
        "Dimension mismatch at example {index}: expected {expected}-class vectors, found {found}. All score vectors in one run must share a class count."
    )]
    DimensionMismatch {
        /// Class count established by the first vector (or the fitted state).
        expected: usize,
        /// Length of the offending vector.
        found: usize,
        /// Position of the offending example.
        index: usize,
    },

    /// Score vectors and labels are not parallel collections.
    #[error(
        "Length mismatch: {vectors} score vectors but {labels} labels. Inputs must align one-to-one."
    )]
    LengthMismatch {
        /// Number of logit/softmax vectors supplied.
        vectors: usize,
        /// Number of labels supplied.
        labels: usize,
    },

    /// A class label falls outside `[0, num_classes)`.
    #[error(
        "Label {label} at example {index} is out of range for {num_classes} classes. Labels must be class indices in [0, {num_classes})."
    )]
    LabelOutOfRange {
        /// The offending label.
        label: usize,
        /// Number of classes in the score vectors.
        num_classes: usize,
        /// Position of the offending example.
        index: usize,
    },

    /// Histogram binning was requested with a non-positive bin count.
    #[error(
        "Invalid bin count {requested}: histogram binning requires at least one bin. The standard choice is 15 (CalibrationConfig::default())."
    )]
    InvalidBinCount {
        /// The requested bin count.
        requested: usize,
    },

    // === Configuration errors ===
    /// A configuration value is invalid.
    #[error("Invalid config: {field} = \"{value}\" — {reason}")]
    InvalidConfig {
        /// Which config field.
        field: String,
        /// The invalid value.
        value: String,
        /// Why it is invalid.
        reason: String,
    },

    // === Lifecycle errors ===
    /// `apply` was called on a driver whose calibrator has not been fit.
    #[error("Calibrator has not been fit. Call fit() with validation data before apply().")]
    NotFitted,

    // === External collaborator errors ===
    /// The wrapped classifier failed while producing logits for a batch.
    #[error(
        "Score source failed while scoring a batch: {source}. The classifier is external to softcal; check its inputs and retry."
    )]
    ScoreSourceFailed {
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // === Persistence errors ===
    /// Fitted calibrator state could not be encoded as JSON.
    #[error("Calibrator state could not be encoded: {source}")]
    StateEncode {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A calibrator state snapshot could not be decoded.
    #[error(
        "Calibrator state at {path} could not be decoded: {source}. The snapshot may be truncated or from an incompatible version; refit and save again."
    )]
    StateDecode {
        /// Path of the unreadable snapshot.
        path: PathBuf,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Wraps `std::io::Error` for snapshot file operations.
    #[error("I/O error: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the softcal crate hierarchy.
pub type CalibrateResult<T> = Result<T, CalibrateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CalibrateError>();
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let cal_err: CalibrateError = io_err.into();
        assert!(matches!(cal_err, CalibrateError::Io(_)));
        assert!(cal_err.to_string().contains("gone"));
    }

    #[test]
    fn display_messages_are_actionable() {
        let err = CalibrateError::EmptyValidationSet;
        assert!(err.to_string().contains("at least one"), "should explain the requirement");

        let err = CalibrateError::DimensionMismatch {
            expected: 10,
            found: 8,
            index: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('8'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn length_mismatch_display_has_counts() {
        let err = CalibrateError::LengthMismatch {
            vectors: 100,
            labels: 99,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("99"));
    }

    #[test]
    fn label_out_of_range_display() {
        let err = CalibrateError::LabelOutOfRange {
            label: 12,
            num_classes: 10,
            index: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));
        assert!(msg.contains("[0, 10)"));
    }

    #[test]
    fn invalid_bin_count_suggests_default() {
        let err = CalibrateError::InvalidBinCount { requested: 0 };
        let msg = err.to_string();
        assert!(msg.contains('0'));
        assert!(msg.contains("15"), "should point at the standard bin count");
    }

    #[test]
    fn invalid_config_display() {
        let err = CalibrateError::InvalidConfig {
            field: "tolerance".into(),
            value: "-1.0".into(),
            reason: "must be positive and finite".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tolerance"));
        assert!(msg.contains("-1.0"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn not_fitted_display_suggests_fit() {
        let err = CalibrateError::NotFitted;
        assert!(err.to_string().contains("fit()"));
    }

    #[test]
    fn score_source_failed_preserves_source() {
        let inner = std::io::Error::other("model crashed");
        let err = CalibrateError::ScoreSourceFailed {
            source: Box::new(inner),
        };
        assert!(err.to_string().contains("model crashed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn state_decode_display_has_path() {
        let bad = serde_json::from_str::<serde_json::Value>("{");
        let err = CalibrateError::StateDecode {
            path: PathBuf::from("/tmp/calibrator.json"),
            source: bad.unwrap_err(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/calibrator.json"));
        assert!(msg.contains("refit"));
    }

    #[test]
    fn calibrate_result_alias_works() {
        let ok: CalibrateResult<u32> = Ok(42);
        assert!(ok.is_ok());

        let err: CalibrateResult<u32> = Err(CalibrateError::NotFitted);
        assert!(err.is_err());
    }
}

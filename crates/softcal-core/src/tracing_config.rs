//! Tracing conventions for softcal.
//!
//! softcal emits structured `tracing` events but never installs a subscriber:
//! consumers bring their own. This module centralizes the target prefix and
//! the span/field names so subscribers, dashboards, and tests can match on
//! them.

use tracing::Level;

/// Target prefix used by all softcal tracing spans and events.
///
/// Consumers can use this to filter softcal logs:
/// ```text
/// RUST_LOG=softcal=debug
/// ```
pub const TARGET_PREFIX: &str = "softcal";

/// Standard tracing span names used across the calibration pipeline.
pub mod span_names {
    /// Driver-level fit pass (validation set).
    pub const FIT: &str = "softcal::fit";
    /// Driver-level apply pass (test set).
    pub const APPLY: &str = "softcal::apply";
    /// Global temperature optimization.
    pub const TEMPERATURE_FIT: &str = "softcal::temperature_fit";
    /// Per-class one-vs-rest temperature optimization.
    pub const CLASSWISE_FIT: &str = "softcal::classwise_fit";
    /// Histogram bin construction.
    pub const HISTOGRAM_FIT: &str = "softcal::histogram_fit";
    /// One ScoreSource batch evaluation.
    pub const SCORE_BATCH: &str = "softcal::score_batch";
}

/// Standard structured field names used in tracing events.
pub mod field_names {
    pub const CALIBRATOR: &str = "calibrator";
    pub const EXAMPLES: &str = "examples";
    pub const NUM_CLASSES: &str = "num_classes";
    pub const N_BINS: &str = "n_bins";
    pub const ITERATIONS: &str = "iterations";
    pub const TEMPERATURE: &str = "temperature";
    pub const WARNINGS: &str = "warnings";
    pub const ECE_BEFORE: &str = "ece_before";
    pub const ECE_AFTER: &str = "ece_after";
    pub const BRIER_BEFORE: &str = "brier_before";
    pub const BRIER_AFTER: &str = "brier_after";
}

/// Parse a log level string (case-insensitive).
///
/// Recognized values: `trace`, `debug`, `info`, `warn`, `error`.
/// Returns `None` for unrecognized strings.
#[must_use]
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Returns the recommended `tracing::Level` for the given environment.
///
/// Checks `SOFTCAL_LOG_LEVEL` first, then falls back to the provided default.
#[must_use]
pub fn level_from_env(default: Level) -> Level {
    std::env::var("SOFTCAL_LOG_LEVEL")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_prefix_is_softcal() {
        assert_eq!(TARGET_PREFIX, "softcal");
    }

    #[test]
    fn all_span_names_start_with_target_prefix() {
        let all_spans = [
            span_names::FIT,
            span_names::APPLY,
            span_names::TEMPERATURE_FIT,
            span_names::CLASSWISE_FIT,
            span_names::HISTOGRAM_FIT,
            span_names::SCORE_BATCH,
        ];
        for span in all_spans {
            assert!(
                span.starts_with(&format!("{TARGET_PREFIX}::")),
                "span {span:?} must start with \"{TARGET_PREFIX}::\"",
            );
        }
    }

    #[test]
    fn field_names_are_non_empty() {
        let all_fields = [
            field_names::CALIBRATOR,
            field_names::EXAMPLES,
            field_names::NUM_CLASSES,
            field_names::N_BINS,
            field_names::ITERATIONS,
            field_names::TEMPERATURE,
            field_names::WARNINGS,
            field_names::ECE_BEFORE,
            field_names::ECE_AFTER,
            field_names::BRIER_BEFORE,
            field_names::BRIER_AFTER,
        ];
        for field in all_fields {
            assert!(!field.is_empty(), "field name must not be empty");
        }
    }

    #[test]
    fn parse_level_recognizes_valid_levels() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("info"), Some(Level::INFO));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("error"), Some(Level::ERROR));
    }

    #[test]
    fn parse_level_case_insensitive() {
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level("Info"), Some(Level::INFO));
    }

    #[test]
    fn parse_level_returns_none_for_invalid() {
        assert_eq!(parse_level("nonsense"), None);
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level(" info"), None);
    }
}

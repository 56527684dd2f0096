//! Configuration for the calibration pipeline.
//!
//! [`CalibrationConfig`] carries the tuning knobs shared by all three
//! calibrators. All fields have sensible defaults; override selectively, via
//! environment variables, or load from a TOML file.

use serde::{Deserialize, Serialize};

use crate::error::{CalibrateError, CalibrateResult};

/// Tuning knobs for calibrator fitting.
///
/// # Environment Variable Overrides
///
/// | Variable                 | Field            | Default |
/// |--------------------------|------------------|---------|
/// | `SOFTCAL_N_BINS`         | `n_bins`         | `15`    |
/// | `SOFTCAL_MAX_ITERATIONS` | `max_iterations` | `50`    |
/// | `SOFTCAL_TOLERANCE`      | `tolerance`      | `1e-6`  |
/// | `SOFTCAL_LEARNING_RATE`  | `learning_rate`  | `0.1`   |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of equal-width histogram bins over `[0, 1]`.
    /// Default: 15 (the common choice in the calibration literature).
    pub n_bins: usize,

    /// Hard cap on temperature-fit iterations; guarantees termination.
    /// Default: 50.
    pub max_iterations: usize,

    /// Stop fitting once the NLL improvement per iteration falls below this.
    /// Default: 1e-6.
    pub tolerance: f64,

    /// Initial step size for the gradient descent on `ln T`. The fit
    /// backtracks (halves the step) whenever a step would increase the loss,
    /// so this only bounds the first attempt per iteration.
    /// Default: 0.1.
    pub learning_rate: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            n_bins: 15,
            max_iterations: 50,
            tolerance: 1e-6,
            learning_rate: 0.1,
        }
    }
}

impl CalibrationConfig {
    /// Load overrides from environment variables.
    ///
    /// Only overrides fields for which environment variables are set.
    /// Invalid values are silently ignored (defaults are kept).
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("SOFTCAL_N_BINS")
            && let Ok(n) = val.parse::<usize>()
            && n > 0
        {
            self.n_bins = n;
        }
        if let Ok(val) = std::env::var("SOFTCAL_MAX_ITERATIONS")
            && let Ok(n) = val.parse::<usize>()
            && n > 0
        {
            self.max_iterations = n;
        }
        if let Ok(val) = std::env::var("SOFTCAL_TOLERANCE")
            && let Ok(t) = val.parse::<f64>()
            && t > 0.0
            && t.is_finite()
        {
            self.tolerance = t;
        }
        if let Ok(val) = std::env::var("SOFTCAL_LEARNING_RATE")
            && let Ok(lr) = val.parse::<f64>()
            && lr > 0.0
            && lr.is_finite()
        {
            self.learning_rate = lr;
        }
        self
    }

    /// Load a config from a TOML file, falling back to defaults on any error.
    ///
    /// Parse failures are logged at `warn` and never abort: calibration with
    /// default knobs beats no calibration at all.
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        std::fs::read_to_string(path).map_or_else(
            |_| Self::default(),
            |contents| match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse calibration config, using defaults"
                    );
                    Self::default()
                }
            },
        )
    }

    /// Validate all knobs, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> CalibrateResult<()> {
        if self.n_bins == 0 {
            return Err(invalid("n_bins", "0", "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "0", "must be at least 1"));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(invalid(
                "tolerance",
                &self.tolerance.to_string(),
                "must be positive and finite",
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid(
                "learning_rate",
                &self.learning_rate.to_string(),
                "must be positive and finite",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> CalibrateError {
    CalibrateError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CalibrationConfig::default();
        assert_eq!(config.n_bins, 15);
        assert_eq!(config.max_iterations, 50);
        assert!((config.tolerance - 1e-6).abs() < f64::EPSILON);
        assert!((config.learning_rate - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_validates() {
        assert!(CalibrationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_bins_rejected() {
        let config = CalibrationConfig {
            n_bins: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n_bins"));
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = CalibrationConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_tolerance_rejected() {
        let config = CalibrationConfig {
            tolerance: f64::NAN,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn negative_learning_rate_rejected() {
        let config = CalibrationConfig {
            learning_rate: -0.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("learning_rate"));
    }

    #[test]
    fn toml_round_trip() {
        let config = CalibrationConfig {
            n_bins: 20,
            max_iterations: 80,
            tolerance: 1e-8,
            learning_rate: 0.05,
        };
        let text = toml::to_string(&config).unwrap();
        let decoded: CalibrationConfig = toml::from_str(&text).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let decoded: CalibrationConfig = toml::from_str("n_bins = 30").unwrap();
        assert_eq!(decoded.n_bins, 30);
        assert_eq!(decoded.max_iterations, 50);
    }

    #[test]
    fn load_or_default_missing_file_is_default() {
        let config =
            CalibrationConfig::load_or_default(std::path::Path::new("/nonexistent/softcal.toml"));
        assert_eq!(config, CalibrationConfig::default());
    }
}

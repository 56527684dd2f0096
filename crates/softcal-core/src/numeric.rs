//! Shared numeric primitives for calibration.
//!
//! Everything here is deterministic and batch-size independent: the same
//! inputs produce bit-identical outputs regardless of how callers partition
//! their data. Calibrators rely on that to guarantee reproducible fits.

/// Numerically stable sigmoid: `1 / (1 + exp(-x))`.
///
/// Returns `0.0` for `-inf` and `1.0` for `+inf`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let e = (-x).exp();
        1.0 / (1.0 + e)
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Log-sum-exp with max-subtraction for overflow safety.
///
/// Returns `f64::NEG_INFINITY` for an empty slice.
#[must_use]
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        // All -inf (empty or degenerate) or a NaN/+inf poisoned the slice.
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Stable softmax over a logit slice.
///
/// Empty input yields an empty vector. Entries are non-negative and sum to 1
/// within floating-point tolerance for any finite input.
#[must_use]
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    scaled_softmax(logits, 1.0)
}

/// Softmax of `logits / temperature`.
///
/// The temperature must be positive; callers (the scalers) guarantee this by
/// construction. Uses max-subtraction so large logits cannot overflow.
#[must_use]
pub fn scaled_softmax(logits: &[f64], temperature: f64) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = logits
        .iter()
        .map(|&z| ((z - max) / temperature).exp())
        .collect();
    let sum: f64 = out.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for value in &mut out {
            *value /= sum;
        }
    } else {
        // Degenerate logits (all -inf, or NaN contamination): fall back to
        // the uniform distribution rather than emitting NaN probabilities.
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / logits.len() as f64;
        out.fill(uniform);
    }
    out
}

/// Index of the largest entry, first occurrence winning ties.
///
/// NaN entries are treated as smaller than every real value, so a vector with
/// at least one non-NaN entry never selects a NaN. Returns `None` for an
/// empty slice.
#[must_use]
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    match best {
        Some((idx, _)) => Some(idx),
        None if values.is_empty() => None,
        // All entries NaN: fall back to the first index deterministically.
        None => Some(0),
    }
}

/// Top-1 confidence of a probability vector: the entry at [`argmax`].
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn confidence(probabilities: &[f64]) -> Option<f64> {
    argmax(probabilities).map(|idx| probabilities[idx])
}

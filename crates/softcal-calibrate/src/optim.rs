//! Bounded 1-D descent on `ln T`, shared by the global and class-wise fits.
//!
//! The NLL/BCE objectives are convex in `ln T` for well-behaved inputs, so a
//! plain gradient descent with backtracking line search converges in a
//! handful of steps. Optimizing the log keeps the temperature positive by
//! construction; no clamping is needed.

use softcal_core::CalibrationConfig;

/// Halvings attempted before an iteration is declared stuck.
const MAX_BACKTRACKS: usize = 10;

/// Result of one temperature fit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DescentOutcome {
    /// The fitted temperature; `1.0` when the fit diverged.
    pub temperature: f64,
    /// Iterations actually run.
    pub iterations: usize,
    /// True when a non-finite loss or gradient forced the identity fallback.
    pub diverged: bool,
}

/// Minimize `objective` over the temperature, starting from `T = 1.0`.
///
/// `objective(t)` returns `(loss, d loss / d ln t)` evaluated at `t`. Steps
/// that fail to decrease the loss are halved up to [`MAX_BACKTRACKS`] times;
/// an iteration with no acceptable step terminates the fit at the current
/// point. A non-finite loss or gradient aborts with `diverged = true` and the
/// caller reverts to the identity temperature.
pub(crate) fn fit_log_temperature<F>(objective: F, config: &CalibrationConfig) -> DescentOutcome
where
    F: Fn(f64) -> (f64, f64),
{
    let mut ln_t = 0.0_f64;
    let mut t = 1.0_f64;
    let (mut loss, mut grad) = objective(t);
    if !loss.is_finite() || !grad.is_finite() {
        return DescentOutcome {
            temperature: 1.0,
            iterations: 0,
            diverged: true,
        };
    }

    let mut iterations = 0;
    let mut diverged = false;
    for _ in 0..config.max_iterations {
        iterations += 1;

        let mut step = config.learning_rate;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let cand_ln_t = ln_t - step * grad;
            let cand_t = cand_ln_t.exp();
            if cand_t.is_finite() && cand_t > 0.0 {
                let (cand_loss, cand_grad) = objective(cand_t);
                if cand_loss.is_finite() && cand_loss <= loss {
                    accepted = Some((cand_ln_t, cand_t, cand_loss, cand_grad));
                    break;
                }
            }
            step /= 2.0;
        }

        let Some((next_ln_t, next_t, next_loss, next_grad)) = accepted else {
            // No descent direction at this resolution: converged.
            break;
        };
        let improvement = loss - next_loss;
        ln_t = next_ln_t;
        t = next_t;
        loss = next_loss;
        grad = next_grad;
        if !grad.is_finite() {
            diverged = true;
            break;
        }
        if improvement < config.tolerance {
            break;
        }
    }

    if diverged || !t.is_finite() || t <= 0.0 {
        DescentOutcome {
            temperature: 1.0,
            iterations,
            diverged: true,
        }
    } else {
        DescentOutcome {
            temperature: t,
            iterations,
            diverged: false,
        }
    }
}

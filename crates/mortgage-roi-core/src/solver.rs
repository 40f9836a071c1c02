//! Bounded bisection with a fixed iteration budget.
//!
//! The solver never stops early on a convergence tolerance: each call costs
//! exactly `max_expansions + iterations` objective evaluations in the worst
//! case, which keeps latency predictable when the objective itself is a full
//! monthly simulation.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::annuity::payment_from_rate;
use crate::types::{Money, Rate};

/// Search bounds and iteration budget for [`solve_bracketed`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BisectionConfig {
    /// Lower end of the search interval; never moves during expansion.
    pub lower_bound: f64,
    /// First upper bound tried before doubling.
    pub initial_upper: f64,
    /// Maximum number of times the upper bound is doubled.
    pub max_expansions: u32,
    /// Number of halvings once a bracket is found.
    pub iterations: u32,
    /// `|f(lower) − target|` below which `lower_bound` is returned as is.
    pub early_exit_tolerance: f64,
}

impl BisectionConfig {
    /// Implied monthly loan rate from principal, term and payment.
    pub const IMPLIED_RATE: Self = Self {
        lower_bound: 0.0,
        initial_upper: 0.5,
        max_expansions: 20,
        iterations: 60,
        early_exit_tolerance: 1e-6,
    };

    /// Break-even monthly reinvestment rate evaluated in closed form at one month.
    pub const BREAK_EVEN_AT_MONTH: Self = Self {
        lower_bound: 0.0,
        initial_upper: 0.5,
        max_expansions: 30,
        iterations: 60,
        early_exit_tolerance: 1e-6,
    };

    /// Break-even annual reinvestment rate over the whole simulated schedule.
    pub const BREAK_EVEN_OVER_SCHEDULE: Self = Self {
        lower_bound: 0.0,
        initial_upper: 1.0,
        max_expansions: 20,
        iterations: 70,
        early_exit_tolerance: 1e-6,
    };
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self::IMPLIED_RATE
    }
}

/// Find `x ≥ lower_bound` with `objective(x) ≈ target`.
///
/// The direction of the search is inferred from the sign of
/// `objective(lower_bound) − target`, so the objective may be increasing or
/// decreasing as long as it is monotonic on the searched interval. Returns
/// `None` when a bracket cannot be established within `max_expansions`
/// doublings or when the objective turns non-finite.
pub fn solve_bracketed<F>(objective: F, target: f64, config: &BisectionConfig) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let residual = |x: f64| objective(x) - target;

    let mut low = config.lower_bound;
    let mut high = config.initial_upper;

    let mut f_low = residual(low);
    if !f_low.is_finite() {
        trace!(low, "objective not finite at lower bound");
        return None;
    }
    if f_low.abs() < config.early_exit_tolerance {
        return Some(low);
    }

    let mut f_high = residual(high);
    let mut expansions = 0;
    while f_high.is_finite() && f_low * f_high > 0.0 && expansions < config.max_expansions {
        high *= 2.0;
        f_high = residual(high);
        expansions += 1;
    }

    if !f_high.is_finite() || f_low * f_high > 0.0 {
        trace!(high, f_high, expansions, "could not bracket root");
        return None;
    }

    for _ in 0..config.iterations {
        let mid = (low + high) / 2.0;
        let f_mid = residual(mid);
        if !f_mid.is_finite() {
            trace!(mid, "objective not finite inside bracket");
            return None;
        }
        if f_low * f_mid <= 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    Some((low + high) / 2.0)
}

/// Monthly rate at which `principal` amortises over `months` with `payment`.
///
/// `None` for non-finite or non-positive inputs, and for a payment below the
/// zero-interest level `principal / months` (no non-negative rate fits).
pub fn implied_monthly_rate(principal: Money, months: f64, payment: Money) -> Option<Rate> {
    if !principal.is_finite() || !months.is_finite() || !payment.is_finite() {
        return None;
    }
    if payment <= 0.0 || principal <= 0.0 || months <= 0.0 {
        return None;
    }
    solve_bracketed(
        |rate| payment_from_rate(principal, rate, months).unwrap_or(f64::NAN),
        payment,
        &BisectionConfig::IMPLIED_RATE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CONFIG: BisectionConfig = BisectionConfig {
        lower_bound: 0.0,
        initial_upper: 0.5,
        max_expansions: 30,
        iterations: 60,
        early_exit_tolerance: 1e-6,
    };

    #[test]
    fn test_increasing_objective() {
        let root = solve_bracketed(|x| x * x, 2.0, &CONFIG).unwrap();
        assert_relative_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_decreasing_objective() {
        let root = solve_bracketed(|x| 10.0 - x, 7.5, &CONFIG).unwrap();
        assert_relative_eq!(root, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bracket_expansion() {
        // Root far beyond the initial upper bound of 0.5.
        let root = solve_bracketed(|x| x, 1000.0, &CONFIG).unwrap();
        assert_relative_eq!(root, 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_early_exit_at_lower_bound() {
        let root = solve_bracketed(|x| x + 5.0, 5.0, &CONFIG);
        assert_eq!(root, Some(0.0));
    }

    #[test]
    fn test_unbracketable_returns_none() {
        assert_eq!(solve_bracketed(|_| 1.0, 0.0, &CONFIG), None);
        // Root lies below the lower bound.
        assert_eq!(solve_bracketed(|x| x + 1.0, 0.0, &CONFIG), None);
    }

    #[test]
    fn test_non_finite_objective_returns_none() {
        assert_eq!(solve_bracketed(|_| f64::NAN, 0.0, &CONFIG), None);
        assert_eq!(
            solve_bracketed(|x| if x > 0.3 { f64::INFINITY } else { -1.0 }, 0.0, &CONFIG),
            None
        );
    }

    #[test]
    fn test_implied_rate_reproduces_payment() {
        let principal = 350_000.0;
        let payment = payment_from_rate(principal, 0.005, 360.0).unwrap();
        let rate = implied_monthly_rate(principal, 360.0, payment).unwrap();
        let recomputed = payment_from_rate(principal, rate, 360.0).unwrap();
        assert!((recomputed - payment).abs() / payment < 1e-4);
        assert_relative_eq!(rate, 0.005, epsilon = 1e-9);
    }

    #[test]
    fn test_implied_rate_zero_interest() {
        let rate = implied_monthly_rate(120_000.0, 240.0, 500.0).unwrap();
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn test_implied_rate_rejects_underpayment() {
        assert_eq!(implied_monthly_rate(120_000.0, 240.0, 400.0), None);
        assert_eq!(implied_monthly_rate(120_000.0, 240.0, 0.0), None);
        assert_eq!(implied_monthly_rate(-1.0, 240.0, 500.0), None);
    }
}

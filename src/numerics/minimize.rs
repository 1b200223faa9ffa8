use crate::errors::{PricingError, PricingResult};

/// 1/phi, the golden-section shrink factor.
const INV_GOLDEN: f64 = 0.618_033_988_749_894_9;

/// Budget and stopping rule for the 1-D minimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeSettings {
    /// Initial downhill step as a fraction of |x0| (absolute if x0 == 0).
    pub initial_step: f64,
    /// Stop when the bracket is narrower than rel_tol * (|lo| + |hi|).
    pub rel_tol: f64,
    /// Combined budget for bracketing and golden-section iterations.
    pub max_iterations: usize,
}

impl Default for MinimizeSettings {
    fn default() -> Self {
        Self {
            initial_step: 0.05,
            rel_tol: 1e-10,
            max_iterations: 500,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Minimum {
    pub x: f64,
    pub fx: f64,
    pub iterations: usize,
}

/// Local derivative-free minimizer started from a single guess.
///
/// Phase 1 walks downhill from x0 with doubling steps until the function
/// turns up, which brackets a local minimum. Phase 2 shrinks that bracket
/// by golden-section search. Both phases share one iteration budget;
/// exhausting it is `OptimizationDidNotConverge`.
pub fn minimize_from<F>(f: F, x0: f64, settings: &MinimizeSettings) -> PricingResult<Minimum>
where
    F: Fn(f64) -> f64,
{
    let budget = settings.max_iterations;
    let mut iterations = 0usize;

    let step = if x0 == 0.0 { settings.initial_step } else { settings.initial_step * x0.abs() };
    let (mut a, mut fa) = (x0, f(x0));
    let (mut b, mut fb) = (x0 + step, f(x0 + step));
    if fb > fa {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    // ── Bracket: a, b, c with f(b) <= f(a) and f(b) <= f(c) ──
    let mut h = b - a;
    let mut c = b + h;
    let mut fc = f(c);
    while fc < fb {
        iterations += 1;
        if iterations > budget || !c.is_finite() {
            return Err(PricingError::OptimizationDidNotConverge { iterations, residual: fb });
        }
        a = b;
        b = c;
        fb = fc;
        h *= 2.0;
        c = b + h;
        fc = f(c);
    }

    // ── Golden section on [lo, hi] ──
    let (mut lo, mut hi) = if a < c { (a, c) } else { (c, a) };
    let mut x1 = hi - INV_GOLDEN * (hi - lo);
    let mut x2 = lo + INV_GOLDEN * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    while hi - lo > settings.rel_tol * (lo.abs() + hi.abs()) {
        iterations += 1;
        if iterations > budget {
            return Err(PricingError::OptimizationDidNotConverge {
                iterations,
                residual: f1.min(f2),
            });
        }
        if f1 < f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_GOLDEN * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_GOLDEN * (hi - lo);
            f2 = f(x2);
        }
    }

    let x = 0.5 * (lo + hi);
    Ok(Minimum { x, fx: f(x), iterations })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parabola_from_either_side() {
        let f = |x: f64| (x - 3.0) * (x - 3.0) + 1.0;
        for x0 in [0.5, 2.9, 10.0, 250.0] {
            let m = minimize_from(f, x0, &MinimizeSettings::default()).unwrap();
            assert!((m.x - 3.0).abs() < 1e-6, "start {x0}: x={}", m.x);
            assert!((m.fx - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_squared_residual_root() {
        let f = |x: f64| if x <= 0.0 { f64::INFINITY } else { (x.ln() - 1.0).powi(2) };
        let m = minimize_from(f, 1.0, &MinimizeSettings::default()).unwrap();
        assert!((m.x - std::f64::consts::E).abs() < 1e-6, "x={}", m.x);
    }

    #[test]
    fn test_unbounded_descent_hits_budget() {
        let f = |x: f64| -x;
        let err = minimize_from(f, 1.0, &MinimizeSettings::default()).unwrap_err();
        assert!(matches!(err, PricingError::OptimizationDidNotConverge { .. }), "got {err}");
    }
}

use crate::errors::{PricingError, PricingResult};

#[derive(Debug, Clone, Copy)]
pub struct Root {
    pub x: f64,
    pub iterations: usize,
}

/// Inverts an increasing function by bisection: finds x in [lo, hi] with
/// |target - f(x)| < tol.
///
/// Short-circuits: target <= f(lo) returns lo, target >= f(hi) returns hi.
/// A bracket where f(lo) > f(hi) cannot hold an increasing function and is
/// a `ConvergenceFailure`, as is running past `max_iterations`.
pub fn invert_increasing<F>(
    f: F,
    target: f64,
    mut lo: f64,
    mut hi: f64,
    tol: f64,
    max_iterations: usize,
) -> PricingResult<Root>
where
    F: Fn(f64) -> PricingResult<f64>,
{
    let f_lo = f(lo)?;
    let f_hi = f(hi)?;
    if f_lo > f_hi {
        return Err(PricingError::ConvergenceFailure {
            iterations: 0,
            reason: format!("bracket is not increasing: f({lo})={f_lo} > f({hi})={f_hi}"),
        });
    }
    if target <= f_lo {
        return Ok(Root { x: lo, iterations: 0 });
    }
    if target >= f_hi {
        return Ok(Root { x: hi, iterations: 0 });
    }

    let mut iterations = 0usize;
    loop {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid)?;
        iterations += 1;
        let diff = target - f_mid;
        if diff.abs() < tol {
            return Ok(Root { x: mid, iterations });
        }
        if iterations >= max_iterations {
            return Err(PricingError::ConvergenceFailure {
                iterations,
                reason: format!("last x={mid}, |target - f(x)|={}", diff.abs()),
            });
        }
        if diff > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
}

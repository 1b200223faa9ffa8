use crate::contract::{ExerciseStyle, OptionContract, OptionKind};
use crate::errors::{PricingError, PricingResult};
use crate::models::{black_scholes, norm_cdf, require_diffusion, PricingModel, VolBracket};
use crate::numerics::{invert_increasing, minimize_from, MinimizeSettings};

/// Barone-Adesi-Whaley quadratic approximation for American exercise.
///
/// American = European + A * (S/S*)^q   while S is on the continuation side
/// of the critical price S*, and plain intrinsic beyond it.
///
/// n  = 2(r - q) / sigma^2
/// K_ = 2r / (sigma^2 (1 - e^{-rT}))
/// q2 = (1 - n + sqrt((n-1)^2 + 4K_)) / 2     (call)
/// q1 = (1 - n - sqrt((n-1)^2 + 4K_)) / 2     (put)
///
/// S* is found by minimizing the squared matching-condition residual starting
/// from the current spot. It is recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaroneAdesiWhaley {
    pub search: MinimizeSettings,
    /// Largest |residual| at S* accepted as a solution, relative to strike.
    pub residual_tol: f64,
}

impl Default for BaroneAdesiWhaley {
    fn default() -> Self {
        Self {
            search: MinimizeSettings::default(),
            residual_tol: 1e-6,
        }
    }
}

/// Where early exercise starts and the exponent/weight of the premium term.
#[derive(Debug, Clone, Copy)]
pub struct CriticalPrice {
    /// S*. Infinite when early exercise is never optimal.
    pub spot: f64,
    /// q2 for calls, q1 for puts.
    pub exponent: f64,
    /// A2 for calls, A1 for puts.
    pub weight: f64,
    /// False when no finite S* exists and the price is the European one.
    pub early_exercise: bool,
}

struct Coefficients {
    carry: f64,
    q2: f64,
    q1: f64,
}

fn coefficients(c: &OptionContract) -> Coefficients {
    let sigma_sq = c.volatility * c.volatility;
    let r = c.rate;
    let t = c.time_to_expiry;
    let n = 2.0 * (c.rate - c.dividend_yield) / sigma_sq;
    // r -> 0 limit of 2r / (1 - e^{-rT}) is 2 / T.
    let k_ = if r.abs() < 1e-12 {
        2.0 / (sigma_sq * t)
    } else {
        2.0 * r / (sigma_sq * (1.0 - (-r * t).exp()))
    };
    let root = ((n - 1.0) * (n - 1.0) + 4.0 * k_).sqrt();
    Coefficients {
        carry: (-c.dividend_yield * t).exp(),
        q2: 0.5 * (1.0 - n + root),
        q1: 0.5 * (1.0 - n - root),
    }
}

/// Matching-condition residual at a candidate S*. Infinite outside S* > 0.
fn residual(c: &OptionContract, coef: &Coefficients, candidate: f64) -> f64 {
    if !(candidate.is_finite() && candidate > 0.0) {
        return f64::INFINITY;
    }
    let at = c.with_spot(candidate);
    let Ok(euro) = black_scholes::price(&at) else {
        return f64::INFINITY;
    };
    let (d1, _) = black_scholes::d1_d2(&at);
    match c.kind {
        OptionKind::Call => {
            euro + (1.0 - coef.carry * norm_cdf(d1)) * candidate / coef.q2 - candidate + c.strike
        }
        OptionKind::Put => {
            euro - (1.0 - coef.carry * norm_cdf(-d1)) * candidate / coef.q1 + candidate - c.strike
        }
    }
}

/// Halvings (puts) or doublings (calls) allowed when bracketing S*.
const MAX_WIDENING: usize = 64;

/// Scales `start` by `factor` until the residual turns negative.
fn widen<F: Fn(f64) -> f64>(f: &F, start: f64, factor: f64) -> PricingResult<f64> {
    let mut x = start;
    for _ in 0..MAX_WIDENING {
        if f(x) < 0.0 {
            return Ok(x);
        }
        x *= factor;
    }
    Err(PricingError::OptimizationDidNotConverge {
        iterations: MAX_WIDENING,
        residual: f(x).abs(),
    })
}

impl BaroneAdesiWhaley {
    /// Early exercise never pays for a call without carry (q <= 0) or for a
    /// put when money earns nothing (r <= 0). No finite S* exists then.
    fn never_exercised(c: &OptionContract) -> bool {
        match c.kind {
            OptionKind::Call => c.dividend_yield <= 0.0,
            OptionKind::Put => c.rate <= 0.0,
        }
    }

    /// Bisection on the signed residual. It is positive at the strike and
    /// changes sign below it for a put and above it for a call.
    fn bracketed_root(&self, c: &OptionContract, coef: &Coefficients, tol: f64) -> PricingResult<(f64, usize)> {
        let k = c.strike;
        let f = |x: f64| residual(c, coef, x);
        let at_strike = f(k);
        if !(at_strike > 0.0) {
            return Err(PricingError::OptimizationDidNotConverge {
                iterations: 0,
                residual: at_strike.abs(),
            });
        }

        let (lo, hi, sign) = match c.kind {
            OptionKind::Put => (widen(&f, 0.5 * k, 0.5)?, k, 1.0),
            OptionKind::Call => (k, widen(&f, 2.0 * k, 2.0)?, -1.0),
        };
        let root = invert_increasing(|x| Ok(sign * f(x)), 0.0, lo, hi, tol, self.search.max_iterations)
            .map_err(|e| match e {
                PricingError::ConvergenceFailure { iterations, .. } => PricingError::OptimizationDidNotConverge {
                    iterations,
                    residual: f(lo).abs().min(f(hi).abs()),
                },
                other => other,
            })?;
        Ok((root.x, root.iterations))
    }

    /// Solves for S* and the premium coefficients. Requires sigma > 0, T > 0.
    pub fn critical_price(&self, c: &OptionContract) -> PricingResult<CriticalPrice> {
        require_diffusion(c, "BAW")?;
        if Self::never_exercised(c) {
            let sentinel = match c.kind {
                OptionKind::Call => f64::INFINITY,
                OptionKind::Put => 0.0,
            };
            return Ok(CriticalPrice {
                spot: sentinel,
                exponent: 0.0,
                weight: 0.0,
                early_exercise: false,
            });
        }

        let coef = coefficients(c);
        let tol = self.residual_tol * c.strike;
        let searched = minimize_from(
            |x| {
                let f = residual(c, &coef, x);
                f * f
            },
            c.spot,
            &self.search,
        );
        let (s_star, iterations) = match searched {
            Ok(minimum) if minimum.x.is_finite() && minimum.fx.sqrt() <= tol => (minimum.x, minimum.iterations),
            // Deep in the exercise region the residual is flat and the search
            // from spot stalls there.
            _ => self.bracketed_root(c, &coef, tol)?,
        };

        let (d1, _) = black_scholes::d1_d2(&c.with_spot(s_star));
        let (exponent, weight) = match c.kind {
            OptionKind::Call => (coef.q2, s_star * (1.0 - coef.carry * norm_cdf(d1)) / coef.q2),
            OptionKind::Put => (coef.q1, -s_star * (1.0 - coef.carry * norm_cdf(-d1)) / coef.q1),
        };
        tracing::debug!(
            kind = %c.kind,
            s_star,
            exponent,
            weight,
            iterations,
            "BAW critical price"
        );
        Ok(CriticalPrice {
            spot: s_star,
            exponent,
            weight,
            early_exercise: true,
        })
    }
}

impl PricingModel for BaroneAdesiWhaley {
    #[inline]
    fn name(&self) -> &'static str {
        "Barone-Adesi-Whaley"
    }

    fn exercise(&self) -> ExerciseStyle {
        ExerciseStyle::American
    }

    fn default_bracket(&self) -> VolBracket {
        VolBracket::new(0.0001, 1.0)
    }

    fn price(&self, c: &OptionContract) -> PricingResult<f64> {
        let critical = self.critical_price(c)?;
        let euro = black_scholes::price(c)?;
        if !critical.early_exercise {
            return Ok(euro);
        }
        let s = c.spot;
        let s_star = critical.spot;
        let value = match c.kind {
            OptionKind::Call if s < s_star => euro + critical.weight * (s / s_star).powf(critical.exponent),
            OptionKind::Call => s - c.strike,
            OptionKind::Put if s > s_star => euro + critical.weight * (s / s_star).powf(critical.exponent),
            OptionKind::Put => c.strike - s,
        };
        Ok(value)
    }
}

use crate::contract::{ExerciseStyle, OptionContract, OptionKind};
use crate::errors::{PricingError, PricingResult};
use crate::models::{payoff, require_diffusion, PricingModel, VolBracket};

/// Default number of tree steps.
pub const DEFAULT_STEPS: usize = 100;

/// Largest single tree: node prices use `powi`, which takes an `i32`.
const MAX_TREE_STEPS: usize = i32::MAX as usize;
/// Largest averaged step count; the N+1 tree must still fit.
pub const MAX_STEPS: usize = MAX_TREE_STEPS - 1;

fn check_steps(steps: usize, max: usize) -> PricingResult<()> {
    if steps < 1 || steps > max {
        return Err(PricingError::invalid(format!("binomial steps must be in [1, {max}], got {steps}")));
    }
    Ok(())
}

/// Cox-Ross-Rubinstein recombining tree for American exercise.
///
/// u = exp(sigma * sqrt(T/N)), d = 1/u
/// p = (e^{r T/N} - d) / (u - d)
///
/// The tree carries no dividend yield: the drift is the risk-free rate only,
/// which fits futures-style underlyings. Every price is the mean of the N-step
/// and (N+1)-step trees, which cancels most of the odd/even oscillation in N.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialLattice {
    steps: usize,
}

impl Default for BinomialLattice {
    fn default() -> Self {
        Self { steps: DEFAULT_STEPS }
    }
}

impl BinomialLattice {
    pub fn new(steps: usize) -> PricingResult<Self> {
        check_steps(steps, MAX_STEPS)?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Node arrays for one backward induction. Owned by a single pricing call.
struct LatticeState {
    /// Underlying price at each node of the current level.
    underlying: Vec<f64>,
    /// Option value at each node of the current level.
    values: Vec<f64>,
}

impl LatticeState {
    /// Terminal level: lowest node S d^N, each next node u^2 higher.
    fn terminal(spot: f64, strike: f64, kind: OptionKind, steps: usize, u: f64, d: f64) -> Self {
        let u_sq = u * u;
        let mut underlying = Vec::with_capacity(steps + 1);
        let mut node = spot * d.powi(steps as i32);
        for _ in 0..=steps {
            underlying.push(node);
            node *= u_sq;
        }
        let values = underlying.iter().map(|&s| payoff::intrinsic(kind, s, strike)).collect();
        Self { underlying, values }
    }

    /// Rolls the tree back to the root, taking the better of continuation and
    /// exercise at every node.
    fn roll_back(&mut self, strike: f64, kind: OptionKind, d: f64, p_up: f64, discount: f64) -> f64 {
        let steps = self.values.len() - 1;
        let p_down = 1.0 - p_up;
        for j in (1..=steps).rev() {
            for i in 0..j {
                let continuation = (p_up * self.values[i + 1] + p_down * self.values[i]) * discount;
                self.underlying[i] = d * self.underlying[i + 1];
                let exercise = payoff::intrinsic(kind, self.underlying[i], strike);
                self.values[i] = continuation.max(exercise);
            }
        }
        self.values[0]
    }
}

/// Single tree of exactly `steps` steps, no averaging.
pub fn price_single(
    spot: f64,
    strike: f64,
    sigma: f64,
    rate: f64,
    time: f64,
    kind: OptionKind,
    steps: usize,
) -> PricingResult<f64> {
    check_steps(steps, MAX_TREE_STEPS)?;
    let dt = time / steps as f64;
    let u = (sigma * dt.sqrt()).exp();
    let d = 1.0 / u;
    let growth = (rate * dt).exp();
    let p_up = (growth - d) / (u - d);
    if !p_up.is_finite() || !(0.0..=1.0).contains(&p_up) {
        return Err(PricingError::singular(format!(
            "risk-neutral probability {p_up} outside [0, 1] (sigma={sigma}, rate={rate}, steps={steps})"
        )));
    }

    let mut state = LatticeState::terminal(spot, strike, kind, steps, u, d);
    Ok(state.roll_back(strike, kind, d, p_up, 1.0 / growth))
}

/// American price: mean of the `steps` and `steps + 1` trees.
/// Requires sigma > 0 and T > 0; there is no dividend-yield parameter.
pub fn price(
    spot: f64,
    strike: f64,
    sigma: f64,
    rate: f64,
    time: f64,
    kind: OptionKind,
    steps: usize,
) -> PricingResult<f64> {
    check_steps(steps, MAX_STEPS)?;
    let a = price_single(spot, strike, sigma, rate, time, kind, steps)?;
    let b = price_single(spot, strike, sigma, rate, time, kind, steps + 1)?;
    Ok(0.5 * (a + b))
}

impl PricingModel for BinomialLattice {
    #[inline]
    fn name(&self) -> &'static str {
        "CRR-Binomial"
    }

    fn exercise(&self) -> ExerciseStyle {
        ExerciseStyle::American
    }

    fn default_bracket(&self) -> VolBracket {
        VolBracket::new(0.01, 3.0)
    }

    fn price(&self, c: &OptionContract) -> PricingResult<f64> {
        require_diffusion(c, "CRR-Binomial")?;
        if c.dividend_yield != 0.0 {
            return Err(PricingError::invalid(
                "binomial lattice has no dividend yield term; use BAW for carry",
            ));
        }
        price(c.spot, c.strike, c.volatility, c.rate, c.time_to_expiry, c.kind, self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes;

    #[test]
    fn test_converges_in_steps() {
        let coarse = price(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Call, 100).unwrap();
        let fine = price(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Call, 500).unwrap();
        assert!((coarse - fine).abs() < 1e-3, "N=100 {coarse} vs N=500 {fine}");
    }

    #[test]
    fn test_call_without_carry_matches_european() {
        // No dividends: early exercise of a call is never optimal.
        let lattice = price(5.0, 5.0, 0.1, 0.03, 0.4, OptionKind::Call, 100).unwrap();
        let euro = black_scholes::price(&OptionContract::call(5.0, 5.0, 0.1, 0.03, 0.4)).unwrap();
        assert!((lattice - euro).abs() < 1e-3, "lattice={lattice} euro={euro}");
    }

    #[test]
    fn test_american_put_at_least_european() {
        for s in [80.0, 90.0, 100.0, 110.0, 120.0] {
            let am = price(s, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, 100).unwrap();
            let eu = black_scholes::price(&OptionContract::put(s, 100.0, 0.2, 0.03, 0.5)).unwrap();
            assert!(am >= eu - 1e-3, "S={s}: american {am} < european {eu}");
            assert!(am >= payoff::intrinsic(OptionKind::Put, s, 100.0), "S={s}: below intrinsic");
        }
    }

    #[test]
    fn test_averaging_sits_between_trees() {
        let a = price_single(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, 100).unwrap();
        let b = price_single(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, 101).unwrap();
        let avg = price(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, 100).unwrap();
        assert!((avg - 0.5 * (a + b)).abs() < 1e-15);
        assert!(avg >= a.min(b) && avg <= a.max(b));
    }

    #[test]
    fn test_deep_itm_put_exercises_immediately() {
        let v = price(40.0, 100.0, 0.2, 0.05, 1.0, OptionKind::Put, 100).unwrap();
        assert!((v - 60.0).abs() < 1e-9, "deep ITM put={v}");
    }

    #[test]
    fn test_rejects_dividend_yield_and_zero_steps() {
        let c = OptionContract::put(100.0, 100.0, 0.2, 0.03, 0.5).with_dividend_yield(0.02);
        assert!(BinomialLattice::default().price(&c).is_err());
        assert!(BinomialLattice::new(0).is_err());
        assert!(price_single(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, 0).is_err());
    }

    #[test]
    fn test_rejects_oversized_step_counts() {
        assert!(BinomialLattice::new(MAX_STEPS).is_ok());
        assert!(BinomialLattice::new(MAX_STEPS + 1).is_err());
        assert!(BinomialLattice::new(usize::MAX).is_err());
        assert!(price(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, usize::MAX).is_err());
        assert!(price_single(100.0, 100.0, 0.2, 0.03, 0.5, OptionKind::Put, i32::MAX as usize + 1).is_err());
    }

    #[test]
    fn test_put_spot_sweep() {
        let mut prev = f64::INFINITY;
        for i in 0..61 {
            let s = 40.0 + i as f64 * 2.0;
            let am = price(s, 100.0, 0.25, 0.04, 0.75, OptionKind::Put, DEFAULT_STEPS).unwrap();
            let eu = black_scholes::price(&OptionContract::put(s, 100.0, 0.25, 0.04, 0.75)).unwrap();
            assert!(am >= eu - 1e-3, "S={s}: american {am} < european {eu}");
            assert!(am >= payoff::intrinsic(OptionKind::Put, s, 100.0) - 1e-12, "S={s}: below intrinsic");
            assert!(am <= prev + 1e-12, "put not decreasing in spot at {s}");
            prev = am;
        }
    }

    #[test]
    fn test_call_increasing_in_spot() {
        let mut prev = 0.0;
        for i in 0..61 {
            let s = 40.0 + i as f64 * 2.0;
            let v = price(s, 100.0, 0.25, 0.04, 0.75, OptionKind::Call, DEFAULT_STEPS).unwrap();
            assert!(v >= prev - 1e-12, "call not increasing in spot at {s}");
            prev = v;
        }
    }

    #[test]
    fn test_put_increasing_in_vol() {
        for s in [70.0, 90.0, 100.0, 115.0, 130.0] {
            let mut prev = 0.0;
            for i in 1..=40 {
                let sigma = i as f64 * 0.025;
                let v = price(s, 100.0, sigma, 0.04, 0.75, OptionKind::Put, DEFAULT_STEPS).unwrap();
                assert!(v >= prev - 1e-9, "S={s}: not increasing in sigma at {sigma}");
                prev = v;
            }
        }
    }

    #[test]
    fn test_single_step_tree() {
        // One step: u = e^{0.2}, p from r = 0; put pays only on the down node.
        let u = 0.2f64.exp();
        let d = 1.0 / u;
        let p = (1.0 - d) / (u - d);
        let expected = ((1.0 - p) * (100.0 - 100.0 * d)).max(0.0);
        let v = price_single(100.0, 100.0, 0.2, 0.0, 1.0, OptionKind::Put, 1).unwrap();
        assert!((v - expected).abs() < 1e-12, "one-step put={v}, expected {expected}");
    }
}

pub mod baw;
pub mod binomial;
pub mod black_scholes;
pub mod payoff;

use crate::contract::{ExerciseStyle, OptionContract, PricingMethod};
use crate::errors::{PricingError, PricingResult};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

pub use baw::BaroneAdesiWhaley;
pub use binomial::BinomialLattice;
pub use black_scholes::BlackScholes;

/// Search interval for implied volatility, [min, max].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolBracket {
    pub min: f64,
    pub max: f64,
}

impl VolBracket {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// All pricers implement this trait.
/// price() must be a pure function of the contract; no state is carried
/// between calls.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn exercise(&self) -> ExerciseStyle;

    /// Bracket used by the IV solver when the caller does not supply one.
    fn default_bracket(&self) -> VolBracket;

    /// Raw formula. Requires sigma > 0 and T > 0; anything else is a
    /// `DomainSingularity`.
    fn price(&self, contract: &OptionContract) -> PricingResult<f64>;

    /// Price with the boundary policy applied: intrinsic value at T = 0 and
    /// the deterministic limit at sigma = 0. Everything else goes to `price`.
    fn value(&self, contract: &OptionContract) -> PricingResult<f64> {
        contract.validate()?;
        if contract.time_to_expiry == 0.0 {
            return Ok(payoff::intrinsic(contract.kind, contract.spot, contract.strike));
        }
        if contract.volatility == 0.0 {
            return Ok(no_volatility_limit(contract, self.exercise()));
        }
        self.price(contract)
    }
}

/// Closed set of pricer families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Model {
    European(BlackScholes),
    AmericanLattice(BinomialLattice),
    AmericanBaw(BaroneAdesiWhaley),
}

impl Model {
    pub fn european() -> Self {
        Model::European(BlackScholes)
    }

    pub fn american(method: PricingMethod) -> PricingResult<Self> {
        match method {
            PricingMethod::Lattice { steps } => Ok(Model::AmericanLattice(BinomialLattice::new(steps)?)),
            PricingMethod::Baw => Ok(Model::AmericanBaw(BaroneAdesiWhaley::default())),
        }
    }

    pub fn for_style(style: ExerciseStyle, method: PricingMethod) -> PricingResult<Self> {
        match style {
            ExerciseStyle::European => Ok(Self::european()),
            ExerciseStyle::American => Self::american(method),
        }
    }

    fn inner(&self) -> &dyn PricingModel {
        match self {
            Model::European(m) => m,
            Model::AmericanLattice(m) => m,
            Model::AmericanBaw(m) => m,
        }
    }
}

impl PricingModel for Model {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn exercise(&self) -> ExerciseStyle {
        self.inner().exercise()
    }

    fn default_bracket(&self) -> VolBracket {
        self.inner().default_bracket()
    }

    fn price(&self, contract: &OptionContract) -> PricingResult<f64> {
        self.inner().price(contract)
    }
}

// ── Shared numerics ──

#[inline]
pub(crate) fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

#[inline]
pub(crate) fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// Rejects inputs the closed forms divide by.
pub(crate) fn require_diffusion(contract: &OptionContract, model: &str) -> PricingResult<()> {
    contract.validate()?;
    if contract.volatility == 0.0 {
        return Err(PricingError::singular(format!("{model}: volatility is zero")));
    }
    if contract.time_to_expiry == 0.0 {
        return Err(PricingError::singular(format!("{model}: time to expiry is zero")));
    }
    Ok(())
}

/// Value as sigma -> 0: the underlying drifts deterministically at r - q, so
/// the discounted payoff from exercising at time t is
/// phi * (S e^{-qt} - K e^{-rt}).
/// European exercise takes t = T. American exercise takes the best t in
/// [0, T]; the only interior candidate is where the derivative vanishes.
pub(crate) fn no_volatility_limit(contract: &OptionContract, exercise: ExerciseStyle) -> f64 {
    let s = contract.spot;
    let k = contract.strike;
    let r = contract.rate;
    let q = contract.dividend_yield;
    let t_max = contract.time_to_expiry;
    let phi = payoff::phi(contract.kind);
    let discounted = |t: f64| (phi * (s * (-q * t).exp() - k * (-r * t).exp())).max(0.0);

    match exercise {
        ExerciseStyle::European => discounted(t_max),
        ExerciseStyle::American => {
            let mut best = discounted(0.0).max(discounted(t_max));
            // q S e^{-qt} = r K e^{-rt}  =>  t* = ln(q S / (r K)) / (q - r)
            if q > 0.0 && r > 0.0 && (q - r).abs() > 1e-12 {
                let t_star = (q * s / (r * k)).ln() / (q - r);
                if t_star > 0.0 && t_star < t_max {
                    best = best.max(discounted(t_star));
                }
            }
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_helpers() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((norm_pdf(0.0) - 0.398_942_280_4).abs() < 1e-9);
    }

    #[test]
    fn test_value_at_expiry_is_intrinsic() {
        let c = OptionContract::put(90.0, 100.0, 0.3, 0.03, 0.0);
        for model in [
            Model::european(),
            Model::american(PricingMethod::Baw).unwrap(),
            Model::american(PricingMethod::Lattice { steps: 50 }).unwrap(),
        ] {
            let v = model.value(&c).unwrap();
            assert!((v - 10.0).abs() < 1e-12, "{} at expiry = {v}", model.name());
        }
    }

    #[test]
    fn test_raw_price_rejects_singular_inputs() {
        let c = OptionContract::call(100.0, 100.0, 0.0, 0.03, 0.5);
        let err = Model::european().price(&c).unwrap_err();
        assert!(matches!(err, PricingError::DomainSingularity(_)), "got {err}");
    }

    #[test]
    fn test_no_vol_limit_european_call() {
        let c = OptionContract::call(100.0, 95.0, 0.0, 0.03, 1.0);
        let v = Model::european().value(&c).unwrap();
        let expected = 100.0 - 95.0 * (-0.03f64).exp();
        assert!((v - expected).abs() < 1e-12, "got {v}, expected {expected}");
    }

    #[test]
    fn test_no_vol_limit_american_put_exercises_now() {
        // Deterministic growth makes waiting worthless for an ITM put with r > 0.
        let c = OptionContract::put(90.0, 100.0, 0.0, 0.05, 1.0);
        let v = no_volatility_limit(&c, ExerciseStyle::American);
        assert!((v - 10.0).abs() < 1e-12, "got {v}");
        let e = no_volatility_limit(&c, ExerciseStyle::European);
        assert!(e < v, "european {e} should be below american {v}");
    }

    #[test]
    fn test_model_dispatch_names() {
        assert_eq!(Model::european().exercise(), ExerciseStyle::European);
        let lattice = Model::for_style(ExerciseStyle::American, PricingMethod::Lattice { steps: 10 }).unwrap();
        assert_eq!(lattice.exercise(), ExerciseStyle::American);
        assert_eq!(lattice.name(), "CRR-Binomial");
        assert!(Model::american(PricingMethod::Lattice { steps: 0 }).is_err());
    }
}

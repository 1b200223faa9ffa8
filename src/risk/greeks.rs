use crate::contract::{OptionContract, OptionKind};
use crate::errors::PricingResult;
use crate::models::PricingModel;
use serde::{Deserialize, Serialize};

/// Spot bump for delta and gamma, in spot units.
const SPOT_BUMP: f64 = 0.01;
/// Volatility bump for vega.
const VOL_BUMP: f64 = 0.01;
/// Below this sigma, vega is reported as zero instead of bumped.
const VEGA_VOL_FLOOR: f64 = 0.02;
/// Rate bump for rho.
const RATE_BUMP: f64 = 0.001;
/// One calendar day in years.
const ONE_DAY: f64 = 1.0 / 365.0;
/// Time used in place of expiry when less than a day remains.
const NEAR_EXPIRY: f64 = 0.0001;

/// Option sensitivities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// dV/dS
    pub delta: f64,
    /// d²V/dS²
    pub gamma: f64,
    /// Value change over one day (estimator) or dV/dt per year (analytic).
    pub theta: f64,
    /// dV/dsigma, per unit of volatility
    pub vega: f64,
    /// dV/dr, per unit of rate
    pub rho: f64,
}

/// Bump-and-reprice sensitivities over any pricer.
///
/// Every bumped price goes through `PricingModel::value`, so the T = 0 and
/// sigma = 0 boundary policy applies to bumped inputs as well. Correctness is
/// delegated entirely to the wrapped pricer.
///
/// The spot bump is a fixed 0.01, so delta and gamma need spot > 0.01. At or
/// below that the down bump is not a valid contract and they return
/// `InvalidInput`.
pub struct GreeksEstimator<'a, M: PricingModel + ?Sized> {
    model: &'a M,
}

impl<'a, M: PricingModel + ?Sized> GreeksEstimator<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// All five Greeks at a point.
    pub fn greeks(&self, c: &OptionContract) -> PricingResult<Greeks> {
        c.validate()?;
        Ok(Greeks {
            delta: self.delta(c)?,
            gamma: self.gamma(c)?,
            theta: self.theta(c)?,
            vega: self.vega(c)?,
            rho: self.rho(c)?,
        })
    }

    /// Central difference in spot. At expiry: the slope of the payoff kink,
    /// split evenly at the money.
    pub fn delta(&self, c: &OptionContract) -> PricingResult<f64> {
        if c.time_to_expiry == 0.0 {
            return Ok(expiry_delta(c.kind, c.spot, c.strike));
        }
        let up = self.model.value(&c.with_spot(c.spot + SPOT_BUMP))?;
        let down = self.model.value(&c.with_spot(c.spot - SPOT_BUMP))?;
        Ok((up - down) / (2.0 * SPOT_BUMP))
    }

    /// Second central difference in spot. At expiry: infinite at the money,
    /// zero elsewhere.
    pub fn gamma(&self, c: &OptionContract) -> PricingResult<f64> {
        if c.time_to_expiry == 0.0 {
            return Ok(if c.spot == c.strike { f64::INFINITY } else { 0.0 });
        }
        let up = self.model.value(&c.with_spot(c.spot + SPOT_BUMP))?;
        let down = self.model.value(&c.with_spot(c.spot - SPOT_BUMP))?;
        let mid = self.model.value(c)?;
        Ok((up + down - 2.0 * mid) / (SPOT_BUMP * SPOT_BUMP))
    }

    /// One-day decay. Inside the last day, decays to a small positive time
    /// instead of to expiry.
    pub fn theta(&self, c: &OptionContract) -> PricingResult<f64> {
        let later = if c.time_to_expiry <= ONE_DAY {
            NEAR_EXPIRY
        } else {
            c.time_to_expiry - ONE_DAY
        };
        let now = self.model.value(c)?;
        Ok(self.model.value(&c.with_time(later))? - now)
    }

    pub fn vega(&self, c: &OptionContract) -> PricingResult<f64> {
        if c.volatility < VEGA_VOL_FLOOR {
            return Ok(0.0);
        }
        let up = self.model.value(&c.with_volatility(c.volatility + VOL_BUMP))?;
        let down = self.model.value(&c.with_volatility(c.volatility - VOL_BUMP))?;
        Ok((up - down) / (2.0 * VOL_BUMP))
    }

    pub fn rho(&self, c: &OptionContract) -> PricingResult<f64> {
        let up = self.model.value(&c.with_rate(c.rate + RATE_BUMP))?;
        let down = self.model.value(&c.with_rate(c.rate - RATE_BUMP))?;
        Ok((up - down) / (2.0 * RATE_BUMP))
    }
}

#[inline]
fn expiry_delta(kind: OptionKind, spot: f64, strike: f64) -> f64 {
    match kind {
        OptionKind::Call if spot > strike => 1.0,
        OptionKind::Call if spot == strike => 0.5,
        OptionKind::Call => 0.0,
        OptionKind::Put if spot > strike => 0.0,
        OptionKind::Put if spot == strike => -0.5,
        OptionKind::Put => -1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::PricingMethod;
    use crate::models::{black_scholes, BinomialLattice, BlackScholes, Model};

    #[test]
    fn test_expiry_boundary_values() {
        let model = Model::european();
        let est = GreeksEstimator::new(&model);
        let atm = OptionContract::call(100.0, 100.0, 0.2, 0.03, 0.0);
        assert_eq!(est.delta(&atm).unwrap(), 0.5);
        assert_eq!(est.delta(&atm.with_spot(110.0)).unwrap(), 1.0);
        assert_eq!(est.delta(&atm.with_spot(90.0)).unwrap(), 0.0);
        assert_eq!(est.gamma(&atm).unwrap(), f64::INFINITY);
        assert_eq!(est.gamma(&atm.with_spot(110.0)).unwrap(), 0.0);

        let put = OptionContract::put(100.0, 100.0, 0.2, 0.03, 0.0);
        assert_eq!(est.delta(&put).unwrap(), -0.5);
        assert_eq!(est.delta(&put.with_spot(90.0)).unwrap(), -1.0);
        assert_eq!(est.delta(&put.with_spot(110.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_matches_analytic_european() {
        let c = OptionContract::call(100.0, 100.0, 0.2, 0.03, 0.5).with_dividend_yield(0.01);
        let bumped = GreeksEstimator::new(&BlackScholes).greeks(&c).unwrap();
        let exact = black_scholes::analytic_greeks(&c).unwrap();
        assert!((bumped.delta - exact.delta).abs() < 1e-6, "delta {} vs {}", bumped.delta, exact.delta);
        assert!((bumped.gamma - exact.gamma).abs() < 1e-4, "gamma {} vs {}", bumped.gamma, exact.gamma);
        assert!((bumped.vega - exact.vega).abs() < 1e-2, "vega {} vs {}", bumped.vega, exact.vega);
        assert!((bumped.rho - exact.rho).abs() < 1e-3, "rho {} vs {}", bumped.rho, exact.rho);
        let daily = exact.theta / 365.0;
        assert!((bumped.theta - daily).abs() < 1e-3, "theta {} vs {}", bumped.theta, daily);
    }

    #[test]
    fn test_vega_floor() {
        let c = OptionContract::put(100.0, 100.0, 0.015, 0.03, 0.5);
        assert_eq!(GreeksEstimator::new(&BlackScholes).vega(&c).unwrap(), 0.0);
    }

    #[test]
    fn test_theta_inside_last_day() {
        let c = OptionContract::call(100.0, 100.0, 0.2, 0.03, 0.5 / 365.0);
        let theta = GreeksEstimator::new(&BlackScholes).theta(&c).unwrap();
        let now = black_scholes::price(&c).unwrap();
        let near = black_scholes::price(&c.with_time(0.0001)).unwrap();
        assert!((theta - (near - now)).abs() < 1e-15);
        assert!(theta < 0.0);
    }

    #[test]
    fn test_theta_at_expiry_uses_intrinsic() {
        let c = OptionContract::call(110.0, 100.0, 0.2, 0.03, 0.0);
        let theta = GreeksEstimator::new(&BlackScholes).theta(&c).unwrap();
        let near = black_scholes::price(&c.with_time(0.0001)).unwrap();
        assert!((theta - (near - 10.0)).abs() < 1e-12, "theta={theta}");
    }

    #[test]
    fn test_lattice_put_greeks() {
        let lattice = BinomialLattice::default();
        let c = OptionContract::put(100.0, 100.0, 0.2, 0.03, 0.5);
        let g = GreeksEstimator::new(&lattice).greeks(&c).unwrap();
        let euro = black_scholes::analytic_greeks(&c).unwrap();
        assert!(g.delta < 0.0 && g.delta > -1.0, "delta={}", g.delta);
        assert!((g.delta - euro.delta).abs() < 0.1, "lattice delta {} vs european {}", g.delta, euro.delta);
        assert!(g.vega > 0.0, "vega={}", g.vega);
        assert!(g.rho < 0.0, "rho={}", g.rho);
        assert!(g.theta < 0.0, "theta={}", g.theta);
    }

    #[test]
    fn test_baw_through_model_dispatch() {
        let model = Model::american(PricingMethod::Baw).unwrap();
        let c = OptionContract::put(100.0, 100.0, 0.25, 0.03, 1.0);
        let g = GreeksEstimator::new(&model).greeks(&c).unwrap();
        assert!(g.delta < 0.0 && g.delta > -1.0, "delta={}", g.delta);
        assert!(g.gamma > 0.0, "gamma={}", g.gamma);
        assert!(g.vega > 0.0, "vega={}", g.vega);
    }

    #[test]
    fn test_spot_must_exceed_bump() {
        let tiny = OptionContract::call(0.005, 0.005, 0.2, 0.03, 0.5);
        let est = GreeksEstimator::new(&BlackScholes);
        assert!(matches!(est.greeks(&tiny), Err(crate::errors::PricingError::InvalidInput(_))));
        let g = est.greeks(&OptionContract::call(0.02, 0.02, 0.2, 0.03, 0.5)).unwrap();
        assert!(g.delta > 0.0 && g.delta < 1.0, "delta={}", g.delta);
    }

    #[test]
    fn test_zero_vol_delta_uses_limit() {
        let c = OptionContract::call(110.0, 100.0, 0.0, 0.03, 0.5);
        let d = GreeksEstimator::new(&BlackScholes).delta(&c).unwrap();
        assert!((d - 1.0).abs() < 1e-9, "deterministic ITM call delta={d}");
    }
}

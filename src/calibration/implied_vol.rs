use crate::contract::{OptionContract, OptionKind};
use crate::errors::{PricingError, PricingResult};
use crate::models::{PricingModel, VolBracket};
use crate::numerics::invert_increasing;

pub const DEFAULT_TOLERANCE: f64 = 1e-5;
pub const DEFAULT_RATE: f64 = 0.03;
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// An observed price to invert into volatility, with the contract terms
/// other than sigma.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpliedVolQuery {
    pub observed_price: f64,
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub kind: OptionKind,
    pub rate: f64,
    pub dividend_yield: f64,
    /// None uses the pricer's default bracket.
    pub bracket: Option<VolBracket>,
    /// Stop when |observed - price(sigma)| falls below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ImpliedVolQuery {
    pub fn new(observed_price: f64, spot: f64, strike: f64, time_to_expiry: f64, kind: OptionKind) -> Self {
        Self {
            observed_price,
            spot,
            strike,
            time_to_expiry,
            kind,
            rate: DEFAULT_RATE,
            dividend_yield: 0.0,
            bracket: None,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_rate(self, rate: f64) -> Self {
        Self { rate, ..self }
    }

    pub fn with_dividend_yield(self, dividend_yield: f64) -> Self {
        Self { dividend_yield, ..self }
    }

    pub fn with_bracket(self, min: f64, max: f64) -> Self {
        Self {
            bracket: Some(VolBracket::new(min, max)),
            ..self
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self { max_iterations, ..self }
    }

    /// Contract at a trial volatility.
    #[inline]
    pub fn contract(&self, volatility: f64) -> OptionContract {
        OptionContract::new(self.spot, self.strike, volatility, self.rate, self.time_to_expiry, self.kind)
            .with_dividend_yield(self.dividend_yield)
    }
}

/// Bisection on price(sigma) = observed price.
///
/// Price is assumed increasing in sigma over the bracket. An observed price
/// at or below price(min) returns min; at or above price(max) returns max.
pub fn implied_volatility<M: PricingModel + ?Sized>(model: &M, query: &ImpliedVolQuery) -> PricingResult<f64> {
    let bracket = query.bracket.unwrap_or_else(|| model.default_bracket());
    if !(bracket.min >= 0.0 && bracket.max > bracket.min && bracket.max.is_finite()) {
        return Err(PricingError::invalid(format!(
            "volatility bracket [{}, {}] is not a valid interval",
            bracket.min, bracket.max
        )));
    }
    if !query.observed_price.is_finite() {
        return Err(PricingError::invalid("observed price must be finite"));
    }
    if !(query.tolerance > 0.0) {
        return Err(PricingError::invalid("tolerance must be positive"));
    }
    query.contract(bracket.min).validate()?;

    let price_at = |sigma: f64| model.value(&query.contract(sigma));
    let root = invert_increasing(
        price_at,
        query.observed_price,
        bracket.min,
        bracket.max,
        query.tolerance,
        query.max_iterations,
    )?;
    tracing::debug!(
        model = model.name(),
        observed = query.observed_price,
        sigma = root.x,
        iterations = root.iterations,
        "implied volatility"
    );
    Ok(root.x)
}

/// Call IV from positional terms, using the pricer's
/// default bracket and tolerance.
pub fn call_iv<M: PricingModel + ?Sized>(
    model: &M,
    observed_price: f64,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
) -> PricingResult<f64> {
    let query = ImpliedVolQuery::new(observed_price, spot, strike, time_to_expiry, OptionKind::Call).with_rate(rate);
    implied_volatility(model, &query)
}

pub fn put_iv<M: PricingModel + ?Sized>(
    model: &M,
    observed_price: f64,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
) -> PricingResult<f64> {
    let query = ImpliedVolQuery::new(observed_price, spot, strike, time_to_expiry, OptionKind::Put).with_rate(rate);
    implied_volatility(model, &query)
}

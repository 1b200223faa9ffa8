use crate::contract::{ExerciseStyle, OptionContract, OptionKind};
use crate::errors::PricingResult;
use crate::models::{norm_cdf, norm_pdf, payoff, require_diffusion, PricingModel, VolBracket};
use crate::risk::Greeks;

/// Black-Scholes-Merton closed form for European exercise.
///
/// d1 = (ln(S/K) + (r - q + sigma^2/2) * T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
///
/// Call = S e^{-qT} Phi(d1) - K e^{-rT} Phi(d2), put by parity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlackScholes;

/// d1 and d2 for a contract. Caller guarantees sigma > 0 and T > 0.
#[inline]
pub fn d1_d2(c: &OptionContract) -> (f64, f64) {
    let sigma_sqrt_t = c.volatility * c.time_to_expiry.sqrt();
    let d1 = ((c.spot / c.strike).ln()
        + (c.rate - c.dividend_yield + 0.5 * c.volatility * c.volatility) * c.time_to_expiry)
        / sigma_sqrt_t;
    (d1, d1 - sigma_sqrt_t)
}

/// Closed-form price. Zero sigma or zero T is a `DomainSingularity`.
pub fn price(c: &OptionContract) -> PricingResult<f64> {
    require_diffusion(c, "Black-Scholes")?;
    let (d1, d2) = d1_d2(c);
    let phi = payoff::phi(c.kind);
    let carry = (-c.dividend_yield * c.time_to_expiry).exp();
    let df = (-c.rate * c.time_to_expiry).exp();
    let value = phi * (c.spot * carry * norm_cdf(phi * d1) - c.strike * df * norm_cdf(phi * d2));
    // Round-off can push deep OTM values a hair below zero.
    Ok(value.max(0.0))
}

/// Analytic sensitivities of the closed form.
///
/// Units: delta and gamma per unit spot, vega per unit sigma, rho per unit
/// rate, theta as dV/dt per year (negative for a decaying long option).
/// The bump-and-reprice estimator reports theta per calendar day instead.
pub fn analytic_greeks(c: &OptionContract) -> PricingResult<Greeks> {
    require_diffusion(c, "Black-Scholes")?;
    let (d1, d2) = d1_d2(c);
    let t = c.time_to_expiry;
    let sqrt_t = t.sqrt();
    let carry = (-c.dividend_yield * t).exp();
    let df = (-c.rate * t).exp();
    let pdf_d1 = norm_pdf(d1);

    let gamma = carry * pdf_d1 / (c.spot * c.volatility * sqrt_t);
    let vega = c.spot * carry * pdf_d1 * sqrt_t;
    let decay = -c.spot * carry * pdf_d1 * c.volatility / (2.0 * sqrt_t);

    let greeks = match c.kind {
        OptionKind::Call => Greeks {
            delta: carry * norm_cdf(d1),
            gamma,
            theta: decay - c.rate * c.strike * df * norm_cdf(d2)
                + c.dividend_yield * c.spot * carry * norm_cdf(d1),
            vega,
            rho: c.strike * t * df * norm_cdf(d2),
        },
        OptionKind::Put => Greeks {
            delta: carry * (norm_cdf(d1) - 1.0),
            gamma,
            theta: decay + c.rate * c.strike * df * norm_cdf(-d2)
                - c.dividend_yield * c.spot * carry * norm_cdf(-d1),
            vega,
            rho: -c.strike * t * df * norm_cdf(-d2),
        },
    };
    Ok(greeks)
}

impl PricingModel for BlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn exercise(&self) -> ExerciseStyle {
        ExerciseStyle::European
    }

    fn default_bracket(&self) -> VolBracket {
        VolBracket::new(0.01, 1.0)
    }

    fn price(&self, contract: &OptionContract) -> PricingResult<f64> {
        price(contract)
    }
}

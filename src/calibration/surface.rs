use crate::calibration::implied_vol::{implied_volatility, ImpliedVolQuery};
use crate::calibration::series::SolveSettings;
use crate::contract::OptionKind;
use crate::errors::{PricingError, PricingResult};
use crate::models::PricingModel;
use crate::risk::{Greeks, GreeksEstimator};
use serde::{Deserialize, Serialize};

/// One line of an option chain snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    pub strike: f64,
    pub days_to_expiry: u32,
    pub kind: OptionKind,
    pub bid: f64,
    pub ask: f64,
}

impl ChainQuote {
    #[inline]
    pub fn mid(&self) -> f64 {
        0.5 * (self.bid + self.ask)
    }

    #[inline]
    pub fn years_to_expiry(&self) -> f64 {
        self.days_to_expiry as f64 / 365.0
    }
}

/// Solved grid node: volatility and Greeks at the quote's mid price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub strike: f64,
    pub days_to_expiry: u32,
    pub kind: OptionKind,
    pub mid: f64,
    pub implied_vol: Option<f64>,
    pub greeks: Option<Greeks>,
    pub error: Option<String>,
}

/// Solves every quote of a chain snapshot against one spot.
/// Output is sorted by expiry, then strike, calls before puts.
pub fn chain_snapshot<M: PricingModel + ?Sized>(
    model: &M,
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    quotes: &[ChainQuote],
    settings: &SolveSettings,
) -> PricingResult<Vec<SurfacePoint>> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(PricingError::invalid(format!("spot must be positive, got {spot}")));
    }

    let mut points: Vec<SurfacePoint> = quotes
        .iter()
        .map(|quote| {
            let mid = quote.mid();
            let mut point = SurfacePoint {
                strike: quote.strike,
                days_to_expiry: quote.days_to_expiry,
                kind: quote.kind,
                mid,
                implied_vol: None,
                greeks: None,
                error: None,
            };
            let query = ImpliedVolQuery::new(mid, spot, quote.strike, quote.years_to_expiry(), quote.kind)
                .with_rate(rate)
                .with_dividend_yield(dividend_yield);
            let query = settings.apply(query);
            let solved = implied_volatility(model, &query)
                .and_then(|sigma| Ok((sigma, GreeksEstimator::new(model).greeks(&query.contract(sigma))?)));
            match solved {
                Ok((sigma, greeks)) => {
                    point.implied_vol = Some(sigma);
                    point.greeks = Some(greeks);
                }
                Err(e) => {
                    tracing::warn!(strike = quote.strike, days = quote.days_to_expiry, "chain quote failed: {e}");
                    point.error = Some(e.to_string());
                }
            }
            point
        })
        .collect();

    points.sort_by(|a, b| {
        a.days_to_expiry
            .cmp(&b.days_to_expiry)
            .then(a.strike.total_cmp(&b.strike))
            .then((a.kind == OptionKind::Put).cmp(&(b.kind == OptionKind::Put)))
    });
    Ok(points)
}

use crate::calibration::implied_vol::{implied_volatility, ImpliedVolQuery};
use crate::contract::OptionKind;
use crate::errors::PricingResult;
use crate::models::{PricingModel, VolBracket};
use crate::risk::{Greeks, GreeksEstimator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prices at or below this are treated as missing quotes.
const MIN_QUOTE: f64 = 0.00001;

/// Calendar days between two dates, ACT/365.
#[inline]
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days().abs() as f64 / 365.0
}

/// One date-aligned close of the option and its underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub option_price: f64,
    pub spot_price: f64,
}

/// Fixed terms of the contract behind a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesTerms {
    pub strike: f64,
    pub expiry: NaiveDate,
    pub kind: OptionKind,
    pub rate: f64,
    #[serde(default)]
    pub dividend_yield: f64,
}

/// Solver controls shared by every point of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveSettings {
    pub bracket: Option<VolBracket>,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            bracket: None,
            tolerance: super::implied_vol::DEFAULT_TOLERANCE,
            max_iterations: super::implied_vol::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolveSettings {
    pub(crate) fn apply(&self, query: ImpliedVolQuery) -> ImpliedVolQuery {
        let query = query.with_tolerance(self.tolerance).with_max_iterations(self.max_iterations);
        match self.bracket {
            Some(b) => query.with_bracket(b.min, b.max),
            None => query,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub years_to_expiry: f64,
    pub option_price: f64,
    pub spot_price: f64,
    pub implied_vol: Option<f64>,
    pub greeks: Option<Greeks>,
    /// Why this point has no volatility, when it has none.
    pub error: Option<String>,
}

/// Implied volatility and Greeks for each observation of one contract.
///
/// Missing quotes and per-point solver failures are reported on the point
/// and do not stop the series.
pub fn implied_vol_series<M: PricingModel + ?Sized>(
    model: &M,
    observations: &[Observation],
    terms: &SeriesTerms,
    settings: &SolveSettings,
) -> Vec<SeriesPoint> {
    observations
        .iter()
        .map(|obs| {
            let years = years_between(obs.date, terms.expiry);
            let mut point = SeriesPoint {
                date: obs.date,
                years_to_expiry: years,
                option_price: obs.option_price,
                spot_price: obs.spot_price,
                implied_vol: None,
                greeks: None,
                error: None,
            };
            if obs.date > terms.expiry {
                point.error = Some(format!("observation after expiry {}", terms.expiry));
                return point;
            }
            if !(obs.option_price > MIN_QUOTE && obs.spot_price > MIN_QUOTE) {
                point.error = Some("missing quote".to_string());
                return point;
            }
            match solve_point(model, obs, years, terms, settings) {
                Ok((sigma, greeks)) => {
                    point.implied_vol = Some(sigma);
                    point.greeks = Some(greeks);
                }
                Err(e) => {
                    tracing::warn!(date = %obs.date, model = model.name(), "series point failed: {e}");
                    point.error = Some(e.to_string());
                }
            }
            point
        })
        .collect()
}

fn solve_point<M: PricingModel + ?Sized>(
    model: &M,
    obs: &Observation,
    years: f64,
    terms: &SeriesTerms,
    settings: &SolveSettings,
) -> PricingResult<(f64, Greeks)> {
    let query = ImpliedVolQuery::new(obs.option_price, obs.spot_price, terms.strike, years, terms.kind)
        .with_rate(terms.rate)
        .with_dividend_yield(terms.dividend_yield);
    let query = settings.apply(query);
    let sigma = implied_volatility(model, &query)?;
    let greeks = GreeksEstimator::new(model).greeks(&query.contract(sigma))?;
    Ok((sigma, greeks))
}

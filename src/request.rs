use crate::calibration::{
    chain_snapshot, implied_vol_series, implied_volatility, ChainQuote, ImpliedVolQuery, Observation, SeriesTerms,
};
use crate::config::EngineConfig;
use crate::contract::{OptionContract, OptionKind};
use crate::errors::PricingResult;
use crate::models::PricingModel;
use crate::risk::GreeksEstimator;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Read;

// ── Messages INTO the driver (one JSON document on stdin) ──

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Price {
        contract: OptionContract,
    },
    Greeks {
        contract: OptionContract,
    },
    ImpliedVol {
        observed_price: f64,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        kind: OptionKind,
        rate: Option<f64>,
    },
    Series {
        terms: SeriesTerms,
        observations: Vec<Observation>,
    },
    Surface {
        spot: f64,
        quotes: Vec<ChainQuote>,
    },
}

/// Reads a single request document from `reader` (stdin for the driver).
pub fn read_request<R: Read>(mut reader: R) -> PricingResult<Request> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}

/// Evaluates one request with the configured pricer and returns the JSON
/// response body.
pub fn handle(cfg: &EngineConfig, request: &Request) -> PricingResult<Value> {
    let model = cfg.model()?;
    let settings = cfg.solve_settings();
    tracing::debug!(model = model.name(), ?request, "handling request");

    let body = match request {
        Request::Price { contract } => json!({
            "model": model.name(),
            "price": model.value(contract)?,
        }),
        Request::Greeks { contract } => json!({
            "model": model.name(),
            "greeks": GreeksEstimator::new(&model).greeks(contract)?,
        }),
        Request::ImpliedVol {
            observed_price,
            spot,
            strike,
            time_to_expiry,
            kind,
            rate,
        } => {
            let query = ImpliedVolQuery::new(*observed_price, *spot, *strike, *time_to_expiry, *kind)
                .with_rate(rate.unwrap_or(cfg.risk_free_rate))
                .with_dividend_yield(cfg.dividend_yield);
            let query = settings.apply(query);
            json!({
                "model": model.name(),
                "implied_vol": implied_volatility(&model, &query)?,
            })
        }
        Request::Series { terms, observations } => json!({
            "model": model.name(),
            "points": implied_vol_series(&model, observations, terms, &settings),
        }),
        Request::Surface { spot, quotes } => json!({
            "model": model.name(),
            "points": chain_snapshot(&model, *spot, cfg.risk_free_rate, cfg.dividend_yield, quotes, &settings)?,
        }),
    };
    Ok(body)
}

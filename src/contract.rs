use crate::errors::{PricingError, PricingResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ── Contract Terms ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "Call"),
            Self::Put => write!(f, "Put"),
        }
    }
}

impl FromStr for OptionKind {
    type Err = PricingError;

    fn from_str(s: &str) -> PricingResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(PricingError::Parse(format!("unknown option kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStyle {
    European,
    American,
}

impl FromStr for ExerciseStyle {
    type Err = PricingError;

    fn from_str(s: &str) -> PricingResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "european" => Ok(Self::European),
            "american" => Ok(Self::American),
            other => Err(PricingError::Parse(format!("unknown exercise style: {other}"))),
        }
    }
}

/// How an American contract is priced. Has no meaning for European exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMethod {
    Lattice { steps: usize },
    Baw,
}

/// Terms of a single vanilla option, plus the market inputs needed to price it.
/// Immutable per pricing call: bumping produces a modified copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub spot: f64,
    pub strike: f64,
    pub volatility: f64,
    pub rate: f64,
    /// Continuous dividend / carry yield. The lattice pricer has no carry
    /// term and rejects a non-zero value.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Years to expiry, ACT/365.
    pub time_to_expiry: f64,
    pub kind: OptionKind,
}

impl OptionContract {
    pub fn new(
        spot: f64,
        strike: f64,
        volatility: f64,
        rate: f64,
        time_to_expiry: f64,
        kind: OptionKind,
    ) -> Self {
        Self {
            spot,
            strike,
            volatility,
            rate,
            dividend_yield: 0.0,
            time_to_expiry,
            kind,
        }
    }

    pub fn call(spot: f64, strike: f64, volatility: f64, rate: f64, time_to_expiry: f64) -> Self {
        Self::new(spot, strike, volatility, rate, time_to_expiry, OptionKind::Call)
    }

    pub fn put(spot: f64, strike: f64, volatility: f64, rate: f64, time_to_expiry: f64) -> Self {
        Self::new(spot, strike, volatility, rate, time_to_expiry, OptionKind::Put)
    }

    pub fn with_dividend_yield(self, dividend_yield: f64) -> Self {
        Self { dividend_yield, ..self }
    }

    #[inline]
    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    #[inline]
    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    #[inline]
    pub fn with_rate(self, rate: f64) -> Self {
        Self { rate, ..self }
    }

    #[inline]
    pub fn with_time(self, time_to_expiry: f64) -> Self {
        Self { time_to_expiry, ..self }
    }

    /// Checks the terms every pricer relies on. Zero sigma and zero time pass:
    /// they are boundary cases, not invalid contracts.
    pub fn validate(&self) -> PricingResult<()> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(PricingError::invalid(format!("spot must be positive, got {}", self.spot)));
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(PricingError::invalid(format!("strike must be positive, got {}", self.strike)));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(PricingError::invalid(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if !(self.time_to_expiry.is_finite() && self.time_to_expiry >= 0.0) {
            return Err(PricingError::invalid(format!(
                "time to expiry must be non-negative, got {}",
                self.time_to_expiry
            )));
        }
        if !self.rate.is_finite() || !self.dividend_yield.is_finite() {
            return Err(PricingError::invalid("rate and dividend yield must be finite"));
        }
        Ok(())
    }
}

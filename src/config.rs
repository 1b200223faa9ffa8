use crate::calibration::SolveSettings;
use crate::contract::{ExerciseStyle, PricingMethod};
use crate::errors::{PricingError, PricingResult};
use crate::models::{binomial, Model, VolBracket};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub exercise: ExerciseStyle,
    pub method: PricingMethod,
    pub iv_tolerance: f64,
    pub iv_max_iterations: usize,
    /// Overrides the pricer's default IV bracket when both ends are set.
    pub iv_bracket: Option<VolBracket>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.03,
            dividend_yield: 0.0,
            exercise: ExerciseStyle::European,
            method: PricingMethod::Baw,
            iv_tolerance: 0.00001,
            iv_max_iterations: 200,
            iv_bracket: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> PricingResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> PricingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let risk_free_rate = parse_f64("RISK_FREE_RATE", &var_or("RISK_FREE_RATE", "0.03"))?;
        let dividend_yield = parse_f64("DIVIDEND_YIELD", &var_or("DIVIDEND_YIELD", "0.0"))?;
        let exercise = var_or("EXERCISE_STYLE", "european")
            .parse::<ExerciseStyle>()
            .map_err(|e| PricingError::Config(format!("EXERCISE_STYLE: {e}")))?;

        let steps = var_or("LATTICE_STEPS", &binomial::DEFAULT_STEPS.to_string())
            .parse::<usize>()
            .map_err(|e| PricingError::Config(format!("LATTICE_STEPS: {e}")))?;
        let method = match var_or("AMERICAN_METHOD", "baw").trim().to_ascii_lowercase().as_str() {
            "baw" => PricingMethod::Baw,
            "lattice" | "binomial" => PricingMethod::Lattice { steps },
            other => return Err(PricingError::Config(format!("AMERICAN_METHOD: unknown method {other}"))),
        };

        let iv_tolerance = parse_f64("IV_TOLERANCE", &var_or("IV_TOLERANCE", "0.00001"))?;
        let iv_max_iterations = var_or("IV_MAX_ITERATIONS", "200")
            .parse::<usize>()
            .map_err(|e| PricingError::Config(format!("IV_MAX_ITERATIONS: {e}")))?;

        let iv_bracket = match (lookup("IV_SIGMA_MIN"), lookup("IV_SIGMA_MAX")) {
            (Some(lo), Some(hi)) => Some(VolBracket::new(
                parse_f64("IV_SIGMA_MIN", &lo)?,
                parse_f64("IV_SIGMA_MAX", &hi)?,
            )),
            (None, None) => None,
            _ => {
                return Err(PricingError::Config(
                    "IV_SIGMA_MIN and IV_SIGMA_MAX must be set together".to_string(),
                ))
            }
        };

        Ok(Self {
            risk_free_rate,
            dividend_yield,
            exercise,
            method,
            iv_tolerance,
            iv_max_iterations,
            iv_bracket,
        })
    }

    /// Pricer selected by exercise style and American method.
    pub fn model(&self) -> PricingResult<Model> {
        Model::for_style(self.exercise, self.method)
    }

    pub fn solve_settings(&self) -> SolveSettings {
        SolveSettings {
            bracket: self.iv_bracket,
            tolerance: self.iv_tolerance,
            max_iterations: self.iv_max_iterations,
        }
    }
}

fn parse_f64(key: &str, raw: &str) -> PricingResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| PricingError::Config(format!("{key}: {e}")))
}

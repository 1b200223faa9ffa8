/// Error taxonomy for the pricing engine.
/// Every numerical failure is reported to the caller; the only absorbed case is
/// the documented boundary-value policy applied at T=0 and sigma=0.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("domain singularity: {0}")]
    DomainSingularity(String),

    #[error("critical price search did not converge after {iterations} iterations (residual {residual})")]
    OptimizationDidNotConverge { iterations: usize, residual: f64 },

    #[error("implied volatility did not converge after {iterations} iterations: {reason}")]
    ConvergenceFailure { iterations: usize, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),
}

impl PricingError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn singular(msg: impl Into<String>) -> Self {
        Self::DomainSingularity(msg.into())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for PricingError {
    fn from(e: std::io::Error) -> Self {
        PricingError::Io(e.to_string())
    }
}

pub type PricingResult<T> = Result<T, PricingError>;

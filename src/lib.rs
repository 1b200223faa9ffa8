//! Option fair-value engine: European Black-Scholes, American CRR lattice and
//! Barone-Adesi-Whaley pricers, bump-and-reprice Greeks, and bisection
//! implied volatility over single quotes, date series and chain snapshots.

pub mod calibration;
pub mod config;
pub mod contract;
pub mod errors;
pub mod models;
pub mod numerics;
pub mod request;
pub mod risk;

pub use contract::{ExerciseStyle, OptionContract, OptionKind, PricingMethod};
pub use errors::{PricingError, PricingResult};
pub use models::{BaroneAdesiWhaley, BinomialLattice, BlackScholes, Model, PricingModel};
pub use risk::{Greeks, GreeksEstimator};

pub mod greeks;

pub use greeks::{Greeks, GreeksEstimator};

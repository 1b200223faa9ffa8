pub mod implied_vol;
pub mod series;
pub mod surface;

pub use implied_vol::{call_iv, implied_volatility, put_iv, ImpliedVolQuery};
pub use series::{implied_vol_series, years_between, Observation, SeriesPoint, SeriesTerms, SolveSettings};
pub use surface::{chain_snapshot, ChainQuote, SurfacePoint};

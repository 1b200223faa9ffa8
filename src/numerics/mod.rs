pub mod bisect;
pub mod minimize;

pub use bisect::{invert_increasing, Root};
pub use minimize::{minimize_from, MinimizeSettings, Minimum};

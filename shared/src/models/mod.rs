//! Domain models for the NDVI monitoring platform

mod activity;
mod analysis;
mod field;
mod insight;
mod stress;
mod weather;

pub use activity::*;
pub use analysis::*;
pub use field::*;
pub use insight::*;
pub use stress::*;
pub use weather::*;

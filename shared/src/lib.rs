//! Shared types and models for the NDVI monitoring platform
//!
//! Pure domain rules (seasonal norms, stress classification, weather code
//! mapping, geometry conversion) live here so the backend and its tests can
//! use them without touching the network or the database.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;

//! Business logic services for the NDVI monitoring platform

pub mod activity;
pub mod analysis;
pub mod field;
pub mod insight;
pub mod store;

pub use activity::ActivityService;
pub use analysis::{AnalysisService, AnalysisSettings, AnalyzeRequest, AnalyzeResponse};
pub use field::FieldService;
pub use insight::InsightGenerator;
pub use store::{FieldStore, PgFieldStore};

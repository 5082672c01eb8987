//! HTTP handlers

pub mod activity;
pub mod analysis;
pub mod field;
pub mod health;

pub use activity::list_activity;
pub use analysis::{analyze, list_analyses};
pub use field::{create_field, delete_field, get_field, list_fields, update_field};
pub use health::health_check;

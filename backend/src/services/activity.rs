//! Activity log service

use std::sync::Arc;

use shared::ActivityLogEntry;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::store::FieldStore;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 20;
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn FieldStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn FieldStore>) -> Self {
        Self { store }
    }

    /// Most recent entries for the user, newest first
    pub async fn recent(&self, user_id: Uuid, limit: Option<i64>) -> AppResult<Vec<ActivityLogEntry>> {
        self.store.list_activity(user_id, clamp_limit(limit)).await
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT)
}

//! Monitored field models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::LastAnalysis;
use crate::types::LatLng;

/// A field owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub crop_type: String,
    pub center: LatLng,
    pub boundary: Option<Vec<LatLng>>,
    pub last_analysis: Option<LastAnalysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new field row
#[derive(Debug, Clone)]
pub struct NewField {
    pub name: String,
    pub crop_type: String,
    pub center: LatLng,
    pub boundary: Option<Vec<LatLng>>,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct FieldChanges {
    pub name: Option<String>,
    pub crop_type: Option<String>,
    pub center: Option<LatLng>,
    /// `Some(None)` clears the boundary
    pub boundary: Option<Option<Vec<LatLng>>>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.crop_type.is_none()
            && self.center.is_none()
            && self.boundary.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearing_boundary_is_a_change() {
        assert!(FieldChanges::default().is_empty());

        let clear = FieldChanges {
            boundary: Some(None),
            ..Default::default()
        };
        assert!(!clear.is_empty());
    }
}

//! Activity log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of notable user action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    FieldCreated,
    FieldDeleted,
    AnalysisRun,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::FieldCreated => "field_created",
            ActivityKind::FieldDeleted => "field_deleted",
            ActivityKind::AnalysisRun => "analysis_run",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "field_created" => Some(ActivityKind::FieldCreated),
            "field_deleted" => Some(ActivityKind::FieldDeleted),
            "analysis_run" => Some(ActivityKind::AnalysisRun),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub description: String,
}

impl NewActivity {
    pub fn field_created(field_name: &str) -> Self {
        NewActivity {
            kind: ActivityKind::FieldCreated,
            description: format!("Создано поле «{}»", field_name),
        }
    }

    pub fn field_deleted(field_name: &str) -> Self {
        NewActivity {
            kind: ActivityKind::FieldDeleted,
            description: format!("Удалено поле «{}»", field_name),
        }
    }

    pub fn analysis_run(field_name: &str, ndvi: f64) -> Self {
        NewActivity {
            kind: ActivityKind::AnalysisRun,
            description: format!("Выполнен анализ поля «{}»: NDVI {:.2}", field_name, ndvi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            ActivityKind::FieldCreated,
            ActivityKind::FieldDeleted,
            ActivityKind::AnalysisRun,
        ] {
            assert_eq!(ActivityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActivityKind::parse("field_updated"), None);
    }

    #[test]
    fn test_analysis_description() {
        let entry = NewActivity::analysis_run("Северный участок", 0.6789);
        assert_eq!(entry.kind, ActivityKind::AnalysisRun);
        assert!(entry.description.contains("0.68"));
        assert!(entry.description.contains("Северный участок"));
    }
}

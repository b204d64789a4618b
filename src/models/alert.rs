use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A persisted alert. One row per triggered condition per reading; the
/// timestamp is the evaluation time, not the reading's own timestamp.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

use crate::db::{queries, DbPool};
use crate::models::alert::Alert;
use crate::rules::Triggered;
use chrono::{DateTime, Utc};

/// Persist one alert per triggered condition, stamped at evaluation time.
/// The whole batch goes to the database in a single round trip; row order
/// matches the order the conditions fired.
pub async fn record(pool: &DbPool, triggered: &[Triggered]) -> Result<Vec<Alert>, sqlx::Error> {
    let mut messages: Vec<String> = Vec::with_capacity(triggered.len());
    let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(triggered.len());
    for t in triggered {
        messages.push(t.message.clone());
        timestamps.push(Utc::now());
    }

    sqlx::query_as(queries::INSERT_ALERTS)
        .bind(&messages)
        .bind(&timestamps)
        .fetch_all(pool)
        .await
}

use crate::db::{queries, DbPool};
use crate::models::alert::Alert;
use crate::models::reading::{FieldViolation, NewReading, Reading, ReadingUpdate};
use crate::notifier::Notifier;
use crate::processor::alerts;
use crate::rules::{self, Thresholds};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("reading failed validation: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),
    #[error("storage failure during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Run one reading through the full pipeline: validate, persist, evaluate
/// rules, persist triggered alerts, broadcast.
///
/// The reading insert and the alert insert are separate statements, not one
/// transaction: if the alert flush fails, the reading stays committed and
/// the call returns the storage error.
pub async fn ingest(
    pool: &DbPool,
    notifier: &Notifier,
    thresholds: &Thresholds,
    reading: NewReading,
) -> Result<Reading, IngestError> {
    reading.validate().map_err(IngestError::Validation)?;

    let reading: Reading = sqlx::query_as(queries::INSERT_READING)
        .bind(reading.timestamp)
        .bind(reading.speed)
        .bind(reading.acceleration)
        .bind(reading.distance)
        .bind(reading.fuel_level)
        .bind(reading.rpm)
        .bind(&reading.gps_latitude)
        .bind(&reading.gps_longitude)
        .fetch_one(pool)
        .await
        .map_err(|source| IngestError::Storage {
            op: "insert reading",
            source,
        })?;

    let triggered = rules::evaluate(&reading, thresholds);
    let alerts = if triggered.is_empty() {
        Vec::new()
    } else {
        alerts::record(pool, &triggered)
            .await
            .map_err(|source| IngestError::Storage {
                op: "insert alerts",
                source,
            })?
    };

    publish_outcome(notifier, &alerts, ReadingUpdate::from(&reading));

    info!(
        reading_id = reading.id,
        alerts = alerts.len(),
        "ingested reading"
    );
    Ok(reading)
}

/// Alert notifications go out first, in the order they were recorded; the
/// reading update always follows, alerts or not.
fn publish_outcome(notifier: &Notifier, alerts: &[Alert], update: ReadingUpdate) {
    for alert in alerts {
        notifier.publish_alert(alert.message.clone());
    }
    notifier.publish_reading(update);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::Notification;
    use chrono::Utc;

    fn alert(id: i64, message: &str) -> Alert {
        Alert {
            id,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn update() -> ReadingUpdate {
        ReadingUpdate {
            timestamp: Utc::now(),
            speed: 135.0,
            fuel_level: 15.0,
            acceleration: 2.0,
            gps_latitude: "19.43".to_string(),
            gps_longitude: "-99.13".to_string(),
        }
    }

    #[tokio::test]
    async fn alerts_are_published_before_the_reading_update() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        let alerts = vec![
            alert(1, "High Speed Alert: 135 km/h"),
            alert(2, "Low Fuel Alert: 15%"),
        ];
        publish_outcome(&notifier, &alerts, update());

        match rx.recv().await.unwrap() {
            Notification::Alert { message } => {
                assert_eq!(message, "High Speed Alert: 135 km/h")
            }
            other => panic!("unexpected notification: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            Notification::Alert { message } => assert_eq!(message, "Low Fuel Alert: 15%"),
            other => panic!("unexpected notification: {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            Notification::ReadingUpdate(_)
        ));
    }

    #[tokio::test]
    async fn reading_update_goes_out_even_without_alerts() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        publish_outcome(&notifier, &[], update());

        assert!(matches!(
            rx.recv().await.unwrap(),
            Notification::ReadingUpdate(_)
        ));
    }

    #[test]
    fn validation_error_lists_every_field() {
        let violations = vec![
            FieldViolation {
                field: "speed",
                problem: "must be between 0 and 300 km/h, got 420".to_string(),
            },
            FieldViolation {
                field: "fuel_level",
                problem: "must be between 0 and 100%, got -3".to_string(),
            },
        ];
        let err = IngestError::Validation(violations);
        let rendered = err.to_string();
        assert!(rendered.contains("speed"));
        assert!(rendered.contains("fuel_level"));
        assert!(rendered.contains("420"));
    }

    #[test]
    fn storage_error_names_the_operation() {
        let err = IngestError::Storage {
            op: "insert alerts",
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().contains("insert alerts"));
    }
}

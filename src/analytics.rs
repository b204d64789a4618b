//! Read-side KPI queries. Each call scans the store independently of the
//! ingestion pipeline.

use crate::db::{queries, DbPool};
use crate::models::alert::Alert;
use crate::models::reading::Reading;
use crate::rules::{self, Thresholds};
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// The most recent readings plus KPIs computed over exactly that window.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub readings: Vec<Reading>,
    pub max_speed: Option<f64>,
    pub min_fuel_level: Option<f64>,
    pub alert_count: usize,
}

/// Full-history aggregates. `average_speed` and `max_speed` are `None`
/// when no readings exist.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_count: i64,
    pub average_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub dangerous_brake_count: i64,
}

/// The latest `limit` readings, newest first, with windowed KPIs.
pub async fn recent_history(
    pool: &DbPool,
    thresholds: &Thresholds,
    limit: i64,
) -> Result<HistorySnapshot, sqlx::Error> {
    let readings: Vec<Reading> = sqlx::query_as(queries::SELECT_RECENT_READINGS)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(window_kpis(readings, thresholds))
}

/// KPI computation over a fetched window. The alert count uses the same
/// condition table as the rule evaluator.
fn window_kpis(readings: Vec<Reading>, thresholds: &Thresholds) -> HistorySnapshot {
    let max_speed = readings.iter().map(|r| r.speed).reduce(f64::max);
    let min_fuel_level = readings.iter().map(|r| r.fuel_level).reduce(f64::min);
    let alert_count = readings
        .iter()
        .filter(|r| rules::triggers_any(r, thresholds))
        .count();

    HistorySnapshot {
        readings,
        max_speed,
        min_fuel_level,
        alert_count,
    }
}

pub async fn statistics(
    pool: &DbPool,
    thresholds: &Thresholds,
) -> Result<Statistics, sqlx::Error> {
    sqlx::query_as(queries::SELECT_READING_STATS)
        .bind(thresholds.dangerous_brake_ms2)
        .fetch_one(pool)
        .await
}

/// All alerts, newest first. Repeated calls without intervening ingests
/// return identical results.
pub async fn list_alerts(pool: &DbPool) -> Result<Vec<Alert>, sqlx::Error> {
    sqlx::query_as(queries::SELECT_ALERTS).fetch_all(pool).await
}

/// The entire reading history, newest first.
pub async fn all_readings(pool: &DbPool) -> Result<Vec<Reading>, sqlx::Error> {
    sqlx::query_as(queries::SELECT_ALL_READINGS)
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(id: i64, speed: f64, fuel_level: f64) -> Reading {
        Reading {
            id,
            timestamp: Utc::now(),
            speed,
            acceleration: 0.0,
            distance: 0.0,
            fuel_level,
            rpm: 2000.0,
            gps_latitude: "19.43".to_string(),
            gps_longitude: "-99.13".to_string(),
        }
    }

    #[test]
    fn empty_window_has_no_extrema() {
        let snapshot = window_kpis(Vec::new(), &Thresholds::default());
        assert!(snapshot.readings.is_empty());
        assert_eq!(snapshot.max_speed, None);
        assert_eq!(snapshot.min_fuel_level, None);
        assert_eq!(snapshot.alert_count, 0);
    }

    #[test]
    fn kpis_cover_exactly_the_window() {
        let window = vec![
            reading(1, 100.0, 80.0),
            reading(2, 130.0, 60.0), // speeding
            reading(3, 80.0, 15.0),  // low fuel
            reading(4, 125.0, 10.0), // both, still one window row
        ];
        let snapshot = window_kpis(window, &Thresholds::default());

        assert_eq!(snapshot.max_speed, Some(130.0));
        assert_eq!(snapshot.min_fuel_level, Some(10.0));
        assert_eq!(snapshot.alert_count, 3);
    }

    #[test]
    fn alert_count_matches_the_rule_predicate() {
        let thresholds = Thresholds::default();
        let window = vec![
            reading(1, 120.0, 20.0), // exactly at both limits: no alert
            reading(2, 120.1, 20.0),
            reading(3, 119.9, 19.9),
        ];
        let expected = window
            .iter()
            .filter(|r| rules::triggers_any(r, &thresholds))
            .count();
        let snapshot = window_kpis(window, &thresholds);
        assert_eq!(snapshot.alert_count, expected);
        assert_eq!(snapshot.alert_count, 2);
    }

    #[test]
    fn single_reading_window() {
        let snapshot = window_kpis(vec![reading(1, 135.0, 15.0)], &Thresholds::default());
        assert_eq!(snapshot.max_speed, Some(135.0));
        assert_eq!(snapshot.min_fuel_level, Some(15.0));
        assert_eq!(snapshot.alert_count, 1);
    }
}

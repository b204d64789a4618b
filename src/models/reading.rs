use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A candidate reading as submitted by a device, not yet validated or
/// persisted. Field bounds are enforced by [`NewReading::validate`] before
/// any row is written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewReading {
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub acceleration: f64,
    pub distance: f64,
    pub fuel_level: f64,
    pub rpm: f64,
    pub gps_latitude: String,
    pub gps_longitude: String,
}

/// A persisted telemetry reading. Immutable once inserted.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub acceleration: f64,
    pub distance: f64,
    pub fuel_level: f64,
    pub rpm: f64,
    pub gps_latitude: String,
    pub gps_longitude: String,
}

/// The subset of reading fields pushed to live subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingUpdate {
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub fuel_level: f64,
    pub acceleration: f64,
    pub gps_latitude: String,
    pub gps_longitude: String,
}

impl From<&Reading> for ReadingUpdate {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: reading.timestamp,
            speed: reading.speed,
            fuel_level: reading.fuel_level,
            acceleration: reading.acceleration,
            gps_latitude: reading.gps_latitude.clone(),
            gps_longitude: reading.gps_longitude.clone(),
        }
    }
}

/// One field that failed validation, with a human-readable problem.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub problem: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

fn check_bounds(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    unit: &str,
) {
    // NaN fails the range check and is rejected along with out-of-bound values.
    if !(min..=max).contains(&value) {
        violations.push(FieldViolation {
            field,
            problem: format!("must be between {min} and {max}{unit}, got {value}"),
        });
    }
}

fn check_required(violations: &mut Vec<FieldViolation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(FieldViolation {
            field,
            problem: "is required".to_string(),
        });
    }
}

impl NewReading {
    /// Check every field against its bound. Returns the complete list of
    /// violations, never just the first one.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();

        check_bounds(&mut violations, "speed", self.speed, 0.0, 300.0, " km/h");
        check_bounds(
            &mut violations,
            "acceleration",
            self.acceleration,
            -10.0,
            10.0,
            " m/s²",
        );
        check_bounds(&mut violations, "distance", self.distance, 0.0, 1000.0, " km");
        check_bounds(&mut violations, "fuel_level", self.fuel_level, 0.0, 100.0, "%");
        check_bounds(&mut violations, "rpm", self.rpm, 0.0, 8000.0, "");
        check_required(&mut violations, "gps_latitude", &self.gps_latitude);
        check_required(&mut violations, "gps_longitude", &self.gps_longitude);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_reading() -> NewReading {
        NewReading {
            timestamp: Utc::now(),
            speed: 80.0,
            acceleration: 1.5,
            distance: 12.3,
            fuel_level: 55.0,
            rpm: 2500.0,
            gps_latitude: "+20.652494".to_string(),
            gps_longitude: "-100.391404".to_string(),
        }
    }

    #[test]
    fn in_bound_reading_passes() {
        assert!(valid_reading().validate().is_ok());
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut reading = valid_reading();
        reading.speed = 300.0;
        reading.acceleration = -10.0;
        reading.fuel_level = 0.0;
        reading.rpm = 8000.0;
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn out_of_bound_speed_is_named() {
        let mut reading = valid_reading();
        reading.speed = 300.5;
        let violations = reading.validate().unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "speed");
        assert!(violations[0].problem.contains("300.5"));
    }

    #[test]
    fn every_violation_is_reported() {
        let reading = NewReading {
            timestamp: Utc::now(),
            speed: -1.0,
            acceleration: 11.0,
            distance: 1001.0,
            fuel_level: 120.0,
            rpm: 9000.0,
            gps_latitude: "".to_string(),
            gps_longitude: "   ".to_string(),
        };
        let violations = reading.validate().unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            vec![
                "speed",
                "acceleration",
                "distance",
                "fuel_level",
                "rpm",
                "gps_latitude",
                "gps_longitude"
            ]
        );
    }

    #[test]
    fn nan_speed_is_rejected() {
        let mut reading = valid_reading();
        reading.speed = f64::NAN;
        let violations = reading.validate().unwrap_err();
        assert_eq!(violations[0].field, "speed");
    }

    #[test]
    fn update_projects_broadcast_fields() {
        let reading = Reading {
            id: 7,
            timestamp: Utc::now(),
            speed: 135.0,
            acceleration: 2.0,
            distance: 40.0,
            fuel_level: 15.0,
            rpm: 3000.0,
            gps_latitude: "19.4".to_string(),
            gps_longitude: "-99.1".to_string(),
        };
        let update = ReadingUpdate::from(&reading);
        assert_eq!(update.speed, 135.0);
        assert_eq!(update.fuel_level, 15.0);
        assert_eq!(update.gps_latitude, "19.4");
    }
}

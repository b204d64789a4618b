use crate::models::reading::NewReading;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct TelemetryMessage {
    pub data: Data,
    pub metadata: Metadata,
    pub uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct Data {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: Option<String>,
    #[serde(rename = "SPEED", default, deserialize_with = "parse_f64_option")]
    pub speed: Option<f64>,
    #[serde(rename = "ACCELERATION", default, deserialize_with = "parse_f64_option")]
    pub acceleration: Option<f64>,
    #[serde(rename = "DISTANCE", default, deserialize_with = "parse_f64_option")]
    pub distance: Option<f64>,
    #[serde(rename = "FUEL_LEVEL", default, deserialize_with = "parse_f64_option")]
    pub fuel_level: Option<f64>,
    #[serde(rename = "RPM", default, deserialize_with = "parse_f64_option")]
    pub rpm: Option<f64>,
    #[serde(rename = "GPS_LATITUDE")]
    pub gps_latitude: Option<String>,
    #[serde(rename = "GPS_LONGITUDE")]
    pub gps_longitude: Option<String>,
    #[serde(rename = "DEVICE_ID")]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(rename = "DEVICE_ID")]
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl TelemetryMessage {
    pub fn get_device_id(&self) -> Option<&String> {
        self.data.device_id.as_ref().or(self.metadata.device_id.as_ref())
    }

    /// Convert the wire payload into an ingestion candidate. Missing numeric
    /// fields default to zero; timestamp and both GPS coordinates must be
    /// present for the message to be usable.
    pub fn to_new_reading(&self) -> Result<NewReading, String> {
        let timestamp_str = self.data.timestamp.as_deref().unwrap_or("");
        let timestamp = parse_timestamp(timestamp_str)
            .ok_or_else(|| format!("invalid TIMESTAMP: '{timestamp_str}'"))?;

        let gps_latitude = self
            .data
            .gps_latitude
            .clone()
            .ok_or("missing GPS_LATITUDE")?;
        let gps_longitude = self
            .data
            .gps_longitude
            .clone()
            .ok_or("missing GPS_LONGITUDE")?;

        Ok(NewReading {
            timestamp,
            speed: self.data.speed.unwrap_or(0.0),
            acceleration: self.data.acceleration.unwrap_or(0.0),
            distance: self.data.distance.unwrap_or(0.0),
            fuel_level: self.data.fuel_level.unwrap_or(0.0),
            rpm: self.data.rpm.unwrap_or(0.0),
            gps_latitude,
            gps_longitude,
        })
    }
}

/// Devices report either `2025-11-29 06:15:15` or `2025-11-29T06:15:15`,
/// always in UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
    }

    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

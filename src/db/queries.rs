pub const INSERT_READING: &str = r#"
INSERT INTO telemetry_readings (timestamp, speed, acceleration, distance, fuel_level, rpm, gps_latitude, gps_longitude)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
RETURNING id, timestamp, speed, acceleration, distance, fuel_level, rpm, gps_latitude, gps_longitude;
"#;

pub const INSERT_ALERTS: &str = r#"
INSERT INTO alerts (message, timestamp)
SELECT batch.message, batch.created_at
FROM UNNEST($1::text[], $2::timestamptz[]) WITH ORDINALITY AS batch(message, created_at, ord)
ORDER BY batch.ord
RETURNING id, message, timestamp;
"#;

pub const SELECT_RECENT_READINGS: &str = r#"
SELECT id, timestamp, speed, acceleration, distance, fuel_level, rpm, gps_latitude, gps_longitude
FROM telemetry_readings
ORDER BY timestamp DESC
LIMIT $1;
"#;

pub const SELECT_ALL_READINGS: &str = r#"
SELECT id, timestamp, speed, acceleration, distance, fuel_level, rpm, gps_latitude, gps_longitude
FROM telemetry_readings
ORDER BY timestamp DESC;
"#;

pub const SELECT_ALERTS: &str = r#"
SELECT id, message, timestamp
FROM alerts
ORDER BY timestamp DESC;
"#;

pub const SELECT_READING_STATS: &str = r#"
SELECT COUNT(*) AS total_count,
       AVG(speed) AS average_speed,
       MAX(speed) AS max_speed,
       COUNT(*) FILTER (WHERE acceleration < $1) AS dangerous_brake_count
FROM telemetry_readings;
"#;

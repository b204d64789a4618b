use crate::models::reading::Reading;

/// Tunable rule thresholds. Loaded from the environment so limits can be
/// adjusted per deployment without touching evaluation logic.
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub speed_limit_kmh: f64,
    pub low_fuel_percent: f64,
    pub dangerous_brake_ms2: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            speed_limit_kmh: 120.0,
            low_fuel_percent: 20.0,
            dangerous_brake_ms2: -5.0,
        }
    }
}

/// A named threshold condition over a reading. The condition list is
/// append-only: new rules go at the end so existing alert ordering never
/// changes.
pub struct Condition {
    pub name: &'static str,
    applies: fn(&Reading, &Thresholds) -> bool,
    message: fn(&Reading, &Thresholds) -> String,
}

fn over_speed_limit(reading: &Reading, thresholds: &Thresholds) -> bool {
    reading.speed > thresholds.speed_limit_kmh
}

fn high_speed_message(reading: &Reading, _thresholds: &Thresholds) -> String {
    format!("High Speed Alert: {} km/h", reading.speed)
}

fn under_fuel_floor(reading: &Reading, thresholds: &Thresholds) -> bool {
    reading.fuel_level < thresholds.low_fuel_percent
}

fn low_fuel_message(reading: &Reading, _thresholds: &Thresholds) -> String {
    format!("Low Fuel Alert: {}%", reading.fuel_level)
}

pub const CONDITIONS: &[Condition] = &[
    Condition {
        name: "high_speed",
        applies: over_speed_limit,
        message: high_speed_message,
    },
    Condition {
        name: "low_fuel",
        applies: under_fuel_floor,
        message: low_fuel_message,
    },
];

/// A condition that fired for one reading, carrying the formatted alert
/// message.
#[derive(Debug, Clone, PartialEq)]
pub struct Triggered {
    pub rule: &'static str,
    pub message: String,
}

/// Evaluate every condition against a reading, in declaration order.
/// Pure and deterministic; the returned order is the order alerts are
/// recorded and broadcast.
pub fn evaluate(reading: &Reading, thresholds: &Thresholds) -> Vec<Triggered> {
    CONDITIONS
        .iter()
        .filter(|condition| (condition.applies)(reading, thresholds))
        .map(|condition| Triggered {
            rule: condition.name,
            message: (condition.message)(reading, thresholds),
        })
        .collect()
}

/// Whether any condition fires for this reading. Shared with the windowed
/// alert-count KPI so the two can never drift apart.
pub fn triggers_any(reading: &Reading, thresholds: &Thresholds) -> bool {
    CONDITIONS
        .iter()
        .any(|condition| (condition.applies)(reading, thresholds))
}

//! Extreme-condition rules.

use serde::Serialize;
use std::fmt;

use crate::model::Observation;

pub const TEMPERATURE_HIGH_C: f64 = 35.0;
pub const TEMPERATURE_LOW_C: f64 = 0.0;
pub const WIND_SPEED_HIGH_KPH: f64 = 100.0;
pub const HUMIDITY_HIGH_PCT: f64 = 90.0;
pub const PRESSURE_LOW_MB: f64 = 980.0;
pub const PRESSURE_HIGH_MB: f64 = 1050.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertTag {
    ExtremeTemperature,
    HighWindSpeed,
    HighHumidity,
    ExtremePressure,
}

impl AlertTag {
    pub fn label(&self) -> &'static str {
        match self {
            AlertTag::ExtremeTemperature => "Extreme temperature",
            AlertTag::HighWindSpeed => "High wind speed",
            AlertTag::HighHumidity => "High humidity",
            AlertTag::ExtremePressure => "Extreme pressure",
        }
    }
}

impl fmt::Display for AlertTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every rule is checked; tags come back in rule order. Thresholds are
/// strict, so a value sitting exactly on one does not fire.
pub fn evaluate(observation: &Observation) -> Vec<AlertTag> {
    let mut tags = Vec::new();

    if !(TEMPERATURE_LOW_C..=TEMPERATURE_HIGH_C).contains(&observation.temperature_c) {
        tags.push(AlertTag::ExtremeTemperature);
    }
    if observation.wind_speed_kph > WIND_SPEED_HIGH_KPH {
        tags.push(AlertTag::HighWindSpeed);
    }
    if observation.humidity_pct > HUMIDITY_HIGH_PCT {
        tags.push(AlertTag::HighHumidity);
    }
    if !(PRESSURE_LOW_MB..=PRESSURE_HIGH_MB).contains(&observation.pressure_mb) {
        tags.push(AlertTag::ExtremePressure);
    }

    tags
}

/// `"Alert: Extreme temperature, High humidity"`, or `None` when quiet.
pub fn alert_message(tags: &[AlertTag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let labels: Vec<&str> = tags.iter().map(AlertTag::label).collect();
    Some(format!("Alert: {}", labels.join(", ")))
}

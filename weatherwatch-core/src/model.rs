use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::{
    convert::{celsius_to_fahrenheit, kph_to_mph, round2},
    error::{FieldViolation, ValidationError},
};

/// What to ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub location: String,
    /// `Some(n)` selects the forecast variant; only its current block is read.
    pub forecast_days: Option<u8>,
}

impl WeatherRequest {
    pub fn current(location: impl Into<String>) -> Self {
        Self { location: location.into(), forecast_days: None }
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = Some(days);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl WindDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindDirection::N => "N",
            WindDirection::NE => "NE",
            WindDirection::E => "E",
            WindDirection::SE => "SE",
            WindDirection::S => "S",
            WindDirection::SW => "SW",
            WindDirection::W => "W",
            WindDirection::NW => "NW",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindDirection::N => "North",
            WindDirection::NE => "Northeast",
            WindDirection::E => "East",
            WindDirection::SE => "Southeast",
            WindDirection::S => "South",
            WindDirection::SW => "Southwest",
            WindDirection::W => "West",
            WindDirection::NW => "Northwest",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWindDirection(pub String);

impl fmt::Display for UnknownWindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown wind direction '{}'", self.0)
    }
}

impl std::error::Error for UnknownWindDirection {}

impl FromStr for WindDirection {
    type Err = UnknownWindDirection;

    /// Accepts the 8 compass points and folds the 16-point ones
    /// (`NNE`, `ENE`, ...) onto their intercardinal component.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        if !upper.is_ascii() {
            return Err(UnknownWindDirection(value.to_string()));
        }
        let key = match upper.len() {
            3 => &upper[1..],
            _ => upper.as_str(),
        };

        match (upper.len(), key) {
            (1 | 2, "N") => Ok(WindDirection::N),
            (1 | 2, "E") => Ok(WindDirection::E),
            (1 | 2, "S") => Ok(WindDirection::S),
            (1 | 2, "W") => Ok(WindDirection::W),
            (2 | 3, "NE") => Ok(WindDirection::NE),
            (2 | 3, "SE") => Ok(WindDirection::SE),
            (2 | 3, "SW") => Ok(WindDirection::SW),
            (2 | 3, "NW") => Ok(WindDirection::NW),
            _ => Err(UnknownWindDirection(value.to_string())),
        }
    }
}

/// Lowercased form of a location name; the join key for every query.
pub fn normalize_location_name(name: &str) -> String {
    name.to_lowercase()
}

/// One canonical weather snapshot for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub location_name: String,
    pub region: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub condition_text: String,
    pub condition_icon_url: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub dewpoint_c: f64,
    pub wind_speed_kph: f64,
    pub gust_speed_kph: f64,
    pub wind_direction: WindDirection,
    pub pressure_mb: f64,
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub uv_index: i32,
    pub visibility_km: f64,
    /// Provider's "last updated" moment, not the fetch moment.
    pub record_timestamp: DateTime<Utc>,
}

const TEMPERATURE_RANGE: (f64, f64) = (-100.0, 60.0);
const PRESSURE_RANGE: (f64, f64) = (870.0, 1080.0);
const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
const UV_INDEX_RANGE: (i32, i32) = (0, 11);

fn check_range(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
    expected: &'static str,
) {
    // NaN is never contained and is reported too.
    if !(min..=max).contains(&value) {
        violations.push(FieldViolation { field, value: value.to_string(), expected });
    }
}

fn check_non_negative(violations: &mut Vec<FieldViolation>, field: &'static str, value: f64) {
    check_range(violations, field, value, (0.0, f64::INFINITY), ">= 0");
}

impl Observation {
    /// Check every domain range and report all violations together.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if self.location_name.trim().is_empty() {
            violations.push(FieldViolation {
                field: "location_name",
                value: format!("{:?}", self.location_name),
                expected: "non-empty name",
            });
        }

        check_range(&mut violations, "temperature_c", self.temperature_c, TEMPERATURE_RANGE, "-100..=60");
        check_range(&mut violations, "feels_like_c", self.feels_like_c, TEMPERATURE_RANGE, "-100..=60");
        check_range(&mut violations, "dewpoint_c", self.dewpoint_c, TEMPERATURE_RANGE, "-100..=60");
        check_non_negative(&mut violations, "wind_speed_kph", self.wind_speed_kph);
        check_non_negative(&mut violations, "gust_speed_kph", self.gust_speed_kph);
        check_range(&mut violations, "pressure_mb", self.pressure_mb, PRESSURE_RANGE, "870..=1080");
        check_non_negative(&mut violations, "precipitation_mm", self.precipitation_mm);
        check_range(&mut violations, "humidity_pct", self.humidity_pct, HUMIDITY_RANGE, "0..=100");

        if !(UV_INDEX_RANGE.0..=UV_INDEX_RANGE.1).contains(&self.uv_index) {
            violations.push(FieldViolation {
                field: "uv_index",
                value: self.uv_index.to_string(),
                expected: "0..=11",
            });
        }

        check_non_negative(&mut violations, "visibility_km", self.visibility_km);

        if violations.is_empty() { Ok(()) } else { Err(ValidationError { violations }) }
    }

    pub fn temperature_f(&self) -> f64 {
        round2(celsius_to_fahrenheit(self.temperature_c))
    }

    pub fn wind_speed_mph(&self) -> f64 {
        round2(kph_to_mph(self.wind_speed_kph))
    }
}

/// An observation as persisted by a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObservation {
    pub id: i64,
    pub observation: Observation,
    /// Set by the store at append time.
    pub created_on: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// The Warangal sample payload, already mapped.
    pub fn warangal() -> Observation {
        Observation {
            location_name: "warangal".into(),
            region: "Andhra Pradesh".into(),
            country: "India".into(),
            latitude: Some(18.0),
            longitude: Some(79.58),
            condition_text: "Patchy rain nearby".into(),
            condition_icon_url: "//cdn.weatherapi.com/weather/64x64/day/176.png".into(),
            temperature_c: 29.1,
            feels_like_c: 33.9,
            dewpoint_c: 24.2,
            wind_speed_kph: 15.8,
            gust_speed_kph: 21.6,
            wind_direction: WindDirection::NW,
            pressure_mb: 1003.0,
            precipitation_mm: 0.53,
            humidity_pct: 75.0,
            uv_index: 6,
            visibility_km: 9.0,
            record_timestamp: Utc.with_ymd_and_hms(2024, 9, 7, 11, 15, 0).unwrap(),
        }
    }
}

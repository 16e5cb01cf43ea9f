//! Rolling averages over a look-back window.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    convert::round2,
    error::StoreError,
    model::StoredObservation,
    store::ObservationStore,
};

pub const DEFAULT_TREND_WINDOW_HOURS: i64 = 24;

pub fn default_trend_window() -> Duration {
    Duration::hours(DEFAULT_TREND_WINDOW_HOURS)
}

/// Means over one window, each rounded half away from zero to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub average_temperature: f64,
    pub average_wind: f64,
    pub average_pressure: f64,
    pub average_precipitation: f64,
    pub average_humidity: f64,
    pub average_dewpoint: f64,
    pub samples: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl TrendSummary {
    /// Metric name / value pairs in a stable order.
    pub fn metrics(&self) -> [(&'static str, f64); 6] {
        [
            ("average_temperature", self.average_temperature),
            ("average_wind", self.average_wind),
            ("average_pressure", self.average_pressure),
            ("average_precipitation", self.average_precipitation),
            ("average_humidity", self.average_humidity),
            ("average_dewpoint", self.average_dewpoint),
        ]
    }
}

/// Trend over `[now - window, now]`, with `now` read once.
pub fn compute_trend(
    store: &dyn ObservationStore,
    location_name: &str,
    window: Duration,
) -> Result<Option<TrendSummary>, StoreError> {
    compute_trend_at(store, location_name, window, Utc::now())
}

/// Trend over `[now - window, now]`. `None` means the window held no data.
///
/// A window reaching past the earliest representable instant starts there.
pub fn compute_trend_at(
    store: &dyn ObservationStore,
    location_name: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Option<TrendSummary>, StoreError> {
    let window_start = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let rows = store.range(location_name, window_start, now)?;

    debug!(location = location_name, samples = rows.len(), "Computing trend");

    if rows.is_empty() {
        return Ok(None);
    }

    let mean = |metric: fn(&StoredObservation) -> f64| {
        round2(rows.iter().map(metric).sum::<f64>() / rows.len() as f64)
    };

    Ok(Some(TrendSummary {
        average_temperature: mean(|r| r.observation.temperature_c),
        average_wind: mean(|r| r.observation.wind_speed_kph),
        average_pressure: mean(|r| r.observation.pressure_mb),
        average_precipitation: mean(|r| r.observation.precipitation_mm),
        average_humidity: mean(|r| r.observation.humidity_pct),
        average_dewpoint: mean(|r| r.observation.dewpoint_c),
        samples: rows.len(),
        window_start,
        window_end: now,
    }))
}

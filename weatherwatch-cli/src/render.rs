//! Plain-text rendering for terminal output.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use weatherwatch_core::{
    RefreshOutcome, StoredObservation, TrendSummary, alert_message,
    convert::{LOCAL_TIME_FORMAT, to_local},
};

fn format_time(instant: DateTime<Utc>, tz: Option<&str>) -> String {
    if let Some(tz) = tz {
        if let Ok(local) = to_local(instant, tz) {
            return format!("{} ({tz})", local.format(LOCAL_TIME_FORMAT));
        }
    }
    format!("{} (UTC)", instant.format(LOCAL_TIME_FORMAT))
}

pub fn observation(stored: &StoredObservation, tz: Option<&str>) -> String {
    let o = &stored.observation;
    let mut out = String::new();

    let place = [o.region.as_str(), o.country.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if place.is_empty() {
        let _ = writeln!(out, "{}", o.location_name);
    } else {
        let _ = writeln!(out, "{} ({place})", o.location_name);
    }
    if !o.condition_text.is_empty() {
        let _ = writeln!(out, "  Condition:     {}", o.condition_text);
    }
    let _ = writeln!(
        out,
        "  Temperature:   {:.1} °C / {:.2} °F (feels like {:.1} °C)",
        o.temperature_c,
        o.temperature_f(),
        o.feels_like_c
    );
    let _ = writeln!(
        out,
        "  Wind:          {:.1} km/h ({:.2} mph) {}, gusts {:.1} km/h",
        o.wind_speed_kph,
        o.wind_speed_mph(),
        o.wind_direction.label(),
        o.gust_speed_kph
    );
    let _ = writeln!(out, "  Pressure:      {:.1} mb", o.pressure_mb);
    let _ = writeln!(out, "  Precipitation: {:.2} mm", o.precipitation_mm);
    let _ = writeln!(out, "  Humidity:      {:.0} %", o.humidity_pct);
    let _ = writeln!(out, "  Dew point:     {:.1} °C", o.dewpoint_c);
    let _ = writeln!(out, "  UV index:      {}", o.uv_index);
    let _ = writeln!(out, "  Visibility:    {:.1} km", o.visibility_km);
    let _ = write!(out, "  Updated:       {}", format_time(o.record_timestamp, tz));

    out
}

fn metric_label(metric: &str) -> (&'static str, &'static str) {
    match metric {
        "average_temperature" => ("Temperature", "°C"),
        "average_wind" => ("Wind", "km/h"),
        "average_pressure" => ("Pressure", "mb"),
        "average_precipitation" => ("Precipitation", "mm"),
        "average_humidity" => ("Humidity", "%"),
        "average_dewpoint" => ("Dew point", "°C"),
        _ => ("Other", ""),
    }
}

pub fn trend(summary: Option<&TrendSummary>) -> String {
    let Some(summary) = summary else {
        return "Not enough data for trends.".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Trends over {} observation(s) since {}:",
        summary.samples,
        format_time(summary.window_start, None)
    );
    let lines: Vec<String> = summary
        .metrics()
        .iter()
        .map(|(metric, value)| {
            let (name, unit) = metric_label(metric);
            format!("  {name:<14} {value:.2} {unit}")
        })
        .collect();
    out.push_str(&lines.join("\n"));

    out
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}

pub fn outcome(outcome: &RefreshOutcome, tz: Option<&str>) -> String {
    let alerts = alert_message(&outcome.alerts).unwrap_or_else(|| "No alerts.".to_string());
    format!(
        "{}\n\n{}\n\n{}",
        observation(&outcome.observation, tz),
        alerts,
        trend(outcome.trend.as_ref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use weatherwatch_core::{AlertTag, Observation, WindDirection};

    fn stored() -> StoredObservation {
        StoredObservation {
            id: 1,
            observation: Observation {
                location_name: "warangal".into(),
                region: "Andhra Pradesh".into(),
                country: "India".into(),
                latitude: Some(18.0),
                longitude: Some(79.58),
                condition_text: "Patchy rain nearby".into(),
                condition_icon_url: String::new(),
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
            },
            created_on: Utc.with_ymd_and_hms(2024, 9, 7, 11, 20, 0).unwrap(),
        }
    }

    #[test]
    fn observation_shows_local_time_when_configured() {
        let text = observation(&stored(), Some("Asia/Kolkata"));
        assert!(text.contains("2024-09-07 16:45 (Asia/Kolkata)"));
        assert!(text.contains("84.38 °F"));
        assert!(text.contains("Northwest"));
    }

    #[test]
    fn observation_falls_back_to_utc() {
        let text = observation(&stored(), Some("Not/AZone"));
        assert!(text.contains("2024-09-07 11:15 (UTC)"));
    }

    #[test]
    fn trend_lists_every_metric_with_units() {
        let summary = TrendSummary {
            average_temperature: 15.0,
            average_wind: 12.5,
            average_pressure: 1003.0,
            average_precipitation: 0.25,
            average_humidity: 75.0,
            average_dewpoint: 20.1,
            samples: 2,
            window_start: Utc.with_ymd_and_hms(2024, 9, 6, 12, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2024, 9, 7, 12, 0, 0).unwrap(),
        };

        let text = trend(Some(&summary));
        assert!(text.starts_with("Trends over 2 observation(s) since 2024-09-06 12:00 (UTC):"));
        assert!(text.contains("Temperature    15.00 °C"));
        assert!(text.contains("Wind           12.50 km/h"));
        assert!(text.contains("Dew point      20.10 °C"));
        assert!(!text.contains("Other"));
    }

    #[test]
    fn json_output_carries_observation_and_alerts() {
        let outcome = RefreshOutcome {
            observation: stored(),
            alerts: vec![AlertTag::HighHumidity],
            trend: None,
        };

        let value: serde_json::Value = serde_json::from_str(&json(&outcome).unwrap()).unwrap();
        assert_eq!(value["observation"]["observation"]["location_name"], "warangal");
        assert_eq!(value["observation"]["observation"]["wind_direction"], "NW");
        assert_eq!(value["alerts"][0], "HighHumidity");
        assert!(value["trend"].is_null());
    }

    #[test]
    fn missing_trend_is_explained() {
        assert_eq!(trend(None), "Not enough data for trends.");
    }

    #[test]
    fn outcome_includes_alert_line() {
        let outcome = RefreshOutcome {
            observation: stored(),
            alerts: vec![AlertTag::HighHumidity],
            trend: None,
        };
        let text = super::outcome(&outcome, None);
        assert!(text.contains("Alert: High humidity"));
        assert!(text.contains("Not enough data for trends."));
    }
}

//! WeatherAPI.com client for the `current.json` and `forecast.json` endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::{
    convert::to_utc,
    error::ProviderError,
    model::{Observation, WeatherRequest, WindDirection},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Embedded error code for "No location found matching parameter 'q'".
pub const LOCATION_NOT_FOUND_CODE: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_options(api_key, DEFAULT_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { api_key, base_url, http })
    }

    fn endpoint(&self, request: &WeatherRequest) -> String {
        let name = if request.forecast_days.is_some() { "forecast.json" } else { "current.json" };
        format!("{}/{}", self.base_url, name)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn fetch_current(&self, request: &WeatherRequest) -> Result<Observation, ProviderError> {
        let url = self.endpoint(request);
        let days = request.forecast_days.map(|d| d.to_string());

        let mut query = vec![("key", self.api_key.as_str()), ("q", request.location.as_str())];
        if let Some(days) = days.as_deref() {
            query.push(("days", days));
        }

        debug!(location = %request.location, forecast_days = ?request.forecast_days, "Requesting WeatherAPI");

        let res = self.http.get(&url).query(&query).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if status != StatusCode::OK {
            return Err(classify_failure(status, &body, &request.location));
        }

        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: Option<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tz_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct WaCondition {
    #[serde(default)]
    text: String,
    #[serde(default)]
    icon: String,
}

/// Numeric fields are optional here only so a missing one can be
/// reported by name; [`map_observation`] makes each of them mandatory.
#[derive(Debug, Deserialize)]
struct WaCurrent {
    last_updated: Option<String>,
    temp_c: Option<f64>,
    feelslike_c: Option<f64>,
    dewpoint_c: Option<f64>,
    wind_kph: Option<f64>,
    gust_kph: Option<f64>,
    #[serde(default)]
    wind_dir: String,
    pressure_mb: Option<f64>,
    precip_mm: Option<f64>,
    humidity: Option<f64>,
    uv: Option<f64>,
    vis_km: Option<f64>,
    #[serde(default)]
    condition: WaCondition,
}

/// Shared by both endpoints; `forecast` and `alerts` blocks are ignored.
#[derive(Debug, Deserialize)]
struct WaResponse {
    location: Option<WaLocation>,
    current: Option<WaCurrent>,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaErrorEnvelope {
    error: Option<WaErrorBody>,
    code: Option<i64>,
    message: Option<String>,
}

fn classify_failure(status: StatusCode, body: &str, query: &str) -> ProviderError {
    let (code, message) = match serde_json::from_str::<WaErrorEnvelope>(body) {
        Ok(WaErrorEnvelope { error: Some(err), .. }) => (err.code, err.message.unwrap_or_default()),
        Ok(WaErrorEnvelope { code, message, .. }) => (code, message.unwrap_or_default()),
        Err(_) => (None, truncate_body(body)),
    };

    if status == StatusCode::BAD_REQUEST && code == Some(LOCATION_NOT_FOUND_CODE) {
        debug!(query, "WeatherAPI found no matching location");
        return ProviderError::LocationNotFound { query: query.to_string() };
    }

    error!(status = status.as_u16(), ?code, %message, "WeatherAPI request failed");
    ProviderError::Status { status: status.as_u16(), code, message }
}

pub(crate) fn parse_current(body: &str) -> Result<Observation, ProviderError> {
    let parsed: WaResponse = serde_json::from_str(body)?;

    let location = parsed.location.ok_or_else(|| missing("location"))?;
    let current = parsed.current.ok_or_else(|| missing("current"))?;

    map_observation(location, current)
}

fn map_observation(location: WaLocation, current: WaCurrent) -> Result<Observation, ProviderError> {
    let name = location
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| missing("location.name"))?;
    let last_updated = current.last_updated.ok_or_else(|| missing("current.last_updated"))?;
    let record_timestamp = to_utc(&last_updated, &location.tz_id).map_err(|err| {
        warn!(%last_updated, tz_id = %location.tz_id, %err, "WeatherAPI timestamp could not be converted");
        err
    })?;

    let wind_direction = current.wind_dir.parse::<WindDirection>().map_err(|_| {
        warn!(wind_dir = %current.wind_dir, "WeatherAPI reported an unknown wind direction");
        ProviderError::InvalidField { field: "current.wind_dir", value: current.wind_dir.clone() }
    })?;

    let uv = required(current.uv, "current.uv")?;

    Ok(Observation {
        location_name: name,
        region: location.region,
        country: location.country,
        latitude: location.lat,
        longitude: location.lon,
        condition_text: current.condition.text,
        condition_icon_url: current.condition.icon,
        temperature_c: required(current.temp_c, "current.temp_c")?,
        feels_like_c: required(current.feelslike_c, "current.feelslike_c")?,
        dewpoint_c: required(current.dewpoint_c, "current.dewpoint_c")?,
        wind_speed_kph: required(current.wind_kph, "current.wind_kph")?,
        gust_speed_kph: required(current.gust_kph, "current.gust_kph")?,
        wind_direction,
        pressure_mb: required(current.pressure_mb, "current.pressure_mb")?,
        precipitation_mm: required(current.precip_mm, "current.precip_mm")?,
        humidity_pct: required(current.humidity, "current.humidity")?,
        uv_index: uv.round() as i32,
        visibility_km: required(current.vis_km, "current.vis_km")?,
        record_timestamp,
    })
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, ProviderError> {
    value.ok_or_else(|| missing(field))
}

fn missing(field: &'static str) -> ProviderError {
    warn!(field, "WeatherAPI response is missing a mandatory field");
    ProviderError::MalformedResponse { field }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

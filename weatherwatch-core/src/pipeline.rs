//! The "refresh location" operation: fetch, store, alert, trend.

use anyhow::Context;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::task;
use tracing::{info, warn};

use crate::{
    alert::{AlertTag, evaluate},
    config::Config,
    error::PipelineError,
    model::{StoredObservation, WeatherRequest},
    provider::{WeatherProvider, provider_from_config},
    store::{ObservationStore, SqliteObservationStore},
    trend::{TrendSummary, compute_trend, default_trend_window},
};

/// Everything one refresh produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub observation: StoredObservation,
    /// Empty when no rule fired.
    pub alerts: Vec<AlertTag>,
    /// `None` when the trend window holds no observations.
    pub trend: Option<TrendSummary>,
}

/// Provider and store are injected; no global state is consulted.
pub struct Pipeline {
    provider: Box<dyn WeatherProvider>,
    store: Arc<dyn ObservationStore>,
    trend_window: Duration,
    forecast_days: Option<u8>,
}

impl Pipeline {
    pub fn new(provider: Box<dyn WeatherProvider>, store: Arc<dyn ObservationStore>) -> Self {
        Self { provider, store, trend_window: default_trend_window(), forecast_days: None }
    }

    /// WeatherAPI client plus the SQLite store named by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let path = config.database_path()?;
        let store = SqliteObservationStore::open(&path)
            .with_context(|| format!("Failed to open observation store at {}", path.display()))?;

        Ok(Self::new(provider, Arc::new(store)))
    }

    pub fn with_trend_window(mut self, window: Duration) -> Self {
        self.trend_window = window;
        self
    }

    /// Use the forecast endpoint; only its current block is consumed.
    pub fn with_forecast_days(mut self, days: Option<u8>) -> Self {
        self.forecast_days = days;
        self
    }

    /// Fetch the current conditions for `query`, persist them, then
    /// evaluate alerts and the trend for the stored location.
    ///
    /// Nothing after a failed fetch or a failed append runs. Store calls
    /// are blocking and run on tokio's blocking pool.
    pub async fn refresh_location(&self, query: &str) -> Result<RefreshOutcome, PipelineError> {
        let request = WeatherRequest { location: query.to_string(), forecast_days: self.forecast_days };

        let fetched = self.provider.fetch_current(&request).await.map_err(|err| {
            if !err.is_location_not_found() {
                warn!(query, %err, "Provider fetch failed");
            }
            PipelineError::from(err)
        })?;

        let store = Arc::clone(&self.store);
        let stored = task::spawn_blocking(move || store.append(fetched)).await?.map_err(|err| {
            warn!(query, %err, "Observation rejected by store");
            PipelineError::from(err)
        })?;

        let alerts = evaluate(&stored.observation);

        let store = Arc::clone(&self.store);
        let location = stored.observation.location_name.clone();
        let window = self.trend_window;
        let trend =
            task::spawn_blocking(move || compute_trend(store.as_ref(), &location, window)).await??;

        info!(
            location = %stored.observation.location_name,
            id = stored.id,
            alerts = alerts.len(),
            has_trend = trend.is_some(),
            "Refreshed location"
        );

        Ok(RefreshOutcome { observation: stored, alerts, trend })
    }
}

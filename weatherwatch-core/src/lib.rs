//! Core library for `weatherwatch`.
//!
//! This crate defines:
//! - Unit and timezone conversion
//! - The WeatherAPI.com client that maps payloads into canonical observations
//! - Append-only observation stores (SQLite and in-memory)
//! - Trend aggregation and extreme-condition alerts
//! - The pipeline that ties them into a single "refresh location" call
//!
//! It is used by `weatherwatch-cli`, but can also be embedded by other binaries or services.

pub mod alert;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod trend;

pub use alert::{AlertTag, alert_message, evaluate};
pub use config::Config;
pub use error::{ConvertError, FieldViolation, PipelineError, ProviderError, StoreError, ValidationError};
pub use model::{Observation, StoredObservation, WeatherRequest, WindDirection};
pub use pipeline::{Pipeline, RefreshOutcome};
pub use provider::{WeatherProvider, weatherapi::WeatherApiClient};
pub use store::{InMemoryObservationStore, ObservationStore, SqliteObservationStore};
pub use trend::{TrendSummary, compute_trend, compute_trend_at};

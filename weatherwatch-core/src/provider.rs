use crate::{
    config::Config,
    error::ProviderError,
    model::{Observation, WeatherRequest},
    provider::weatherapi::WeatherApiClient,
};
use anyhow::Context;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// Source of current-condition observations.
///
/// One call is one outbound request; implementations do not retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, request: &WeatherRequest) -> Result<Observation, ProviderError>;
}

/// Construct the WeatherAPI.com client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No WeatherAPI key configured.\n\
             Hint: run `weatherwatch configure` or set WEATHERAPI_API_KEY."
        )
    })?;

    let client = WeatherApiClient::with_options(
        api_key.to_owned(),
        config.provider.base_url.clone(),
        config.provider.timeout(),
    )
    .context("Failed to build WeatherAPI HTTP client")?;

    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No WeatherAPI key configured"));
        assert!(msg.contains("Hint: run `weatherwatch configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_is_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        assert!(provider_from_config(&cfg).is_ok());
    }
}

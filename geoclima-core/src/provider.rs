use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, WeatherOutcome, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::warn;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One request for current conditions at `at`.
    async fn current(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError>;

    /// Like `current`, but failures become `Unavailable` and are logged as warnings.
    /// Nothing is retried or cached.
    async fn fetch(&self, at: Coordinates) -> WeatherOutcome {
        match self.current(at).await {
            Ok(snapshot) => WeatherOutcome::Available(snapshot),
            Err(err) => {
                match &err {
                    WeatherError::Provider { status, message } => {
                        warn!(%at, status, "Weather provider refused request: {message}");
                    }
                    other => warn!(%at, "Could not reach weather provider: {other}"),
                }
                WeatherOutcome::Unavailable(err.into())
            }
        }
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    let provider = OpenWeatherProvider::from_settings(api_key.to_owned(), &config.weather)
        .map_err(|e| anyhow::anyhow!("Failed to build weather client: {e}"))?;

    Ok(Box::new(provider))
}

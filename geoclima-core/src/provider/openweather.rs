use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::{SunClock, WeatherSettings},
    error::WeatherError,
    model::{Coordinates, WeatherSnapshot},
};

use super::WeatherProvider;

/// Message used when an error response carries no `message` field.
pub const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: String,
    lang: String,
    clock: SunClock,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn from_settings(
        api_key: String,
        settings: &WeatherSettings,
    ) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            units: settings.units.clone(),
            lang: settings.lang.clone(),
            clock: settings.clock,
            http: builder.build()?,
        })
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        let lat = at.latitude().to_string();
        let lon = at.longitude().to_string();
        debug!(%at, "Requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OwError>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    debug!(%status, body = %truncate_body(&body), "Error response without message");
                    UNKNOWN_ERROR.to_string()
                });

            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Malformed(e.to_string()))?;

        snapshot_from(parsed, self.clock)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    clouds: Option<OwClouds>,
    visibility: Option<u32>,
    /// Shift in seconds from UTC for the queried location.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwError {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current(at).await
    }
}

fn snapshot_from(
    parsed: OwCurrentResponse,
    clock: SunClock,
) -> Result<WeatherSnapshot, WeatherError> {
    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Malformed("no weather conditions in response".to_string()))?;

    Ok(WeatherSnapshot {
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        pressure_hpa: parsed.main.pressure,
        cloudiness_pct: parsed.clouds.map(|c| c.all),
        visibility_m: parsed.visibility,
        description: capitalize(&condition.description),
        icon: condition.icon,
        sunrise: clock_time(parsed.sys.sunrise, clock, parsed.timezone)?,
        sunset: clock_time(parsed.sys.sunset, clock, parsed.timezone)?,
    })
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Render a unix timestamp as `HH:MM` on the requested clock.
fn clock_time(ts: i64, clock: SunClock, offset_secs: Option<i32>) -> Result<String, WeatherError> {
    let utc = DateTime::<Utc>::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::Malformed(format!("timestamp {ts} is out of range")))?;

    let formatted = match clock {
        SunClock::System => utc.with_timezone(&Local).format("%H:%M").to_string(),
        SunClock::Location => {
            let offset = offset_secs
                .and_then(FixedOffset::east_opt)
                .unwrap_or_else(|| Utc.fix());
            utc.with_timezone(&offset).format("%H:%M").to_string()
        }
    };

    Ok(formatted)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherOutcome;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> WeatherSettings {
        WeatherSettings {
            base_url: base_url.to_string(),
            clock: SunClock::Location,
            ..WeatherSettings::default()
        }
    }

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::from_settings("test_key".into(), &settings(&server.uri())).unwrap()
    }

    fn lima() -> Coordinates {
        Coordinates::new(-12.05, -77.03).unwrap()
    }

    fn clear_sky() -> serde_json::Value {
        json!({
            "main": {"temp": 22.5, "humidity": 60, "feels_like": 21.0, "pressure": 1013},
            "weather": [{"description": "cielo claro", "icon": "01d"}],
            "wind": {"speed": 3.1},
            "sys": {"sunrise": 1700000000, "sunset": 1700040000},
            "clouds": {"all": 10},
            "visibility": 10000
        })
    }

    #[tokio::test]
    async fn maps_successful_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "-12.05"))
            .and(query_param("lon", "-77.03"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "es"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clear_sky()))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = provider(&server).current(lima()).await.unwrap();

        assert_eq!(
            snapshot,
            WeatherSnapshot {
                temperature_c: 22.5,
                feels_like_c: 21.0,
                humidity_pct: 60,
                wind_speed_mps: 3.1,
                pressure_hpa: 1013,
                cloudiness_pct: Some(10),
                visibility_m: Some(10000),
                description: "Cielo claro".into(),
                icon: "01d".into(),
                sunrise: "22:13".into(),
                sunset: "09:20".into(),
            }
        );
    }

    #[tokio::test]
    async fn same_payload_maps_to_same_snapshot() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clear_sky()))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let first = provider.fetch(lima()).await;
        let second = provider.fetch(lima()).await;

        assert!(first.is_available());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn location_clock_uses_provider_offset() {
        let server = MockServer::start().await;

        let mut body = clear_sky();
        body["timezone"] = json!(-18000);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let snapshot = provider(&server).current(lima()).await.unwrap();
        assert_eq!(snapshot.sunrise, "17:13");
        assert_eq!(snapshot.sunset, "04:20");
    }

    #[tokio::test]
    async fn absent_clouds_and_visibility_are_unavailable() {
        let server = MockServer::start().await;

        let mut body = clear_sky();
        if let Some(obj) = body.as_object_mut() {
            obj.remove("clouds");
            obj.remove("visibility");
        }

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let snapshot = provider(&server).current(lima()).await.unwrap();
        assert_eq!(snapshot.cloudiness_pct, None);
        assert_eq!(snapshot.visibility_m, None);
        assert_eq!(snapshot.cloudiness_display(), "unavailable");
    }

    #[tokio::test]
    async fn provider_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"cod": 401, "message": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        match provider(&server).fetch(lima()).await {
            WeatherOutcome::Unavailable(unavailable) => {
                assert_eq!(unavailable.status, Some(401));
                assert_eq!(unavailable.message, "Invalid API key");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_without_message_is_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = provider(&server).current(lima()).await.unwrap_err();
        assert!(matches!(
            err,
            WeatherError::Provider { status: 429, ref message } if message == UNKNOWN_ERROR
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider(&server).current(lima()).await.unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_conditions_list_is_malformed() {
        let server = MockServer::start().await;

        let mut body = clear_sky();
        body["weather"] = json!([]);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = provider(&server).current(lima()).await.unwrap_err();
        assert!(err.to_string().contains("no weather conditions"));
    }

    #[tokio::test]
    async fn connection_failure_becomes_unavailable() {
        let provider =
            OpenWeatherProvider::from_settings("test_key".into(), &settings("http://127.0.0.1:9"))
                .unwrap();

        match provider.fetch(lima()).await {
            WeatherOutcome::Unavailable(unavailable) => {
                assert_eq!(unavailable.status, None);
                assert!(!unavailable.message.is_empty());
                assert!(!unavailable.message.contains("test_key"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn capitalize_matches_sentence_case() {
        assert_eq!(capitalize("cielo claro"), "Cielo claro");
        assert_eq!(capitalize("NUBES DISPERSAS"), "Nubes dispersas");
        assert_eq!(capitalize("ésta"), "Ésta");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "ñ".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}

//! # Daily Weather Forecast
//!
//! Fetches a three-day daily forecast from an Open-Meteo compatible API and
//! normalizes its parallel arrays into one [`ForecastDay`] per date.
//!
//! The API answers with one array per requested field, all indexed by day
//! offset:
//!
//! ```json
//! { "daily": {
//!     "time":    ["2024-06-15", "2024-06-16", "2024-06-17"],
//!     "sunrise": ["2024-06-15T05:45", ...],
//!     ...
//! } }
//! ```
//!
//! A missing field or a short array is reported as [`ForecastError::Shape`];
//! nothing is defaulted.

use crate::config::{ForecastConfig, LocationConfig};
use crate::WINDOW_DAYS;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Daily fields requested from the API, in request order.
pub const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min,sunrise,sunset,windspeed_10m_max,winddirection_10m_dominant";

/// Errors that can occur while fetching or decoding the forecast.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// HTTP request failed (network, timeout, or non-2xx status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body is not valid JSON
    #[error("invalid forecast JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A daily field is missing or shorter than the `time` array
    #[error("forecast field daily.{field}[{index}] missing")]
    Shape { field: &'static str, index: usize },

    /// A day in `daily.time` is not an ISO date
    #[error("invalid forecast date: {0}")]
    Date(String),
}

/// Weather for one calendar day.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Local time of sunrise, as sent by the API after the `T`
    pub sunrise: String,
    pub sunset: String,
    /// Maximum temperature, °C
    pub tmax: f32,
    /// Minimum temperature, °C
    pub tmin: f32,
    /// WMO weather interpretation code
    pub weather_code: u8,
    /// Maximum wind speed, km/h
    pub wind_speed: f32,
    /// Dominant wind direction, degrees 0-359
    pub wind_direction_deg: u16,
}

impl ForecastDay {
    pub fn weather_text(&self) -> &'static str {
        weather_text(self.weather_code)
    }

    pub fn wind_cardinal(&self) -> &'static str {
        wind_cardinal(self.wind_direction_deg)
    }
}

/// Raw API body; only the `daily` block is used.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyData,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "weathercode")]
    weather_code: Option<Vec<u8>>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Option<Vec<f32>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Option<Vec<f32>>,
    sunrise: Option<Vec<String>>,
    sunset: Option<Vec<String>>,
    #[serde(rename = "windspeed_10m_max")]
    wind_speed_max: Option<Vec<f32>>,
    #[serde(rename = "winddirection_10m_dominant")]
    wind_direction: Option<Vec<u16>>,
}

/// Value of a parallel array at `index`, or a shape error naming the field.
fn field<T: Clone>(
    values: &Option<Vec<T>>,
    name: &'static str,
    index: usize,
) -> Result<T, ForecastError> {
    values
        .as_ref()
        .and_then(|values| values.get(index))
        .cloned()
        .ok_or(ForecastError::Shape { field: name, index })
}

/// Download the daily forecast for the configured location.
///
/// No retries; the timeout is the configured one, or the client default when
/// none is set.
pub async fn fetch_forecast(
    location: &LocationConfig,
    config: &ForecastConfig,
) -> Result<Vec<ForecastDay>, ForecastError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    info!(url = %config.url, location = %location.name, "fetching forecast");
    let body = client
        .get(config.url.as_str())
        .query(&forecast_query(location))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_forecast(&body)
}

/// Query parameters for a three-day daily forecast at `location`.
pub fn forecast_query(location: &LocationConfig) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", location.latitude.to_string()),
        ("longitude", location.longitude.to_string()),
        ("daily", DAILY_FIELDS.to_string()),
        ("forecast_days", WINDOW_DAYS.to_string()),
        ("timezone", location.timezone.clone()),
    ]
}

/// Decode an API body into one [`ForecastDay`] per entry of `daily.time`.
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastDay>, ForecastError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let daily = response.daily;

    let days = daily
        .time
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| ForecastError::Date(day.clone()))?;
            Ok(ForecastDay {
                date,
                sunrise: time_of_day(&field(&daily.sunrise, "sunrise", i)?).to_string(),
                sunset: time_of_day(&field(&daily.sunset, "sunset", i)?).to_string(),
                tmax: field(&daily.temperature_max, "temperature_2m_max", i)?,
                tmin: field(&daily.temperature_min, "temperature_2m_min", i)?,
                weather_code: field(&daily.weather_code, "weathercode", i)?,
                wind_speed: field(&daily.wind_speed_max, "windspeed_10m_max", i)?,
                wind_direction_deg: field(&daily.wind_direction, "winddirection_10m_dominant", i)?,
            })
        })
        .collect::<Result<Vec<_>, ForecastError>>()?;

    debug!(days = days.len(), "parsed forecast");
    Ok(days)
}

/// Part of an ISO timestamp after the first `T`; the whole string if there is none.
pub fn time_of_day(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .map_or(timestamp, |(_, time)| time)
}

/// French label for a WMO weather code group.
pub fn weather_text(code: u8) -> &'static str {
    match code {
        0 => "☀️ Ensoleillé",
        1..=3 => "🌤️ Partiellement nuageux",
        45 | 48 => "🌫️ Brouillard",
        51 | 53 | 55 | 56 | 57 => "🌦️ Bruine",
        61 | 63 | 65 | 80 | 81 | 82 => "🌧️ Pluie",
        66 | 67 | 71 | 73 | 75 | 77 | 85 | 86 => "❄️ Neige",
        95 | 96 | 99 => "⛈️ Orage",
        _ => "❔",
    }
}

/// Eight-point French compass direction for a bearing in degrees.
pub fn wind_cardinal(degrees: u16) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SO", "O", "NO"];
    POINTS[((degrees as f32 + 22.5) / 45.0) as usize % 8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::http_stub::{response, serve_once, serve_silently};

    const BODY: &str = r#"{
        "latitude": 49.5, "longitude": 0.1, "timezone": "Europe/Paris",
        "daily_units": {"temperature_2m_max": "°C"},
        "daily": {
            "time": ["2024-06-15", "2024-06-16", "2024-06-17"],
            "weathercode": [3, 61, 0],
            "temperature_2m_max": [19.4, 17.2, 21.0],
            "temperature_2m_min": [11.0, 12.3, 10.8],
            "sunrise": ["2024-06-15T05:45", "2024-06-16T05:45", "2024-06-17T05:45"],
            "sunset": ["2024-06-15T22:01", "2024-06-16T22:02", "2024-06-17T22:02"],
            "windspeed_10m_max": [22.3, 31.0, 12.5],
            "winddirection_10m_dominant": [250, 275, 10]
        }
    }"#;

    #[test]
    fn test_parse_forecast() {
        let days = parse_forecast(BODY).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(days[0].sunrise, "05:45");
        assert_eq!(days[2].sunset, "22:02");
        assert_eq!(days[1].weather_code, 61);
        assert_eq!(days[1].weather_text(), "🌧️ Pluie");
        assert_eq!(days[0].wind_cardinal(), "O");
        assert_eq!(days[2].tmin, 10.8);
    }

    #[test]
    fn test_missing_field_is_shape_error() {
        let body = BODY.replace(r#""sunset": ["2024-06-15T22:01", "2024-06-16T22:02", "2024-06-17T22:02"],"#, "");
        match parse_forecast(&body) {
            Err(ForecastError::Shape { field, index }) => {
                assert_eq!(field, "sunset");
                assert_eq!(index, 0);
            }
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_array_is_shape_error() {
        let body = BODY.replace("[3, 61, 0]", "[3, 61]");
        assert!(matches!(
            parse_forecast(&body),
            Err(ForecastError::Shape { field: "weathercode", index: 2 })
        ));
    }

    #[test]
    fn test_missing_daily_block() {
        assert!(matches!(parse_forecast("{}"), Err(ForecastError::Json(_))));
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(time_of_day("2024-06-15T05:45:00+02:00"), "05:45:00+02:00");
        assert_eq!(time_of_day("05:45"), "05:45");
    }

    #[test]
    fn test_wind_cardinal() {
        assert_eq!(wind_cardinal(0), "N");
        assert_eq!(wind_cardinal(22), "N");
        assert_eq!(wind_cardinal(23), "NE");
        assert_eq!(wind_cardinal(180), "S");
        assert_eq!(wind_cardinal(225), "SO");
        assert_eq!(wind_cardinal(270), "O");
        assert_eq!(wind_cardinal(350), "N");
    }

    #[test]
    fn test_weather_text() {
        assert_eq!(weather_text(0), "☀️ Ensoleillé");
        assert_eq!(weather_text(2), "🌤️ Partiellement nuageux");
        assert_eq!(weather_text(48), "🌫️ Brouillard");
        assert_eq!(weather_text(75), "❄️ Neige");
        assert_eq!(weather_text(99), "⛈️ Orage");
        assert_eq!(weather_text(42), "❔");
    }

    fn config_for(url: String) -> ForecastConfig {
        ForecastConfig {
            url,
            ..ForecastConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_daily_query() {
        let (url, server) = serve_once(response("200 OK", BODY));

        let days = fetch_forecast(&LocationConfig::default(), &config_for(format!("{url}/v1/forecast")))
            .await
            .unwrap();
        assert_eq!(days.len(), 3);

        let head = server.join().unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /v1/forecast?"));
        assert!(request_line.contains("forecast_days=3"));
        assert!(request_line.contains("timezone=Europe%2FParis"));
        assert!(request_line.contains("latitude=49.4938"));
        assert!(request_line.contains("daily=weathercode%2Ctemperature_2m_max%2C"));
        assert!(request_line.contains("winddirection_10m_dominant"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_http_error() {
        let (url, server) = serve_once(response("503 Service Unavailable", ""));

        match fetch_forecast(&LocationConfig::default(), &config_for(url)).await {
            Err(ForecastError::Http(err)) => {
                assert_eq!(err.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
        server.join().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_http_error() {
        let config = ForecastConfig {
            timeout_secs: Some(1),
            ..config_for(serve_silently())
        };
        match fetch_forecast(&LocationConfig::default(), &config).await {
            Err(ForecastError::Http(err)) => assert!(err.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_forecast_query() {
        let query = forecast_query(&LocationConfig::default());
        assert!(query.contains(&("forecast_days", "3".to_string())));
        assert!(query.contains(&("timezone", "Europe/Paris".to_string())));
        assert!(query.contains(&("latitude", "49.4938".to_string())));
    }
}

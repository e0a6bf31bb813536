//! Current-weather lookup and the plant-care advice derived from it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use plantguard_core::config::WeatherConfig;
use plantguard_core::{WeatherQuery, WeatherSnapshot};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::DependencyError;

/// A remote current-weather service.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Look up `query`. `WeatherQuery::Default` is resolved by the caller.
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, DependencyError>;
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    name: String,
    sys: OwmSys,
    #[serde(default)]
    visibility: f64,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

impl OwmResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, DependencyError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| DependencyError::InvalidResponse("no weather conditions".to_string()))?;

        Ok(WeatherSnapshot {
            temp_c: round1(self.main.temp),
            feels_like_c: round1(self.main.feels_like),
            humidity_pct: self.main.humidity,
            description: title_case(&condition.description),
            icon: condition.icon,
            wind_kmh: round1(self.wind.speed * 3.6),
            city: self.name,
            country: self.sys.country,
            pressure: self.main.pressure,
            visibility_km: self.visibility / 1000.0,
        })
    }
}

/// OpenWeatherMap "current weather" client, metric units.
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self, DependencyError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            timeout,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, DependencyError> {
        let mut params = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        match query {
            WeatherQuery::City(city) => params.push(("q", city.clone())),
            WeatherQuery::Coordinates { lat, lon } => {
                params.push(("lat", lat.to_string()));
                params.push(("lon", lon.to_string()));
            }
            WeatherQuery::Default => {
                return Err(DependencyError::InvalidResponse(
                    "no location to look up".to_string(),
                ))
            }
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| DependencyError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DependencyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DependencyError::from_reqwest(e, self.timeout))?;
        let parsed: OwmResponse = serde_json::from_str(&body)?;
        parsed.into_snapshot()
    }
}

/// Best-effort weather lookup for the pipelines.
///
/// Resolves `WeatherQuery::Default` to the configured city. Disabled or
/// failing lookups yield `None`.
pub struct WeatherEnricher {
    provider: Option<Arc<dyn WeatherProvider>>,
    default_city: String,
}

impl WeatherEnricher {
    pub fn new(provider: Arc<dyn WeatherProvider>, default_city: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            default_city: default_city.into(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            provider: None,
            default_city: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn lookup(&self, query: &WeatherQuery) -> Option<WeatherSnapshot> {
        let provider = self.provider.as_ref()?;
        let resolved = match query {
            WeatherQuery::Default => WeatherQuery::City(self.default_city.clone()),
            other => other.clone(),
        };

        match provider.current(&resolved).await {
            Ok(snapshot) => {
                debug!(city = %snapshot.city, temp_c = snapshot.temp_c, "Fetched weather");
                Some(snapshot)
            }
            Err(e) => {
                warn!(query = ?resolved, error = %e, "Weather lookup failed");
                None
            }
        }
    }
}

/// Plant-care advice for the given conditions.
pub fn plant_care_tips(weather: &WeatherSnapshot) -> Vec<String> {
    let mut tips = Vec::new();

    if weather.temp_c > 30.0 {
        tips.push("🌡️ High temperature: Water plants more frequently and provide shade".to_string());
    } else if weather.temp_c < 10.0 {
        tips.push("❄️ Low temperature: Protect sensitive plants from cold".to_string());
    }

    if weather.humidity_pct > 80.0 {
        tips.push("💧 High humidity: Watch for fungal diseases, ensure good air circulation".to_string());
    } else if weather.humidity_pct < 30.0 {
        tips.push("🌵 Low humidity: Increase watering frequency".to_string());
    }

    if weather.wind_kmh > 30.0 {
        tips.push("💨 Strong winds: Stake tall plants and protect from wind damage".to_string());
    }

    tips
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Weather provider for tests: a fixed snapshot, or failure.
#[derive(Debug, Default)]
pub struct MockWeatherProvider {
    snapshot: Option<WeatherSnapshot>,
    queries: Mutex<Vec<WeatherQuery>>,
}

impl MockWeatherProvider {
    pub fn returning(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Every query received, in order.
    pub fn queries(&self) -> Vec<WeatherQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, DependencyError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        self.snapshot
            .clone()
            .ok_or_else(|| DependencyError::InvalidResponse("weather unavailable".to_string()))
    }
}

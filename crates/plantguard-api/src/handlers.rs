//! Route handler functions for all API endpoints.
//!
//! Handlers only extract and shape data; the flows live in `pipeline`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};

use plantguard_chat::plant_care_tips;
use plantguard_core::{WeatherQuery, WeatherSnapshot, DEFAULT_SESSION_ID};
use plantguard_vision::ValidationError;

use crate::error::ApiError;
use crate::pipeline::{run_chat, run_detection};
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
    pub location: Option<String>,
}

/// Weather lookup input, from the query string or a JSON body.
///
/// Coordinates are kept as text so unparsable values can be told apart from
/// absent ones.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub lat: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub lon: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl WeatherParams {
    /// City, then coordinates, then the default city.
    ///
    /// Coordinates that are given but unparsable yield `None`.
    pub fn to_query(&self) -> Option<WeatherQuery> {
        let city = present(&self.location);
        let coordinates = match (present(&self.lat), present(&self.lon)) {
            (Some(lat), Some(lon)) if city.is_none() => {
                let lat = lat.parse::<f64>().ok().filter(|v| v.is_finite())?;
                let lon = lon.parse::<f64>().ok().filter(|v| v.is_finite())?;
                (Some(lat), Some(lon))
            }
            _ => (None, None),
        };

        Some(WeatherQuery::resolve(city, coordinates.0, coordinates.1))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectResponse {
    /// Display name, e.g. "Tomato - Early blight".
    pub disease: String,
    pub disease_label: String,
    pub plant_type: String,
    pub is_healthy: bool,
    /// Percent, rounded to two decimals.
    pub confidence: f64,
    pub cause: String,
    pub treatment: String,
    pub prevention: String,
    pub message: String,
    /// Base64 MPEG audio of `message`, when available.
    pub audio: Option<String>,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub audio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(flatten)]
    pub weather: WeatherSnapshot,
    pub plant_care_tips: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub classifier: String,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /api/detect - multipart `image` file plus optional `session_id`.
pub async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Internal(format!("multipart: {}", e)))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut session_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(ApiError::from)?;
                upload = Some((filename, bytes.to_vec()));
            }
            "session_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(ApiError::from)?;
                session_id = Some(text);
            }
            _ => {}
        }
    }

    let (filename, bytes) = upload.ok_or(ValidationError::MissingImage)?;
    let session_id = session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let outcome = run_detection(&state, &filename, &bytes, &session_id).await?;

    Ok(Json(DetectResponse {
        disease: outcome.diagnostic.display_name,
        disease_label: outcome.diagnostic.disease_label,
        plant_type: outcome.diagnostic.plant_type,
        is_healthy: outcome.diagnostic.is_healthy,
        confidence: round2(outcome.diagnostic.confidence),
        cause: outcome.treatment.cause,
        treatment: outcome.treatment.treatment,
        prevention: outcome.treatment.prevention,
        message: outcome.message,
        audio: outcome.audio.map(|clip| clip.to_base64()),
        session_id: outcome.session_id,
    }))
}

/// POST /api/chat - JSON `{message, session_id?, location?}`.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::bad_request("bad_request", e.body_text()))?;

    let session_id = request
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION_ID);

    let outcome = run_chat(
        &state,
        &request.message,
        session_id,
        request.location.as_deref(),
    )
    .await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        audio: outcome.audio.map(|clip| clip.to_base64()),
    }))
}

/// GET /api/weather?location=&lat=&lon=
pub async fn weather_get(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherResponse>, ApiError> {
    weather_for(&state, &params).await
}

/// POST /api/weather - JSON `{location?, lat?, lon?}`.
pub async fn weather_post(
    State(state): State<AppState>,
    body: Result<Json<WeatherParams>, JsonRejection>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let Json(params) =
        body.map_err(|e| ApiError::bad_request("bad_request", e.body_text()))?;
    weather_for(&state, &params).await
}

async fn weather_for(state: &AppState, params: &WeatherParams) -> Result<Json<WeatherResponse>, ApiError> {
    let query = params.to_query().ok_or_else(ApiError::weather_unavailable)?;
    let weather = state
        .weather
        .lookup(&query)
        .await
        .ok_or_else(ApiError::weather_unavailable)?;

    Ok(Json(WeatherResponse {
        plant_care_tips: plant_care_tips(&weather),
        weather,
    }))
}

/// GET /health - liveness plus a few counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
        classifier: state.classifier.name().to_string(),
    })
}

fn round2(confidence: f32) -> f64 {
    (f64::from(confidence) * 100.0).round() / 100.0
}

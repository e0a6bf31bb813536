use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between plant type and condition in classifier labels.
pub const LABEL_SEPARATOR: &str = "___";

/// Plant type reported when a label carries no separator.
pub const UNKNOWN_PLANT: &str = "Unknown";

/// Session key used when the caller does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default";

// =============================================================================
// Classification
// =============================================================================

/// Raw classifier output: a label and its confidence in percent (0..100).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// A classifier label decoded into its tagged parts.
///
/// Labels follow `<PlantType>___<ConditionName>`; a condition containing
/// "healthy" (any case) marks a disease-free plant. Parsed once, right after
/// classification, so nothing downstream re-splits label strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseLabel {
    pub raw: String,
    pub plant_type: String,
    pub condition: String,
    pub is_healthy: bool,
}

impl DiseaseLabel {
    pub fn parse(raw: &str) -> Self {
        let (plant_type, condition) = match raw.split_once(LABEL_SEPARATOR) {
            Some((plant, condition)) => (plant.to_string(), condition.to_string()),
            None => (UNKNOWN_PLANT.to_string(), raw.to_string()),
        };

        Self {
            raw: raw.to_string(),
            plant_type,
            condition,
            is_healthy: raw.to_lowercase().contains("healthy"),
        }
    }

    /// Human-readable form: `Tomato___Early_blight` -> `Tomato - Early blight`.
    pub fn display_name(&self) -> String {
        self.raw.replace(LABEL_SEPARATOR, " - ").replace('_', " ")
    }
}

// =============================================================================
// Diagnosis
// =============================================================================

/// Outcome of one successful detection. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub disease_label: String,
    pub display_name: String,
    /// Confidence in percent (0..100).
    pub confidence: f32,
    pub plant_type: String,
    pub is_healthy: bool,
}

impl DiagnosticResult {
    pub fn from_classification(classification: &Classification) -> Self {
        let label = DiseaseLabel::parse(&classification.label);
        Self {
            display_name: label.display_name(),
            disease_label: label.raw,
            confidence: classification.confidence,
            plant_type: label.plant_type,
            is_healthy: label.is_healthy,
        }
    }

    /// "Healthy" or "Disease detected", as shown to the language model.
    pub fn status(&self) -> &'static str {
        if self.is_healthy {
            "Healthy"
        } else {
            "Disease detected"
        }
    }
}

/// Cause, treatment and prevention text for a diagnosis.
///
/// Always fully populated: either language-model output with per-field
/// defaults, or a complete canned fallback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentInfo {
    pub cause: String,
    pub treatment: String,
    pub prevention: String,
}

/// The latest diagnosis recorded for a session, used to ground chat replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub diagnostic: DiagnosticResult,
    pub treatment: TreatmentInfo,
    pub captured_at: DateTime<Utc>,
}

// =============================================================================
// Weather
// =============================================================================

/// Current conditions at a location. Fetched per request, never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "temperature")]
    pub temp_c: f64,
    #[serde(rename = "feels_like")]
    pub feels_like_c: f64,
    #[serde(rename = "humidity")]
    pub humidity_pct: f64,
    pub description: String,
    pub icon: String,
    #[serde(rename = "wind_speed")]
    pub wind_kmh: f64,
    pub city: String,
    pub country: String,
    pub pressure: f64,
    #[serde(rename = "visibility")]
    pub visibility_km: f64,
}

/// Where to look up weather.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
    /// Use the configured default city.
    Default,
}

impl WeatherQuery {
    /// Resolve caller input: explicit city, then coordinates, then default.
    ///
    /// Blank city names count as absent.
    pub fn resolve(city: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Self {
        if let Some(name) = city.map(str::trim).filter(|c| !c.is_empty()) {
            return WeatherQuery::City(name.to_string());
        }
        match (lat, lon) {
            (Some(lat), Some(lon)) => WeatherQuery::Coordinates { lat, lon },
            _ => WeatherQuery::Default,
        }
    }
}

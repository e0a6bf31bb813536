use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlantGuardError, Result};

/// Default minimum classifier confidence (percent) before a result is trusted.
///
/// Heuristic guard against non-plant photos, not a calibrated statistic.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 15.0;

/// Default timeout for weather lookups, in seconds.
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 5;

/// Top-level configuration for the PlantGuard service.
///
/// Loaded from `plantguard.toml` by default. Each section corresponds to one
/// pipeline component or to the HTTP surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantGuardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl PlantGuardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlantGuardConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, or the defaults when the file
    /// does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.classifier.min_confidence) {
            return Err(PlantGuardError::Config(format!(
                "classifier.min_confidence must be within 0..=100, got {}",
                self.classifier.min_confidence
            )));
        }
        if self.classifier.input_size == 0 {
            return Err(PlantGuardError::Config(
                "classifier.input_size must be greater than 0".to_string(),
            ));
        }
        if self.image.allowed_extensions.is_empty() {
            return Err(PlantGuardError::Config(
                "image.allowed_extensions must not be empty".to_string(),
            ));
        }
        let timeouts = [
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("voice.timeout_secs", self.voice.timeout_secs),
            ("weather.timeout_secs", self.weather.timeout_secs),
        ];
        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(PlantGuardError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        if self.chat.max_message_chars == 0 {
            return Err(PlantGuardError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a required secret from the environment variable `var`.
///
/// Missing or blank values are configuration errors; the process must not
/// start without them.
pub fn require_secret(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(PlantGuardError::Config(format!(
            "{} environment variable is required",
            var
        ))),
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Maximum request body size in bytes (image uploads).
    pub max_upload_bytes: usize,
    /// Requests per second accepted on the API routes. 0 disables limiting.
    pub rate_limit_per_sec: u64,
    /// Allowed CORS origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            rate_limit_per_sec: 50,
            allowed_origins: Vec::new(),
        }
    }
}

/// Upload validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Minimum width and height in pixels.
    pub min_dimension: u32,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_dimension: 50,
            allowed_extensions: ["jpg", "jpeg", "png", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Disease classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Directory holding `model.onnx` and `config.json` (id2label).
    pub model_dir: String,
    /// Square input edge length expected by the model.
    pub input_size: u32,
    /// Results below this confidence (percent) are rejected.
    pub min_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_dir: "./agri-plant-disease-resnet50".to_string(),
            input_size: 224,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Language-model (chat completions) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub treatment_temperature: f32,
    pub treatment_max_tokens: u32,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
    pub chat_top_p: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
            treatment_temperature: 0.3,
            treatment_max_tokens: 400,
            chat_temperature: 0.7,
            chat_max_tokens: 500,
            chat_top_p: 0.9,
        }
    }
}

/// Chat endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted message length in characters.
    pub max_message_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 2000,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            timeout_secs: 15,
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// Weather lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    /// Current-weather endpoint (OpenWeatherMap shape).
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// City used when the caller gives neither a city nor coordinates.
    pub default_city: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            api_key_env: "WEATHER_API_KEY".to_string(),
            timeout_secs: DEFAULT_WEATHER_TIMEOUT_SECS,
            default_city: "Karachi".to_string(),
        }
    }
}

/// Session context retention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes after which a session's diagnosis is forgotten. 0 keeps it
    /// for the life of the process.
    pub ttl_minutes: u64,
    /// Maximum number of sessions held. 0 is unbounded; at capacity the
    /// oldest diagnosis is evicted.
    pub max_entries: usize,
}

//! Text-to-speech: a provider trait, the ElevenLabs client, and the
//! best-effort wrapper the pipelines call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use plantguard_core::config::VoiceConfig;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::DependencyError;

/// Synthesized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/mpeg".to_string(),
        }
    }

    /// Standard base64, as embedded in JSON responses.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// A remote text-to-speech service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, DependencyError>;
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsClient {
    http: Client,
    base_url: String,
    voice_id: String,
    model_id: String,
    api_key: String,
    stability: f32,
    similarity_boost: f32,
    timeout: Duration,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .finish()
    }
}

impl ElevenLabsClient {
    pub fn new(config: &VoiceConfig, api_key: String) -> Result<Self, DependencyError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            api_key,
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            timeout,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, DependencyError> {
        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        });

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
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

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DependencyError::from_reqwest(e, self.timeout))?;
        if bytes.is_empty() {
            return Err(DependencyError::InvalidResponse("empty audio body".to_string()));
        }
        Ok(AudioClip::mpeg(bytes.to_vec()))
    }
}

/// Best-effort speech. Disabled, failing or empty input all yield `None`.
pub struct VoiceSynthesizer {
    provider: Option<Arc<dyn SpeechSynthesizer>>,
}

impl VoiceSynthesizer {
    pub fn new(provider: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A synthesizer that never calls out.
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn synthesize(&self, text: &str) -> Option<AudioClip> {
        let provider = self.provider.as_ref()?;
        if text.trim().is_empty() {
            return None;
        }

        match provider.synthesize(text).await {
            Ok(clip) => {
                debug!(bytes = clip.bytes.len(), "Synthesized speech");
                Some(clip)
            }
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed, continuing without audio");
                None
            }
        }
    }
}

/// In-memory speech provider for tests: returns fixed bytes or fails.
#[derive(Debug, Default)]
pub struct MockSpeechSynthesizer {
    audio: Option<Vec<u8>>,
    texts: Mutex<Vec<String>>,
}

impl MockSpeechSynthesizer {
    pub fn returning(audio: impl Into<Vec<u8>>) -> Self {
        Self {
            audio: Some(audio.into()),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Every text passed to `synthesize`, in order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, DependencyError> {
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }
        match &self.audio {
            Some(bytes) => Ok(AudioClip::mpeg(bytes.clone())),
            None => Err(DependencyError::InvalidResponse("speech unavailable".to_string())),
        }
    }
}

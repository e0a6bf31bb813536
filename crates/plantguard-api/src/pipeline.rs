//! The detect and chat request flows, independent of HTTP extraction.

use plantguard_chat::{detection_message, AudioClip, ChatError};
use plantguard_core::{DiagnosticResult, TreatmentInfo, WeatherQuery};
use plantguard_vision::VisionError;
use tracing::info;

use crate::state::AppState;

/// Everything a successful detection produces.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub diagnostic: DiagnosticResult,
    pub treatment: TreatmentInfo,
    pub message: String,
    pub audio: Option<AudioClip>,
    pub session_id: String,
}

/// Validate, classify, gate, explain, speak, then remember.
///
/// Stops at the first vision failure; treatment and voice never fail.
pub async fn run_detection(
    state: &AppState,
    filename: &str,
    bytes: &[u8],
    session_id: &str,
) -> Result<DetectionOutcome, VisionError> {
    let validated = state.validator.validate(filename, bytes)?;
    let classification = state.classifier.classify_boxed(&validated.image).await?;
    let classification = state.gate.check(classification)?;

    let diagnostic = DiagnosticResult::from_classification(&classification);
    info!(
        session_id,
        label = %diagnostic.disease_label,
        confidence = diagnostic.confidence,
        healthy = diagnostic.is_healthy,
        "Plant classified"
    );

    let treatment = state.treatment.generate(&diagnostic).await;
    let message = detection_message(&diagnostic, &treatment);
    let audio = state.voice.synthesize(&message).await;

    state
        .sessions
        .put(session_id, diagnostic.clone(), treatment.clone());

    Ok(DetectionOutcome {
        diagnostic,
        treatment,
        message,
        audio,
        session_id: session_id.to_string(),
    })
}

/// A chat reply and its optional spoken form.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub audio: Option<AudioClip>,
}

/// Answer a chat message using the session's latest diagnosis and weather
/// for `location` (or the default city).
pub async fn run_chat(
    state: &AppState,
    message: &str,
    session_id: &str,
    location: Option<&str>,
) -> Result<ChatOutcome, ChatError> {
    let message = state.chat.validate_message(message)?;

    let context = state.sessions.get(session_id);
    let query = WeatherQuery::resolve(location, None, None);
    let weather = state.weather.lookup(&query).await;

    let response = state
        .chat
        .reply(message, context.as_ref(), weather.as_ref())
        .await;
    let audio = state.voice.synthesize(&response).await;

    info!(
        session_id,
        has_context = context.is_some(),
        has_weather = weather.is_some(),
        has_audio = audio.is_some(),
        "Chat reply sent"
    );

    Ok(ChatOutcome { response, audio })
}

//! Language-model driven parts of PlantGuard: treatment advice, the chat
//! assistant, per-session diagnosis memory, and the best-effort voice and
//! weather side calls.

pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod session;
pub mod treatment;
pub mod voice;
pub mod weather;

pub use error::{ChatError, DependencyError};
pub use llm::{CompletionRequest, LanguageModel, MockLanguageModel, OpenAiChatClient};
pub use orchestrator::ChatOrchestrator;
pub use session::SessionContextStore;
pub use treatment::{detection_message, fallback_treatment, TreatmentGenerator};
pub use voice::{AudioClip, ElevenLabsClient, MockSpeechSynthesizer, SpeechSynthesizer, VoiceSynthesizer};
pub use weather::{
    plant_care_tips, MockWeatherProvider, OpenWeatherClient, WeatherEnricher, WeatherProvider,
};

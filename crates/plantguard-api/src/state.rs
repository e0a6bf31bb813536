//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use plantguard_chat::{
    ChatOrchestrator, LanguageModel, SessionContextStore, TreatmentGenerator, VoiceSynthesizer,
    WeatherEnricher,
};
use plantguard_core::PlantGuardConfig;
use plantguard_vision::{ConfidenceGate, DynDiseaseClassifier, ImageValidator};

/// Shared application state.
///
/// All fields use `Arc` (or are `Copy`) for cheap cloning across handler
/// tasks. The only mutable state is the session store, which locks
/// internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlantGuardConfig>,
    pub validator: Arc<ImageValidator>,
    pub classifier: Arc<dyn DynDiseaseClassifier>,
    pub gate: ConfidenceGate,
    pub treatment: Arc<TreatmentGenerator>,
    pub chat: Arc<ChatOrchestrator>,
    pub sessions: Arc<SessionContextStore>,
    pub weather: Arc<WeatherEnricher>,
    pub voice: Arc<VoiceSynthesizer>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the pipeline components around the given collaborators.
    ///
    /// Everything not passed in is derived from `config`.
    pub fn new(
        config: PlantGuardConfig,
        classifier: Arc<dyn DynDiseaseClassifier>,
        llm: Arc<dyn LanguageModel>,
        weather: WeatherEnricher,
        voice: VoiceSynthesizer,
    ) -> Self {
        Self {
            validator: Arc::new(ImageValidator::new(&config.image)),
            gate: ConfidenceGate::new(config.classifier.min_confidence),
            treatment: Arc::new(TreatmentGenerator::new(Arc::clone(&llm), &config.llm)),
            chat: Arc::new(ChatOrchestrator::new(llm, &config.llm, &config.chat)),
            sessions: Arc::new(SessionContextStore::from_config(&config.session)),
            classifier,
            weather: Arc::new(weather),
            voice: Arc::new(voice),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}

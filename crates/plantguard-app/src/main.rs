//! PlantGuard application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Resolve API keys from the environment
//! 3. Load the ONNX disease classifier
//! 4. Build the language-model, voice and weather clients
//! 5. Start the axum REST API server
//!
//! Any configuration or model failure stops the process before the server
//! binds, with a non-zero exit status.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use plantguard_api::state::AppState;
use plantguard_chat::{
    ElevenLabsClient, OpenAiChatClient, OpenWeatherClient, VoiceSynthesizer, WeatherEnricher,
};
use plantguard_core::config::require_secret;
use plantguard_core::{PlantGuardConfig, PlantGuardError};
use plantguard_vision::OnnxClassifier;

use cli::CliArgs;

fn build_voice(config: &PlantGuardConfig) -> Result<VoiceSynthesizer, PlantGuardError> {
    if !config.voice.enabled {
        tracing::info!("Voice synthesis disabled in config");
        return Ok(VoiceSynthesizer::disabled());
    }
    let key = require_secret(&config.voice.api_key_env)?;
    let client = ElevenLabsClient::new(&config.voice, key)?;
    tracing::info!(voice_id = %config.voice.voice_id, "Voice synthesis enabled");
    Ok(VoiceSynthesizer::new(Arc::new(client)))
}

fn build_weather(config: &PlantGuardConfig) -> Result<WeatherEnricher, PlantGuardError> {
    if !config.weather.enabled {
        tracing::info!("Weather enrichment disabled in config");
        return Ok(WeatherEnricher::disabled());
    }
    let key = require_secret(&config.weather.api_key_env)?;
    let client = OpenWeatherClient::new(&config.weather, key)?;
    tracing::info!(default_city = %config.weather.default_city, "Weather enrichment enabled");
    Ok(WeatherEnricher::new(
        Arc::new(client),
        config.weather.default_city.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<(), PlantGuardError> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = PlantGuardConfig::load_or_default(&config_file)?;
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        config = %config_file.display(),
        "Starting PlantGuard v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e);
    }

    // Secrets.
    let llm_key = match require_secret(&config.llm.api_key_env) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "Language-model API key missing");
            return Err(e);
        }
    };

    // Classifier.
    let model_dir = Path::new(&config.classifier.model_dir);
    let classifier = match OnnxClassifier::from_directory(model_dir, config.classifier.input_size) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %model_dir.display(), error = %e, "Failed to load disease model");
            return Err(e.into());
        }
    };
    tracing::info!(
        path = %model_dir.display(),
        labels = classifier.labels().len(),
        "Disease classifier loaded"
    );

    // Collaborators.
    let llm = OpenAiChatClient::new(&config.llm, llm_key)?;
    tracing::info!(model = %config.llm.model, "Language-model client ready");
    let voice = build_voice(&config)?;
    let weather = build_weather(&config)?;

    let state = AppState::new(config, Arc::new(classifier), Arc::new(llm), weather, voice);

    // === API server ===

    plantguard_api::start_server(state).await?;

    Ok(())
}

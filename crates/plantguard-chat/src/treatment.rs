//! Treatment generation: one language-model call, never fails.

use std::sync::{Arc, LazyLock};

use plantguard_core::config::LlmConfig;
use plantguard_core::{DiagnosticResult, TreatmentInfo};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::DependencyError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompt::{treatment_prompt, TREATMENT_SYSTEM_PROMPT};

const DEFAULT_CAUSE: &str = "Plant condition detected";
const DEFAULT_TREATMENT: &str = "Consult with agricultural expert";
const DEFAULT_PREVENTION: &str = "Maintain good plant health";

/// First `{` to last `}`, across lines.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid JSON object regex"));

/// Produces cause, treatment and prevention text for a diagnosis.
pub struct TreatmentGenerator {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
    max_tokens: u32,
}

impl TreatmentGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, config: &LlmConfig) -> Self {
        Self {
            llm,
            temperature: config.treatment_temperature,
            max_tokens: config.treatment_max_tokens,
        }
    }

    /// Ask the model for treatment advice.
    ///
    /// Any failure (transport, status, missing or invalid JSON) yields the
    /// canned advice for the diagnosis' health status.
    pub async fn generate(&self, diagnostic: &DiagnosticResult) -> TreatmentInfo {
        match self.try_generate(diagnostic).await {
            Ok(info) => {
                debug!(label = %diagnostic.disease_label, "Generated treatment advice");
                info
            }
            Err(e) => {
                warn!(
                    label = %diagnostic.disease_label,
                    error = %e,
                    "Treatment generation failed, using fallback"
                );
                fallback_treatment(diagnostic.is_healthy)
            }
        }
    }

    async fn try_generate(&self, diagnostic: &DiagnosticResult) -> Result<TreatmentInfo, DependencyError> {
        let request = CompletionRequest {
            system: TREATMENT_SYSTEM_PROMPT.to_string(),
            user: treatment_prompt(diagnostic),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: None,
        };
        let answer = self.llm.complete(request).await?;
        parse_treatment(&answer)
    }
}

/// Pull the first `{...}` span out of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Parse a model answer into treatment info, defaulting absent fields.
///
/// Fields that are present but not strings count as absent.
pub fn parse_treatment(answer: &str) -> Result<TreatmentInfo, DependencyError> {
    let json = extract_json_object(answer)
        .ok_or_else(|| DependencyError::InvalidResponse("No JSON found in response".to_string()))?;
    let value: serde_json::Value = serde_json::from_str(json)?;

    let field = |name: &str, default: &str| -> String {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };

    Ok(TreatmentInfo {
        cause: field("cause", DEFAULT_CAUSE),
        treatment: field("treatment", DEFAULT_TREATMENT),
        prevention: field("prevention", DEFAULT_PREVENTION),
    })
}

/// Canned advice used when the model is unavailable or unparsable.
pub fn fallback_treatment(is_healthy: bool) -> TreatmentInfo {
    if is_healthy {
        TreatmentInfo {
            cause: "No disease detected".to_string(),
            treatment: "Your plant appears healthy. Continue regular care and monitoring.".to_string(),
            prevention: "Maintain consistent watering, proper nutrition, and good air circulation.".to_string(),
        }
    } else {
        TreatmentInfo {
            cause: "Plant disease or stress condition".to_string(),
            treatment: "Remove affected parts, improve growing conditions, and consult agricultural expert if symptoms persist.".to_string(),
            prevention: "Ensure proper spacing, avoid overhead watering, practice crop rotation, and maintain plant health.".to_string(),
        }
    }
}

/// The sentence spoken and shown after a detection.
pub fn detection_message(diagnostic: &DiagnosticResult, treatment: &TreatmentInfo) -> String {
    if diagnostic.is_healthy {
        format!(
            "Great news! Your plant appears healthy with {:.1}% confidence. {}",
            diagnostic.confidence, treatment.treatment
        )
    } else {
        format!(
            "Detection complete. I've identified {} with {:.1}% confidence. {}",
            diagnostic.display_name, diagnostic.confidence, treatment.treatment
        )
    }
}

//! Chat orchestrator: grounds a user message in the session's latest
//! diagnosis and current weather, asks the language model, and falls back
//! to canned replies when it cannot.

use std::sync::Arc;

use plantguard_core::config::{ChatConfig, LlmConfig};
use plantguard_core::{SessionContext, WeatherSnapshot};
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::prompt::compose_system_prompt;
use crate::response::fallback_response;

/// Produces chat replies. Never consults the classifier.
pub struct ChatOrchestrator {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    max_message_chars: usize,
}

impl ChatOrchestrator {
    pub fn new(llm: Arc<dyn LanguageModel>, llm_config: &LlmConfig, chat_config: &ChatConfig) -> Self {
        Self {
            llm,
            temperature: llm_config.chat_temperature,
            max_tokens: llm_config.chat_max_tokens,
            top_p: llm_config.chat_top_p,
            max_message_chars: chat_config.max_message_chars,
        }
    }

    /// Trim `message` and check it is worth answering.
    pub fn validate_message<'a>(&self, message: &'a str) -> Result<&'a str, ChatError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if trimmed.chars().count() > self.max_message_chars {
            return Err(ChatError::MessageTooLong(self.max_message_chars));
        }
        Ok(trimmed)
    }

    /// Answer `message`, optionally grounded in a diagnosis and weather.
    pub async fn reply(
        &self,
        message: &str,
        context: Option<&SessionContext>,
        weather: Option<&WeatherSnapshot>,
    ) -> String {
        let request = CompletionRequest {
            system: compose_system_prompt(context, weather),
            user: message.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: Some(self.top_p),
        };

        debug!(
            has_context = context.is_some(),
            has_weather = weather.is_some(),
            "Composing chat reply"
        );

        match self.llm.complete(request).await {
            Ok(answer) if !answer.is_empty() => answer,
            Ok(_) => {
                warn!("Language model returned an empty reply, using fallback");
                fallback_response(message).to_string()
            }
            Err(e) => {
                warn!(error = %e, "Chat completion failed, using fallback");
                fallback_response(message).to_string()
            }
        }
    }
}

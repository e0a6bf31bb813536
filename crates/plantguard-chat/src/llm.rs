//! Language-model client trait and implementations.
//!
//! - `OpenAiChatClient` talks to any OpenAI-compatible chat-completions API
//!   (Groq by default).
//! - `MockLanguageModel` replays scripted answers and records requests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use plantguard_core::config::LlmConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::DependencyError;

/// One system + user exchange with sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
}

/// Stateless chat-completion client. Each call is independent.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Return the model's text answer, trimmed.
    async fn complete(&self, request: CompletionRequest) -> Result<String, DependencyError>;
}

// ---------------------------------------------------------------------------
// OpenAiChatClient
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the OpenAI chat-completions wire format.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, DependencyError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout,
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        body
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DependencyError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model = %self.model, max_tokens = request.max_tokens, "Sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(&request))
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

        let body = response
            .text()
            .await
            .map_err(|e| DependencyError::from_reqwest(e, self.timeout))?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| DependencyError::InvalidResponse("response has no message content".to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockLanguageModel
// ---------------------------------------------------------------------------

/// Scripted language model for tests.
///
/// Answers come off the script in order; once it is exhausted every call
/// fails, unless a repeating reply was configured.
#[derive(Debug, Default)]
pub struct MockLanguageModel {
    script: Mutex<VecDeque<Result<String, String>>>,
    repeat: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLanguageModel {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            repeat: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, DependencyError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(DependencyError::InvalidResponse(message)),
            None => match &self.repeat {
                Some(reply) => Ok(reply.clone()),
                None => Err(DependencyError::InvalidResponse(
                    "no scripted response".to_string(),
                )),
            },
        }
    }
}

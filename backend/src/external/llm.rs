//! Language-model provider clients
//!
//! Two interchangeable chat providers sit behind [`InsightProvider`]. The
//! variant is picked once at startup from whichever credentials are present.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

const TEMPERATURE: f32 = 0.4;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no language-model provider configured")]
    Unconfigured,

    #[error("language-model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language-model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language-model reply had no text")]
    EmptyReply,
}

/// Chat-completions style client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Generate-content style client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// The provider used for AI insights
#[derive(Clone)]
pub enum InsightProvider {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
    Unconfigured,
}

// OpenAI wire types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

// Gemini wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPartOut<'a>>,
}

#[derive(Serialize)]
struct GeminiPartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReplyContent>,
}

#[derive(Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiPartIn>,
}

#[derive(Deserialize)]
struct GeminiPartIn {
    text: Option<String>,
}

fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

fn configured(key: &Option<String>) -> Option<&str> {
    key.as_deref().filter(|k| !k.trim().is_empty())
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url,
            api_key,
            model,
        })
    }

    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyReply)
    }
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url,
            api_key,
            model,
        })
    }

    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = GenerateRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPartOut { text: system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPartOut { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let reply: GenerateResponse = response.json().await?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }
        Ok(text)
    }
}

impl InsightProvider {
    /// Prefer OpenAI, then Gemini, else run without a provider
    pub fn from_config(config: &LlmConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        if let Some(key) = configured(&config.openai_api_key) {
            return Ok(InsightProvider::OpenAi(OpenAiClient::new(
                config.openai_base_url.clone(),
                key.to_string(),
                config.openai_model.clone(),
                timeout,
            )?));
        }

        if let Some(key) = configured(&config.gemini_api_key) {
            return Ok(InsightProvider::Gemini(GeminiClient::new(
                config.gemini_base_url.clone(),
                key.to_string(),
                config.gemini_model.clone(),
                timeout,
            )?));
        }

        Ok(InsightProvider::Unconfigured)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InsightProvider::OpenAi(_) => "openai",
            InsightProvider::Gemini(_) => "gemini",
            InsightProvider::Unconfigured => "none",
        }
    }

    /// Single round trip; no retry
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        match self {
            InsightProvider::OpenAi(client) => client.complete(system, prompt).await,
            InsightProvider::Gemini(client) => client.complete(system, prompt).await,
            InsightProvider::Unconfigured => Err(LlmError::Unconfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(openai: Option<&str>, gemini: Option<&str>) -> LlmConfig {
        LlmConfig {
            openai_api_key: openai.map(String::from),
            openai_base_url: "http://localhost/openai".into(),
            openai_model: "gpt-4o-mini".into(),
            gemini_api_key: gemini.map(String::from),
            gemini_base_url: "http://localhost/gemini".into(),
            gemini_model: "gemini-1.5-flash".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_provider_selection_order() {
        let both = InsightProvider::from_config(&llm_config(Some("sk-1"), Some("g-1"))).unwrap();
        assert_eq!(both.name(), "openai");

        let gemini_only = InsightProvider::from_config(&llm_config(None, Some("g-1"))).unwrap();
        assert_eq!(gemini_only.name(), "gemini");

        let blank_openai = InsightProvider::from_config(&llm_config(Some("  "), Some("g-1"))).unwrap();
        assert_eq!(blank_openai.name(), "gemini");

        let none = InsightProvider::from_config(&llm_config(None, None)).unwrap();
        assert_eq!(none.name(), "none");
    }

    #[tokio::test]
    async fn test_unconfigured_never_calls_out() {
        let result = InsightProvider::Unconfigured.complete("sys", "prompt").await;
        assert!(matches!(result, Err(LlmError::Unconfigured)));
    }
}

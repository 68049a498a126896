use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analysis::Analysis;
use crate::config::AiConfig;
use crate::extract::Prospect;

/// Which chat-completion backend is configured. Chosen once at startup;
/// everything downstream branches on this tag instead of probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Anthropic,
}

impl AiProvider {
    fn name(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "OpenAI",
            AiProvider::Anthropic => "Anthropic",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} response contained no generated text")]
    EmptyReply { provider: &'static str },
}

/// Outcome of an AI generation attempt. "Not configured" is an expected
/// state, not an error; callers branch without any catch.
pub enum AiResult {
    Generated(String),
    NotConfigured,
    Failed(ProviderError),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicBlock>>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROMPT_PREAMBLE: &str = "You write short, friendly outreach messages \
from a maker who designs free SKÅDIS pegboard accessories. The recipient \
left a public comment on a pegboard model page. Reference what they said, \
keep it under 120 words, no pressure tactics, end by pointing them at the \
free collection on the sender's profile. Reply with the message text only.";

pub struct AiClient {
    client: Client,
    provider: Option<AiProvider>,
    api_key: String,
    model: String,
    openai_url: String,
    anthropic_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl AiClient {
    pub fn from_config(config: &AiConfig) -> Self {
        let provider = match config.provider.as_deref() {
            Some("openai") => Some(AiProvider::OpenAi),
            Some("anthropic") => Some(AiProvider::Anthropic),
            _ => None,
        };

        Self {
            client: Client::new(),
            provider,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            openai_url: config.openai_base_url.clone(),
            anthropic_url: config.anthropic_base_url.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Attempt an AI-personalized message. Failures are returned as
    /// values; the caller falls back to deterministic templating.
    pub async fn generate(&self, prompt: &str) -> AiResult {
        let provider = match self.provider {
            Some(p) => p,
            None => return AiResult::NotConfigured,
        };

        match self.send(provider, prompt).await {
            Ok(text) => AiResult::Generated(text),
            Err(e) => AiResult::Failed(e),
        }
    }

    async fn send(&self, provider: AiProvider, prompt: &str) -> Result<String, ProviderError> {
        let name = provider.name();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let builder = match provider {
            AiProvider::OpenAi => self
                .client
                .post(&self.openai_url)
                .bearer_auth(&self.api_key),
            AiProvider::Anthropic => self
                .client
                .post(&self.anthropic_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                provider: name,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: name,
                status: status.as_u16(),
                body,
            });
        }

        let text = match provider {
            AiProvider::OpenAi => {
                let parsed: OpenAiResponse =
                    response.json().await.map_err(|source| ProviderError::Network {
                        provider: name,
                        source,
                    })?;
                parsed
                    .choices
                    .and_then(|mut c| c.drain(..).next())
                    .and_then(|c| c.message)
                    .and_then(|m| m.content)
            }
            AiProvider::Anthropic => {
                let parsed: AnthropicResponse =
                    response.json().await.map_err(|source| ProviderError::Network {
                        provider: name,
                        source,
                    })?;
                parsed
                    .content
                    .and_then(|mut c| c.drain(..).next())
                    .and_then(|b| b.text)
            }
        };

        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ProviderError::EmptyReply { provider: name })?;

        debug!("{} generated {} chars", name, text.len());
        Ok(text)
    }
}

/// Prompt for an AI-personalized message, carrying the comment and the
/// deterministic analysis as context.
pub fn build_prompt(prospect: &Prospect, analysis: &Analysis) -> String {
    format!(
        "{}\n\nCommenter @{} wrote:\n\"{}\"\n\nSignals: technical level {}, \
         problem areas [{}], interests [{}], style {}.",
        PROMPT_PREAMBLE,
        prospect.username,
        prospect.text,
        analysis.technical_level,
        analysis.problem_areas.join(", "),
        analysis.interests.join(", "),
        analysis.engagement_style,
    )
}

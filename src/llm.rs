// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE LLM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Saída estruturada: sugere 4 prompts de continuação a partir do prompt do
// usuário e da resposta do assistente. Uma única chamada de chat completion
// com `response_format = json_object`; a resposta é validada contra um schema
// estrito de 4 campos.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sources::build_http_client;
use crate::utils::{truncate_bytes, MAX_ERROR_BODY_BYTES};

/// Modelo padrão para sugestões
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Base URL padrão (API compatível com OpenAI)
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TEMPERATURE: f32 = 0.0;
const MAX_TOKENS: u32 = 400;

const SYSTEM_PROMPT: &str = "Return 4 suggested follow-up prompts based on the provided user \
prompt and assistant response, as a JSON object.\n\nOUTPUT:\n{\"suggestedprompt1\": \"prompt1\", \
\"suggestedprompt2\": \"prompt2\", \"suggestedprompt3\": \"prompt3\", \"suggestedprompt4\": \"prompt4\"}";

const EXAMPLE_USER: &str = "User Prompt: Find good coffee shops near 90210 \n\nAssistant Response: \
Here are three highly rated coffee shops around Beverly Hills: Acme Cafe (4.5 stars, known for its \
cold brew), Canon Coffee Bar (4.3 stars, quiet seating) and Rodeo Roasters (4.6 stars, roasts on site).";

const EXAMPLE_ASSISTANT: &str = "{\"suggestedprompt1\": \"Which of these coffee shops are open late?\", \
\"suggestedprompt2\": \"Do any of them offer vegan pastries?\", \
\"suggestedprompt3\": \"What do recent reviews say about Acme Cafe?\", \
\"suggestedprompt4\": \"Are there coffee shops with outdoor seating nearby?\"}";

/// Erros do cliente LLM
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Resposta de erro da API
    #[error("API error: {0}")]
    ApiError(String),

    /// HTTP 429
    #[error("Rate limit exceeded")]
    RateLimitError,

    /// Conteúdo fora do schema esperado
    #[error("Invalid response format: {0}")]
    ParseError(String),

    /// Falha de transporte
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::ParseError(err.to_string())
        } else {
            LlmError::NetworkError(err.to_string())
        }
    }
}

/// Quatro prompts de continuação, em sequência
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPrompts {
    /// Primeira sugestão
    #[serde(rename = "suggestedprompt1")]
    pub prompt1: String,
    /// Segunda sugestão
    #[serde(rename = "suggestedprompt2")]
    pub prompt2: String,
    /// Terceira sugestão
    #[serde(rename = "suggestedprompt3")]
    pub prompt3: String,
    /// Quarta sugestão
    #[serde(rename = "suggestedprompt4")]
    pub prompt4: String,
}

impl SuggestedPrompts {
    /// Prompts na ordem 1..4
    pub fn as_array(&self) -> [&str; 4] {
        [
            self.prompt1.as_str(),
            self.prompt2.as_str(),
            self.prompt3.as_str(),
            self.prompt4.as_str(),
        ]
    }

    fn validate(self) -> Result<Self, LlmError> {
        for (i, prompt) in self.as_array().iter().enumerate() {
            if prompt.trim().is_empty() {
                return Err(LlmError::ParseError(format!(
                    "suggestedprompt{} is empty",
                    i + 1
                )));
            }
        }
        Ok(self)
    }
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("regex de code fence válida")
});

/// Valida o conteúdo retornado pelo modelo contra o schema de 4 campos
pub fn parse_suggested_prompts(content: &str) -> Result<SuggestedPrompts, LlmError> {
    let json = CODE_FENCE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    let prompts: SuggestedPrompts = serde_json::from_str(json.trim())
        .map_err(|e| LlmError::ParseError(format!("{}: {}", e, truncate_bytes(content, 200))))?;
    prompts.validate()
}

/// Trait principal para clientes LLM
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sugere 4 prompts de continuação
    async fn suggest_prompts(
        &self,
        user_prompt: &str,
        assistant_response: &str,
    ) -> Result<SuggestedPrompts, LlmError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock: devolve o conteúdo bruto configurado, passando pelo parser
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Conteúdo bruto devolvido como se viesse do modelo
    pub raw_content: Option<String>,
    /// Erro a retornar
    pub mock_error: Option<String>,
}

impl MockLlmClient {
    /// Mock com quatro prompts válidos
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula a resposta crua do modelo
    pub fn with_content(content: &str) -> Self {
        Self {
            raw_content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Mock que sempre falha com `ApiError`
    pub fn failing(message: &str) -> Self {
        Self {
            mock_error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn suggest_prompts(
        &self,
        user_prompt: &str,
        _assistant_response: &str,
    ) -> Result<SuggestedPrompts, LlmError> {
        if let Some(message) = &self.mock_error {
            return Err(LlmError::ApiError(message.clone()));
        }

        match &self.raw_content {
            Some(content) => parse_suggested_prompts(content),
            None => Ok(SuggestedPrompts {
                prompt1: format!("Tell me more about {}", user_prompt),
                prompt2: "Can you give an example?".into(),
                prompt3: "What are the alternatives?".into(),
                prompt4: "Summarize that in one sentence".into(),
            }),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO OPENAI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Conteúdo da mensagem do usuário enviada ao modelo
pub fn user_content(user_prompt: &str, assistant_response: &str) -> String {
    format!(
        "User Prompt: {} \n\nAssistant Response: {}",
        user_prompt, assistant_response
    )
}

/// Cliente para OpenAI Chat Completions (ou API compatível)
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Cria cliente com o modelo e a URL padrão
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: build_http_client(timeout),
        }
    }

    /// Troca o modelo
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.into();
        self
    }

    /// Troca a URL base (APIs compatíveis)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }

    /// Modelo em uso
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, content: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: EXAMPLE_USER,
                },
                ChatMessage {
                    role: "assistant",
                    content: EXAMPLE_ASSISTANT,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn suggest_prompts(
        &self,
        user_prompt: &str,
        assistant_response: &str,
    ) -> Result<SuggestedPrompts, LlmError> {
        let content = user_content(user_prompt, assistant_response);
        log::debug!("💡 Sugerindo prompts com {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(&content))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitError);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!(
                "HTTP {}: {}",
                status,
                truncate_bytes(&body, MAX_ERROR_BODY_BYTES)
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let reply = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseError("No content in completion".into()))?;

        parse_suggested_prompts(&reply)
    }
}

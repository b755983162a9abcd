// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE PESQUISA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Pesquisa avançada com resposta sintetizada + documentos de suporte.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{build_http_client, parse_body, read_body, SourceError};
use crate::types::{ResearchDocument, ResearchResponse};

/// Trait para provedores de pesquisa com síntese de resposta
#[async_trait]
pub trait ResearchClient: Send + Sync {
    /// Pesquisa a query e retorna resposta + documentos
    async fn research(&self, query: &str) -> Result<ResearchResponse, SourceError>;
}

/// Opções da pesquisa
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOptions {
    /// "basic" ou "advanced"
    pub search_depth: String,
    /// Máximo de documentos
    pub max_results: u32,
    /// Pedir resposta sintetizada
    pub include_answer: bool,
    /// Incluir conteúdo bruto dos documentos
    pub include_raw_content: bool,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            search_depth: "advanced".into(),
            max_results: 7,
            include_answer: true,
            include_raw_content: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock para testes unitários
#[derive(Debug, Default)]
pub struct MockResearchClient {
    /// Resposta da pesquisa
    pub mock_response: Option<ResearchResponse>,
    /// Erro a retornar em todas as chamadas
    pub mock_error: Option<SourceError>,
    /// Latência simulada
    pub delay: Option<Duration>,
}

impl MockResearchClient {
    /// Mock com resposta padrão
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock com a resposta dada
    pub fn with_response(response: ResearchResponse) -> Self {
        Self {
            mock_response: Some(response),
            ..Default::default()
        }
    }

    /// Mock que sempre falha com o erro dado
    pub fn failing(error: SourceError) -> Self {
        Self {
            mock_error: Some(error),
            ..Default::default()
        }
    }

    /// Simula latência de rede
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ResearchClient for MockResearchClient {
    async fn research(&self, query: &str) -> Result<ResearchResponse, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.mock_error {
            return Err(err.clone());
        }

        Ok(self.mock_response.clone().unwrap_or_else(|| ResearchResponse {
            query: query.to_string(),
            answer: Some("Mock answer".into()),
            results: vec![ResearchDocument {
                title: "Mock document".into(),
                url: "https://example.com/doc".into(),
                content: "Mock content".into(),
                raw_content: None,
                score: Some(0.9),
            }],
            ..Default::default()
        }))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO TAVILY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    #[serde(flatten)]
    options: &'a ResearchOptions,
}

/// Converte o corpo JSON da Tavily em `ResearchResponse`
pub fn parse_tavily_response(body: &str) -> Result<ResearchResponse, SourceError> {
    parse_body(body)
}

/// Cliente para Tavily Search API
pub struct TavilyClient {
    api_key: String,
    endpoint: String,
    options: ResearchOptions,
    client: reqwest::Client,
}

impl TavilyClient {
    /// Cria cliente com a chave e o timeout HTTP
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            endpoint: "https://api.tavily.com/search".into(),
            options: ResearchOptions::default(),
            client: build_http_client(timeout),
        }
    }

    /// Troca as opções de pesquisa
    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Troca o endpoint (testes, proxies)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ResearchClient for TavilyClient {
    async fn research(&self, query: &str) -> Result<ResearchResponse, SourceError> {
        log::debug!(
            "📚 Tavily research ({}, max {}): {}",
            self.options.search_depth,
            self.options.max_results,
            query
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TavilyRequest {
                api_key: &self.api_key,
                query,
                options: &self.options,
            })
            .send()
            .await?;

        let body = read_body(response).await?;
        parse_tavily_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ResearchOptions::default();
        assert_eq!(options.search_depth, "advanced");
        assert_eq!(options.max_results, 7);
        assert!(options.include_answer);
        assert!(options.include_raw_content);
    }

    #[test]
    fn test_request_serialization_flattens_options() {
        let options = ResearchOptions::default();
        let request = TavilyRequest {
            api_key: "tvly-key",
            query: "what is a chad",
            options: &options,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "what is a chad");
        assert_eq!(value["search_depth"], "advanced");
        assert_eq!(value["max_results"], 7);
        assert_eq!(value["include_raw_content"], true);
    }

    #[test]
    fn test_parse_tavily_response() {
        let body = r#"{
            "query": "what is a chad",
            "answer": "A slang term for a confident man.",
            "images": [],
            "results": [
                {"title": "Chad (slang)", "url": "https://en.wikipedia.org/wiki/Chad_(slang)",
                 "content": "Chad is a pejorative...", "score": 0.98, "raw_content": null}
            ],
            "response_time": 1.42
        }"#;

        let response = parse_tavily_response(body).unwrap();
        assert_eq!(response.answer.as_deref(), Some("A slang term for a confident man."));
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].score, Some(0.98));
        assert!(response.results[0].raw_content.is_none());
        assert_eq!(response.response_time, Some(1.42));
        assert!(response.extra.contains_key("images"));
    }

    #[tokio::test]
    async fn test_mock_research_echoes_query() {
        let client = MockResearchClient::new();
        let response = client.research("rust async").await.unwrap();
        assert_eq!(response.query, "rust async");
        assert!(response.answer.is_some());
    }
}

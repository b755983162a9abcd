// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE BUSCA WEB
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para busca web.
// Retorna uma sequência de resultados (URL, título, descrição).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{build_http_client, parse_body, read_body, SourceError};
use crate::types::WebSearchHit;

/// Trait principal para clientes de busca web
#[async_trait]
pub trait WebSearchClient: Send + Sync {
    /// Executa uma busca e retorna os resultados em ordem de relevância
    async fn search(&self, query: &str) -> Result<Vec<WebSearchHit>, SourceError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock para testes unitários
#[derive(Debug, Default)]
pub struct MockWebSearchClient {
    /// Resultados da busca
    pub mock_results: Option<Vec<WebSearchHit>>,
    /// Erro a retornar em todas as chamadas
    pub mock_error: Option<SourceError>,
    /// Latência simulada
    pub delay: Option<Duration>,
}

impl MockWebSearchClient {
    /// Mock com resposta padrão
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock com os resultados dados
    pub fn with_results(results: Vec<WebSearchHit>) -> Self {
        Self {
            mock_results: Some(results),
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
impl WebSearchClient for MockWebSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<WebSearchHit>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.mock_error {
            return Err(err.clone());
        }

        Ok(self.mock_results.clone().unwrap_or_else(|| {
            vec![WebSearchHit {
                url: "https://example.com/mock".into(),
                title: format!("Mock result for {}", query),
                description: "Mock snippet".into(),
            }]
        }))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO JINA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Deserialize)]
struct JinaSearchResponse {
    #[serde(default)]
    data: Vec<JinaSearchItem>,
}

#[derive(Deserialize)]
struct JinaSearchItem {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Converte o corpo JSON da busca Jina em resultados
pub fn parse_jina_search(body: &str) -> Result<Vec<WebSearchHit>, SourceError> {
    let response: JinaSearchResponse = parse_body(body)?;
    Ok(response
        .data
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .map(|item| WebSearchHit {
            url: item.url,
            title: item.title,
            description: item.description,
        })
        .collect())
}

/// Cliente para Jina Search API
pub struct JinaSearchClient {
    api_key: String,
    search_endpoint: String,
    client: reqwest::Client,
}

impl JinaSearchClient {
    /// Cria cliente com a chave e o timeout HTTP
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            search_endpoint: "https://s.jina.ai/".into(),
            client: build_http_client(timeout),
        }
    }

    /// Troca o endpoint (proxies, ambientes de teste)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    fn search_url(&self, query: &str) -> Result<url::Url, SourceError> {
        url::Url::parse_with_params(&self.search_endpoint, &[("q", query)])
            .map_err(|e| SourceError::InvalidInput(format!("Invalid search endpoint: {}", e)))
    }
}

#[async_trait]
impl WebSearchClient for JinaSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<WebSearchHit>, SourceError> {
        let url = self.search_url(query)?;
        log::debug!("🔍 Jina search: {}", query);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("X-Respond-With", "no-content")
            .send()
            .await?;

        let body = read_body(response).await?;
        parse_jina_search(&body)
    }
}

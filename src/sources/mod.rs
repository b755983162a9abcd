// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FONTES EXTERNAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Traits e clientes HTTP para cada fonte consultada pelo agregador:
// - Busca web (Jina)
// - Pesquisa com resposta sintetizada (Tavily)
// - Places / geocoding / validação de endereço (Google Maps)
// - Diretório de negócios com avaliações (Yelp)
//
// Cada cliente real mantém um único `reqwest::Client` reutilizável e é
// construído explicitamente e injetado (sem singletons globais).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::utils::{truncate_bytes, MAX_ERROR_BODY_BYTES};

/// Cliente de pesquisa com resposta sintetizada
pub mod research;
/// Cliente de diretório de negócios com avaliações
pub mod reviews;
/// Cliente de places, geocoding e validação de endereço
pub mod places;
/// Cliente de busca web
pub mod web_search;

pub use places::{GoogleMapsClient, MockPlacesClient, PlacesClient};
pub use research::{MockResearchClient, ResearchClient, ResearchOptions, TavilyClient};
pub use reviews::{MockReviewClient, ReviewClient, YelpClient};
pub use web_search::{JinaSearchClient, MockWebSearchClient, WebSearchClient};

/// Chave da busca web no resultado agregado
pub const INTERNET_SEARCH: &str = "internet_search";
/// Chave da pesquisa sintetizada no resultado agregado
pub const INTERNET_RESEARCH: &str = "internet_research";
/// Chave da busca de lugares no resultado agregado
pub const PLACES_SEARCH: &str = "places_search";
/// Chave da busca de avaliações no resultado agregado
pub const REVIEW_SEARCH: &str = "review_search";

/// Conjunto fixo de fontes da suíte de busca
pub const ALL_SOURCES: [&str; 4] = [INTERNET_SEARCH, INTERNET_RESEARCH, PLACES_SEARCH, REVIEW_SEARCH];

/// User-Agent enviado a todos os vendors
pub const USER_AGENT: &str = concat!("search-aggregator/", env!("CARGO_PKG_VERSION"));

/// Erros de uma fonte individual.
///
/// Capturados na fronteira de cada consulta e registrados sob a chave da
/// fonte no resultado agregado; nunca abortam as fontes irmãs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// Resposta não-2xx do vendor
    #[error("Source API error: {0}")]
    ApiError(String),

    /// HTTP 401/403
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// HTTP 429
    #[error("Rate limit exceeded")]
    RateLimitError,

    /// Falha de transporte
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Corpo que não decodifica
    #[error("Invalid response format: {0}")]
    ParseError(String),

    /// Parâmetros inválidos para a fonte
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout por consulta
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// Prazo total da agregação
    #[error("Aggregation deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Panic dentro da operação
    #[error("Source task panicked: {0}")]
    Panicked(String),

    /// Task cancelada antes de terminar
    #[error("Source task cancelled: {0}")]
    Cancelled(String),
}

impl SourceError {
    /// Identificador estável do tipo de falha (usado nos marcadores JSON)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "api",
            Self::AuthError(_) => "auth",
            Self::RateLimitError => "rate_limit",
            Self::NetworkError(_) => "network",
            Self::ParseError(_) => "parse",
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout(_) => "timeout",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::Panicked(_) => "panicked",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::ParseError(err.to_string())
        } else {
            SourceError::NetworkError(err.to_string())
        }
    }
}

/// Cria o cliente HTTP compartilhado por um cliente de fonte
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// Mapeia um status HTTP de erro para `SourceError` (None se sucesso)
pub fn status_error(status: StatusCode, body: &str) -> Option<SourceError> {
    if status.is_success() {
        return None;
    }

    let body = truncate_bytes(body.trim(), MAX_ERROR_BODY_BYTES);
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::AuthError(format!("HTTP {}: {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimitError,
        _ => SourceError::ApiError(format!("HTTP {}: {}", status, body)),
    })
}

/// Desserializa um corpo JSON de vendor
pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::ParseError(e.to_string()))
}

/// Lê o corpo da resposta, validando o status HTTP
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, SourceError> {
    let status = response.status();
    let body = response.text().await?;

    match status_error(status, &body) {
        Some(err) => Err(err),
        None => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(status_error(StatusCode::OK, "").is_none());
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "bad key"),
            Some(SourceError::AuthError(msg)) if msg.contains("bad key")
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            Some(SourceError::AuthError(_))
        ));
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            Some(SourceError::RateLimitError)
        );
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream"),
            Some(SourceError::ApiError(msg)) if msg.starts_with("HTTP 502")
        ));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(5000);
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            Some(SourceError::ApiError(msg)) => assert!(msg.len() < 400),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_body_error() {
        let result: Result<serde_json::Value, _> = parse_body("not json");
        assert_eq!(result.unwrap_err().kind(), "parse");
    }

    #[test]
    fn test_all_sources_unique() {
        let mut keys = ALL_SOURCES.to_vec();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }
}

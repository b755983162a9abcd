// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE AVALIAÇÕES (BUSINESS DIRECTORY)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Busca de negócios por termo + localização, detalhes por ID e registros
// achatados (busca + detalhes) prontos para tabela.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{build_http_client, parse_body, read_body, SourceError};
use crate::types::{Business, BusinessDetails, BusinessRecord};

/// Máximo de consultas de detalhes simultâneas em `business_records`
pub const DETAILS_CONCURRENCY: usize = 4;

/// Trait para provedores de diretório de negócios
#[async_trait]
pub trait ReviewClient: Send + Sync {
    /// Busca negócios por termo e localização (CEP, cidade...)
    async fn search_businesses(
        &self,
        term: &str,
        location: &str,
    ) -> Result<Vec<Business>, SourceError>;

    /// Detalhes completos de um negócio
    async fn business_details(&self, business_id: &str) -> Result<BusinessDetails, SourceError>;

    /// Busca + detalhes de cada negócio, achatados em registros.
    ///
    /// Falha na busca propaga; falha nos detalhes de um negócio apenas deixa
    /// os campos de detalhe vazios naquele registro.
    async fn business_records(
        &self,
        term: &str,
        location: &str,
    ) -> Result<Vec<BusinessRecord>, SourceError> {
        let businesses = self.search_businesses(term, location).await?;

        let mut details: Vec<Option<BusinessDetails>> = Vec::with_capacity(businesses.len());
        for chunk in businesses.chunks(DETAILS_CONCURRENCY) {
            let batch = join_all(chunk.iter().map(|b| self.business_details(&b.id))).await;
            for (business, result) in chunk.iter().zip(batch) {
                match result {
                    Ok(found) => details.push(Some(found)),
                    Err(e) => {
                        log::warn!("⚠️ Detalhes indisponíveis para {}: {}", business.id, e);
                        details.push(None);
                    }
                }
            }
        }

        Ok(businesses
            .iter()
            .zip(details.iter())
            .map(|(business, details)| BusinessRecord::flatten(business, details.as_ref()))
            .collect())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock para testes unitários
#[derive(Debug, Default)]
pub struct MockReviewClient {
    /// Negócios da busca
    pub mock_businesses: Vec<Business>,
    /// Detalhes por ID; IDs ausentes retornam erro
    pub mock_details: HashMap<String, BusinessDetails>,
    /// Erro a retornar em todas as chamadas
    pub mock_error: Option<SourceError>,
    /// Latência simulada
    pub delay: Option<Duration>,
}

impl MockReviewClient {
    /// Mock com resposta padrão
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock com os negócios dados
    pub fn with_businesses(businesses: Vec<Business>) -> Self {
        Self {
            mock_businesses: businesses,
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

    /// Adiciona detalhes para o negócio
    pub fn with_details(mut self, details: BusinessDetails) -> Self {
        self.mock_details.insert(details.id.clone(), details);
        self
    }

    /// Simula latência de rede
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ReviewClient for MockReviewClient {
    async fn search_businesses(
        &self,
        _term: &str,
        _location: &str,
    ) -> Result<Vec<Business>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.mock_error {
            return Err(err.clone());
        }
        Ok(self.mock_businesses.clone())
    }

    async fn business_details(&self, business_id: &str) -> Result<BusinessDetails, SourceError> {
        self.mock_details
            .get(business_id)
            .cloned()
            .ok_or_else(|| SourceError::ApiError(format!("HTTP 404: {} not found", business_id)))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO YELP FUSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Deserialize)]
struct SearchResponse {
    businesses: Vec<Business>,
}

/// Converte o corpo da busca Yelp na lista de negócios
pub fn parse_business_search(body: &str) -> Result<Vec<Business>, SourceError> {
    let response: SearchResponse = parse_body(body)?;
    Ok(response.businesses)
}

/// Cliente para Yelp Fusion API
pub struct YelpClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl YelpClient {
    /// Cria cliente com a chave e o timeout HTTP
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: "https://api.yelp.com/v3".into(),
            client: build_http_client(timeout),
        }
    }

    /// Troca a URL base (testes, proxies)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }

    fn details_url(&self, business_id: &str) -> String {
        format!(
            "{}/businesses/{}",
            self.base_url,
            urlencoding::encode(business_id)
        )
    }

    async fn get_body(&self, request: reqwest::RequestBuilder) -> Result<String, SourceError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;
        read_body(response).await
    }
}

#[async_trait]
impl ReviewClient for YelpClient {
    async fn search_businesses(
        &self,
        term: &str,
        location: &str,
    ) -> Result<Vec<Business>, SourceError> {
        log::debug!("⭐ Yelp search: {} @ {}", term, location);
        let request = self
            .client
            .get(format!("{}/businesses/search", self.base_url))
            .query(&[("term", term), ("location", location)]);
        let body = self.get_body(request).await?;
        parse_business_search(&body)
    }

    async fn business_details(&self, business_id: &str) -> Result<BusinessDetails, SourceError> {
        let request = self.client.get(self.details_url(business_id));
        let body = self.get_body(request).await?;
        parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn business(id: &str, name: &str) -> Business {
        Business {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_business_search() {
        let body = r#"{
            "businesses": [{
                "id": "WavvLdfdP6g8aZTtbBQHTw",
                "alias": "acme-cafe-beverly-hills",
                "name": "Acme Cafe",
                "rating": 4.5,
                "review_count": 1200,
                "categories": [{"alias": "coffee", "title": "Coffee & Tea"}],
                "coordinates": {"latitude": 34.07, "longitude": -118.40},
                "transactions": ["pickup"]
            }],
            "total": 1,
            "region": {"center": {"latitude": 34.07, "longitude": -118.40}}
        }"#;

        let businesses = parse_business_search(body).unwrap();
        assert_eq!(businesses.len(), 1);
        assert_eq!(businesses[0].rating, Some(4.5));
        assert_eq!(businesses[0].categories[0].title, "Coffee & Tea");
    }

    #[test]
    fn test_parse_business_search_requires_businesses() {
        let err = parse_business_search(r#"{"error": {"code": "VALIDATION_ERROR"}}"#).unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_details_url_encodes_id() {
        let client = YelpClient::new("key".into(), Duration::from_secs(5))
            .with_base_url("https://api.yelp.com/v3/");
        assert_eq!(
            client.details_url("café-ñ"),
            "https://api.yelp.com/v3/businesses/caf%C3%A9-%C3%B1"
        );
    }

    #[tokio::test]
    async fn test_business_records_tolerates_missing_details() {
        let details: BusinessDetails = serde_json::from_value(json!({
            "id": "a",
            "is_claimed": true,
            "photos": ["p1.jpg"],
            "transactions": ["delivery"]
        }))
        .unwrap();

        let client = MockReviewClient::with_businesses(vec![business("a", "A"), business("b", "B")])
            .with_details(details);

        let records = client.business_records("coffee", "90210").await.unwrap();
        assert_eq!(records.len(), 2);
        // Ordem da busca é preservada
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].is_claimed, Some(true));
        assert_eq!(records[0].photos, "p1.jpg");
        assert_eq!(records[1].id, "b");
        assert!(records[1].is_claimed.is_none());
    }

    #[tokio::test]
    async fn test_business_records_propagates_search_failure() {
        let client = MockReviewClient::failing(SourceError::AuthError("invalid token".into()));
        let err = client.business_records("coffee", "90210").await.unwrap_err();
        assert_eq!(err.kind(), "auth");
    }
}

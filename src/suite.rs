// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SUÍTE DE BUSCA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Liga os quatro clientes injetados ao agregador sob as chaves fixas:
// internet_search, internet_research, places_search, review_search.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::{AggregateError, AggregateResult, Aggregator, AggregatorConfig, SourceQuery};
use crate::config::Secrets;
use crate::sources::{
    GoogleMapsClient, JinaSearchClient, PlacesClient, ResearchClient, ReviewClient, SourceError,
    TavilyClient, WebSearchClient, YelpClient, INTERNET_RESEARCH, INTERNET_SEARCH, PLACES_SEARCH,
    REVIEW_SEARCH,
};
use crate::types::{QueryParams, SourcePayload};
use crate::utils::clean_text;

/// Suíte com os quatro clientes de fonte e o agregador
#[derive(Clone)]
pub struct SearchSuite {
    web: Arc<dyn WebSearchClient>,
    research: Arc<dyn ResearchClient>,
    places: Arc<dyn PlacesClient>,
    reviews: Arc<dyn ReviewClient>,
    aggregator: Aggregator,
}

impl SearchSuite {
    /// Cria a suíte com clientes já construídos
    pub fn new(
        web: Arc<dyn WebSearchClient>,
        research: Arc<dyn ResearchClient>,
        places: Arc<dyn PlacesClient>,
        reviews: Arc<dyn ReviewClient>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            web,
            research,
            places,
            reviews,
            aggregator: Aggregator::new(config),
        }
    }

    /// Cria a suíte com os clientes HTTP reais
    pub fn with_real_clients(
        secrets: &Secrets,
        http_timeout: Duration,
        config: AggregatorConfig,
    ) -> Self {
        Self::new(
            Arc::new(JinaSearchClient::new(secrets.jina_api_key.clone(), http_timeout)),
            Arc::new(TavilyClient::new(secrets.tavily_api_key.clone(), http_timeout)),
            Arc::new(GoogleMapsClient::new(
                secrets.google_maps_api_key.clone(),
                http_timeout,
            )),
            Arc::new(YelpClient::new(secrets.yelp_api_key.clone(), http_timeout)),
            config,
        )
    }

    /// Cliente de busca web
    pub fn web(&self) -> &Arc<dyn WebSearchClient> {
        &self.web
    }

    /// Cliente de pesquisa
    pub fn research(&self) -> &Arc<dyn ResearchClient> {
        &self.research
    }

    /// Cliente de places
    pub fn places(&self) -> &Arc<dyn PlacesClient> {
        &self.places
    }

    /// Cliente de avaliações
    pub fn reviews(&self) -> &Arc<dyn ReviewClient> {
        &self.reviews
    }

    /// Agregador em uso
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Monta as quatro consultas a partir dos parâmetros compartilhados
    pub fn build_queries(&self, params: &QueryParams) -> Vec<SourceQuery<SourcePayload>> {
        let query = clean_text(&params.query);
        let location = params.location().map(str::to_string);

        let web = self.web.clone();
        let search_query = query.clone();
        let research = self.research.clone();
        let research_query = query.clone();
        let places = self.places.clone();
        let places_query = query.clone();
        let reviews = self.reviews.clone();

        vec![
            SourceQuery::future(INTERNET_SEARCH, async move {
                web.search(&search_query).await.map(SourcePayload::WebSearch)
            }),
            SourceQuery::future(INTERNET_RESEARCH, async move {
                research
                    .research(&research_query)
                    .await
                    .map(SourcePayload::Research)
            }),
            SourceQuery::future(PLACES_SEARCH, async move {
                places
                    .places_search(&places_query)
                    .await
                    .map(SourcePayload::Places)
            }),
            SourceQuery::future(REVIEW_SEARCH, async move {
                let location = location.ok_or_else(|| {
                    SourceError::InvalidInput("review search requires a location".into())
                })?;
                reviews
                    .search_businesses(&query, &location)
                    .await
                    .map(SourcePayload::Reviews)
            }),
        ]
    }

    /// Consulta as quatro fontes concorrentemente
    pub async fn execute_all(
        &self,
        params: &QueryParams,
    ) -> Result<AggregateResult<SourcePayload>, AggregateError> {
        log::info!(
            "🔎 Buscando '{}' (location: {})",
            params.query,
            params.location().unwrap_or("-")
        );
        self.aggregator.run(self.build_queries(params)).await
    }

    /// Consulta as fontes e renderiza o resultado como texto para o assistente
    pub async fn execute_all_as_text(&self, params: &QueryParams) -> Result<String, AggregateError> {
        let result = self.execute_all(params).await?;
        Ok(format!("All Search Results: {}", result.to_json()))
    }
}

impl std::fmt::Debug for SearchSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSuite")
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockPlacesClient, MockResearchClient, MockReviewClient, MockWebSearchClient};
    use crate::types::{Business, WebSearchHit};

    fn mock_suite(reviews: MockReviewClient) -> SearchSuite {
        SearchSuite::new(
            Arc::new(MockWebSearchClient::with_results(vec![
                WebSearchHit {
                    url: "url1".into(),
                    ..Default::default()
                },
                WebSearchHit {
                    url: "url2".into(),
                    ..Default::default()
                },
            ])),
            Arc::new(MockResearchClient::new()),
            Arc::new(MockPlacesClient::new()),
            Arc::new(reviews),
            AggregatorConfig::default(),
        )
    }

    fn acme() -> Business {
        Business {
            id: "acme".into(),
            name: "Acme Cafe".into(),
            rating: Some(4.5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_execute_all_has_fixed_keys() {
        let suite = mock_suite(MockReviewClient::with_businesses(vec![acme()]));
        let params = QueryParams::new("coffee shops").with_location("90210");

        let result = suite.execute_all(&params).await.unwrap();

        assert_eq!(
            result.sources(),
            vec![INTERNET_RESEARCH, INTERNET_SEARCH, PLACES_SEARCH, REVIEW_SEARCH]
        );
        assert!(result.all_succeeded());
        match result.payload(INTERNET_SEARCH) {
            Some(SourcePayload::WebSearch(hits)) => {
                let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
                assert_eq!(urls, vec!["url1", "url2"]);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
        match result.payload(REVIEW_SEARCH) {
            Some(SourcePayload::Reviews(businesses)) => {
                assert_eq!(businesses[0].name, "Acme Cafe");
                assert_eq!(businesses[0].rating, Some(4.5));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_review_without_location_fails_alone() {
        let suite = mock_suite(MockReviewClient::with_businesses(vec![acme()]));
        let result = suite.execute_all(&QueryParams::new("coffee")).await.unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(
            result.error(REVIEW_SEARCH).map(|e| e.kind()),
            Some("invalid_input")
        );
    }

    #[tokio::test]
    async fn test_execute_all_as_text() {
        let suite = mock_suite(MockReviewClient::failing(SourceError::RateLimitError));
        let params = QueryParams::new("coffee").with_location("90210");

        let text = suite.execute_all_as_text(&params).await.unwrap();

        assert!(text.starts_with("All Search Results: {"));
        assert!(text.contains("\"rate_limit\""));
        assert!(text.contains("url1"));
    }
}

//! # Testes de Integração
//!
//! Validam o fluxo completo da suíte de busca:
//! - Query → quatro fontes → mapa agregado com chaves fixas
//! - Falha de uma fonte não afeta as outras
//! - Fontes lentas rodam em paralelo (tempo ≈ max, não soma)
//! - Roteador de ferramentas sobre a mesma suíte

use async_trait::async_trait;
use mockall::mock;
use search_aggregator::aggregator::{Aggregator, AggregatorConfig, SourceQuery};
use search_aggregator::llm::MockLlmClient;
use search_aggregator::sources::{
    MockPlacesClient, MockResearchClient, MockReviewClient, MockWebSearchClient, ResearchClient,
    SourceError, INTERNET_RESEARCH, INTERNET_SEARCH, PLACES_SEARCH, REVIEW_SEARCH,
};
use search_aggregator::tools::{ToolError, ToolRouter};
use search_aggregator::types::{
    Business, QueryParams, ResearchResponse, SourcePayload, WebSearchHit,
};
use search_aggregator::SearchSuite;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

mock! {
    pub Research {}

    #[async_trait]
    impl ResearchClient for Research {
        async fn research(&self, query: &str) -> Result<ResearchResponse, SourceError>;
    }
}

fn hits(urls: &[&str]) -> Vec<WebSearchHit> {
    urls.iter()
        .map(|url| WebSearchHit {
            url: url.to_string(),
            ..Default::default()
        })
        .collect()
}

fn acme_cafe() -> Business {
    Business {
        id: "acme-cafe".into(),
        name: "Acme Cafe".into(),
        rating: Some(4.5),
        ..Default::default()
    }
}

// ============================================================================
// TESTE 1: Exemplo canônico com o agregador genérico
// ============================================================================

#[tokio::test]
async fn test_search_and_review_example() {
    let params = QueryParams::new("coffee shops").with_location("90210");
    let location = params.location().map(str::to_string);

    let aggregator = Aggregator::new(AggregatorConfig::default());
    let result = aggregator
        .run(vec![
            SourceQuery::blocking("search", || Ok(json!(["url1", "url2"]))),
            SourceQuery::future("review", async move {
                match location.as_deref() {
                    Some("90210") => Ok(json!([{ "name": "Acme Cafe", "rating": 4.5 }])),
                    _ => Err(SourceError::InvalidInput("location".into())),
                }
            }),
        ])
        .await
        .unwrap();

    assert_eq!(
        result.to_json(),
        json!({
            "search": ["url1", "url2"],
            "review": [{ "name": "Acme Cafe", "rating": 4.5 }]
        })
    );
}

// ============================================================================
// TESTE 2: Suíte com mockall
// ============================================================================

#[tokio::test]
async fn test_suite_passes_query_to_every_source() {
    let mut research = MockResearch::new();
    research
        .expect_research()
        .withf(|query| query == "coffee shops")
        .times(1)
        .returning(|query| {
            Ok(ResearchResponse {
                query: query.to_string(),
                answer: Some("Acme Cafe is the top rated option.".into()),
                ..Default::default()
            })
        });

    let suite = SearchSuite::new(
        Arc::new(MockWebSearchClient::with_results(hits(&["url1", "url2"]))),
        Arc::new(research),
        Arc::new(MockPlacesClient::new()),
        Arc::new(MockReviewClient::with_businesses(vec![acme_cafe()])),
        AggregatorConfig::default(),
    );

    let params = QueryParams::new("coffee shops").with_location("90210");
    let result = suite.execute_all(&params).await.unwrap();

    assert_eq!(result.len(), 4);
    assert!(result.all_succeeded());
    match result.payload(INTERNET_RESEARCH) {
        Some(SourcePayload::Research(research)) => {
            assert_eq!(research.query, "coffee shops");
            assert!(research.answer.as_deref().unwrap_or_default().contains("Acme"));
        }
        other => panic!("unexpected research payload: {:?}", other),
    }
    assert_eq!(
        result.payload(REVIEW_SEARCH).map(SourcePayload::item_count),
        Some(1)
    );
}

#[tokio::test]
async fn test_one_failing_source_is_isolated() {
    let mut research = MockResearch::new();
    research
        .expect_research()
        .returning(|_| Err(SourceError::AuthError("HTTP 401: invalid api key".into())));

    let suite = SearchSuite::new(
        Arc::new(MockWebSearchClient::with_results(hits(&["url1"]))),
        Arc::new(research),
        Arc::new(MockPlacesClient::new()),
        Arc::new(MockReviewClient::with_businesses(vec![acme_cafe()])),
        AggregatorConfig::default(),
    );

    let params = QueryParams::new("coffee shops").with_location("90210");
    let result = suite.execute_all(&params).await.unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.error(INTERNET_RESEARCH).map(|e| e.kind()), Some("auth"));
    assert!(result.payload(INTERNET_SEARCH).is_some());
    assert!(result.payload(PLACES_SEARCH).is_some());
    assert!(result.payload(REVIEW_SEARCH).is_some());

    let json = result.to_json();
    assert_eq!(json[INTERNET_RESEARCH]["kind"], "auth");
    assert_eq!(json[INTERNET_SEARCH]["kind"], "web_search");
}

// ============================================================================
// TESTE 3: Paralelismo real
// ============================================================================

#[tokio::test]
async fn test_slow_sources_run_concurrently() {
    let latency = Duration::from_millis(200);
    let suite = SearchSuite::new(
        Arc::new(MockWebSearchClient::new().with_delay(latency)),
        Arc::new(MockResearchClient::new().with_delay(latency)),
        Arc::new(MockPlacesClient::new().with_delay(latency)),
        Arc::new(MockReviewClient::with_businesses(vec![acme_cafe()]).with_delay(latency)),
        AggregatorConfig::default(),
    );

    let start = Instant::now();
    let result = suite
        .execute_all(&QueryParams::new("coffee").with_location("90210"))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(result.all_succeeded());
    // Serial seria ~800ms
    assert!(elapsed < latency * 3, "took {:?}", elapsed);
}

#[tokio::test]
async fn test_deadline_marks_only_stuck_source() {
    let config = AggregatorConfig {
        query_timeout: None,
        deadline: Some(Duration::from_millis(150)),
        ..Default::default()
    };
    let suite = SearchSuite::new(
        Arc::new(MockWebSearchClient::new()),
        Arc::new(MockResearchClient::new().with_delay(Duration::from_secs(10))),
        Arc::new(MockPlacesClient::new()),
        Arc::new(MockReviewClient::with_businesses(vec![acme_cafe()])),
        config,
    );

    let result = suite
        .execute_all(&QueryParams::new("coffee").with_location("90210"))
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(
        result.error(INTERNET_RESEARCH).map(|e| e.kind()),
        Some("deadline_exceeded")
    );
}

// ============================================================================
// TESTE 4: Roteador de ferramentas
// ============================================================================

#[tokio::test]
async fn test_tool_router_over_suite() {
    let suite = SearchSuite::new(
        Arc::new(MockWebSearchClient::with_results(hits(&["url1", "url2"]))),
        Arc::new(MockResearchClient::new()),
        Arc::new(MockPlacesClient::new()),
        Arc::new(MockReviewClient::with_businesses(vec![acme_cafe()])),
        AggregatorConfig::default(),
    );
    let router = ToolRouter::new(suite, Arc::new(MockLlmClient::new()));

    let output = router
        .dispatch("internet_search", &json!({ "query": "coffee" }))
        .await
        .unwrap();
    assert_eq!(output[1]["url"], "url2");

    let output = router
        .dispatch(
            "yelp_query_search",
            &json!({ "query": "coffee", "zipcode": "90210" }),
        )
        .await
        .unwrap();
    assert_eq!(output[0]["name"], "Acme Cafe");

    let err = router
        .dispatch("google_geocode", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::MissingArgument { .. }));
}

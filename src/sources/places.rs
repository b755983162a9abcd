// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CLIENTE DE PLACES / GEOCODING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Busca de negócios por texto, geocoding de endereços e validação de
// endereços (USPS CASS). Região fixa: US.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{build_http_client, parse_body, read_body, SourceError};
use crate::types::{AddressValidation, GeocodeResult, PlacesResponse};

/// Região usada em todas as consultas
pub const REGION: &str = "us";

/// Trait para provedores de places/geocoding
#[async_trait]
pub trait PlacesClient: Send + Sync {
    /// Busca negócios por texto livre
    async fn places_search(&self, query: &str) -> Result<PlacesResponse, SourceError>;

    /// Geocodifica um endereço (linhas unidas por vírgula)
    async fn geocode(&self, address_lines: &[String]) -> Result<Vec<GeocodeResult>, SourceError>;

    /// Valida e normaliza um endereço
    async fn validate_address(
        &self,
        address_lines: &[String],
    ) -> Result<AddressValidation, SourceError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cliente mock para testes unitários
#[derive(Debug, Default)]
pub struct MockPlacesClient {
    /// Resposta da busca de places
    pub mock_places: Option<PlacesResponse>,
    /// Resultados de geocode
    pub mock_geocode: Vec<GeocodeResult>,
    /// Resultado da validação de endereço
    pub mock_validation: Option<AddressValidation>,
    /// Erro a retornar em todas as chamadas
    pub mock_error: Option<SourceError>,
    /// Latência simulada
    pub delay: Option<Duration>,
}

impl MockPlacesClient {
    /// Mock com resposta padrão
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock com a resposta de places dada
    pub fn with_places(places: PlacesResponse) -> Self {
        Self {
            mock_places: Some(places),
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

    async fn simulate(&self) -> Result<(), SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.mock_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlacesClient for MockPlacesClient {
    async fn places_search(&self, _query: &str) -> Result<PlacesResponse, SourceError> {
        self.simulate().await?;
        Ok(self.mock_places.clone().unwrap_or_else(|| PlacesResponse {
            status: "ZERO_RESULTS".into(),
            ..Default::default()
        }))
    }

    async fn geocode(&self, _address_lines: &[String]) -> Result<Vec<GeocodeResult>, SourceError> {
        self.simulate().await?;
        Ok(self.mock_geocode.clone())
    }

    async fn validate_address(
        &self,
        _address_lines: &[String],
    ) -> Result<AddressValidation, SourceError> {
        self.simulate().await?;
        Ok(self.mock_validation.clone().unwrap_or_default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO GOOGLE MAPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Envelope comum das APIs legadas (status no corpo, HTTP 200)
#[derive(Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct ValidationResponse {
    result: AddressValidation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationRequest<'a> {
    address: ValidationAddress<'a>,
    enable_usps_cass: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationAddress<'a> {
    region_code: &'a str,
    address_lines: &'a [String],
}

/// Converte o status textual das APIs legadas em erro
fn check_status(body: &str) -> Result<(), SourceError> {
    let envelope: StatusEnvelope = parse_body(body)?;
    let detail = envelope.error_message.unwrap_or_default();

    match envelope.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "REQUEST_DENIED" => Err(SourceError::AuthError(detail)),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(SourceError::RateLimitError),
        "INVALID_REQUEST" => Err(SourceError::InvalidInput(detail)),
        other => Err(SourceError::ApiError(format!("{} {}", other, detail).trim().to_string())),
    }
}

/// Converte o corpo da busca de places em `PlacesResponse`
pub fn parse_places_response(body: &str) -> Result<PlacesResponse, SourceError> {
    check_status(body)?;
    parse_body(body)
}

/// Converte o corpo do geocoding em resultados
pub fn parse_geocode_response(body: &str) -> Result<Vec<GeocodeResult>, SourceError> {
    check_status(body)?;
    let response: GeocodeResponse = parse_body(body)?;
    Ok(response.results)
}

/// Converte o corpo da validação de endereço
pub fn parse_validation_response(body: &str) -> Result<AddressValidation, SourceError> {
    let response: ValidationResponse = parse_body(body)?;
    Ok(response.result)
}

/// Cliente para Google Maps Platform
pub struct GoogleMapsClient {
    api_key: String,
    maps_base_url: String,
    validation_url: String,
    client: reqwest::Client,
}

impl GoogleMapsClient {
    /// Cria cliente com a chave e o timeout HTTP
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            api_key,
            maps_base_url: "https://maps.googleapis.com/maps/api".into(),
            validation_url: "https://addressvalidation.googleapis.com/v1:validateAddress".into(),
            client: build_http_client(timeout),
        }
    }

    fn maps_url(&self, path: &str, params: &[(&str, &str)]) -> Result<url::Url, SourceError> {
        let mut url = url::Url::parse(&format!("{}/{}", self.maps_base_url, path))
            .map_err(|e| SourceError::InvalidInput(format!("Invalid maps URL: {}", e)))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_body(&self, url: url::Url) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        read_body(response).await
    }
}

#[async_trait]
impl PlacesClient for GoogleMapsClient {
    async fn places_search(&self, query: &str) -> Result<PlacesResponse, SourceError> {
        log::debug!("📍 Places search: {}", query);
        let url = self.maps_url(
            "place/textsearch/json",
            &[("query", query), ("region", REGION)],
        )?;
        let body = self.get_body(url).await?;
        parse_places_response(&body)
    }

    async fn geocode(&self, address_lines: &[String]) -> Result<Vec<GeocodeResult>, SourceError> {
        if address_lines.is_empty() {
            return Err(SourceError::InvalidInput("address_lines is empty".into()));
        }

        let address = address_lines.join(", ");
        log::debug!("🗺️  Geocode: {}", address);
        let url = self.maps_url("geocode/json", &[("address", address.as_str()), ("region", REGION)])?;
        let body = self.get_body(url).await?;
        parse_geocode_response(&body)
    }

    async fn validate_address(
        &self,
        address_lines: &[String],
    ) -> Result<AddressValidation, SourceError> {
        if address_lines.is_empty() {
            return Err(SourceError::InvalidInput("address_lines is empty".into()));
        }

        log::debug!("🏷️  Address validation: {} lines", address_lines.len());
        let mut url = url::Url::parse(&self.validation_url)
            .map_err(|e| SourceError::InvalidInput(format!("Invalid validation URL: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self
            .client
            .post(url)
            .json(&ValidationRequest {
                address: ValidationAddress {
                    region_code: "US",
                    address_lines,
                },
                enable_usps_cass: true,
            })
            .send()
            .await?;

        let body = read_body(response).await?;
        parse_validation_response(&body)
    }
}

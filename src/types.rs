// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Parâmetros de consulta e payloads tipados de cada fonte externa.
// Campos desconhecidos dos vendors são preservados em `extra`.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tipo de URL (alias para String)
pub type Url = String;

/// Campos extras retornados pelo vendor e não modelados
pub type ExtraFields = Map<String, Value>;

/// Parâmetros compartilhados por todas as fontes de uma agregação
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Texto livre da consulta
    pub query: String,
    /// Código de localização (ex: CEP/zip code "90210")
    pub location: Option<String>,
}

impl QueryParams {
    /// Cria parâmetros apenas com a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: None,
        }
    }

    /// Define o código de localização
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Localização não vazia, se houver
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BUSCA WEB
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resultado individual de busca web
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchHit {
    /// URL do resultado
    pub url: Url,
    /// Título da página
    #[serde(default)]
    pub title: String,
    /// Descrição/snippet
    #[serde(default)]
    pub description: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PESQUISA (ANSWER + DOCUMENTOS)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resposta sintetizada com documentos de suporte
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    /// Query ecoada pelo provedor
    #[serde(default)]
    pub query: String,
    /// Resposta sintetizada (quando solicitada)
    #[serde(default)]
    pub answer: Option<String>,
    /// Documentos de suporte
    #[serde(default)]
    pub results: Vec<ResearchDocument>,
    /// Tempo de resposta informado pelo provedor (segundos)
    #[serde(default)]
    pub response_time: Option<f64>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Documento de suporte de uma pesquisa
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchDocument {
    /// Título do documento
    #[serde(default)]
    pub title: String,
    /// URL do documento
    pub url: Url,
    /// Trecho relevante
    #[serde(default)]
    pub content: String,
    /// Conteúdo bruto completo
    #[serde(default)]
    pub raw_content: Option<String>,
    /// Score de relevância
    #[serde(default)]
    pub score: Option<f64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PLACES / GEOCODING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Coordenadas geográficas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Geometria de um lugar (apenas a localização é modelada)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Ponto central
    pub location: LatLng,
    /// Campos não modelados (viewport etc.)
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Registro de negócio com localização
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Identificador do lugar
    #[serde(default)]
    pub place_id: String,
    /// Nome do negócio
    #[serde(default)]
    pub name: String,
    /// Endereço formatado
    #[serde(default)]
    pub formatted_address: Option<String>,
    /// Geometria
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Avaliação média
    #[serde(default)]
    pub rating: Option<f64>,
    /// Quantidade de avaliações
    #[serde(default)]
    pub user_ratings_total: Option<u64>,
    /// Status de operação (OPERATIONAL, CLOSED_TEMPORARILY...)
    #[serde(default)]
    pub business_status: Option<String>,
    /// Tipos/categorias
    #[serde(default)]
    pub types: Vec<String>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Resposta de busca de lugares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesResponse {
    /// Lugares encontrados
    #[serde(default)]
    pub results: Vec<Place>,
    /// Status do provedor ("OK", "ZERO_RESULTS"...)
    #[serde(default)]
    pub status: String,
    /// Token para próxima página
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Resultado de geocoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Endereço formatado
    #[serde(default)]
    pub formatted_address: String,
    /// Geometria com lat/lng
    pub geometry: Geometry,
    /// Identificador do lugar
    #[serde(default)]
    pub place_id: String,
    /// Tipos do endereço
    #[serde(default)]
    pub types: Vec<String>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Resultado de validação de endereço (opaco, apenas o veredito é tipado)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressValidation {
    /// Veredito do validador
    #[serde(default)]
    pub verdict: Option<Value>,
    /// Endereço normalizado
    #[serde(default)]
    pub address: Option<Value>,
    /// Dados USPS (CASS)
    #[serde(default, rename = "uspsData")]
    pub usps_data: Option<Value>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AVALIAÇÕES (BUSINESS DIRECTORY)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Categoria de um negócio
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Alias (slug)
    pub alias: String,
    /// Título legível
    pub title: String,
}

/// Coordenadas no formato do diretório de avaliações
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
}

/// Endereço no formato do diretório de avaliações
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessLocation {
    /// Linha 1 do endereço
    pub address1: Option<String>,
    /// Linha 2 do endereço
    pub address2: Option<String>,
    /// Linha 3 do endereço
    pub address3: Option<String>,
    /// Cidade
    pub city: Option<String>,
    /// CEP / ZIP
    pub zip_code: Option<String>,
    /// País
    pub country: Option<String>,
    /// Estado
    pub state: Option<String>,
    /// Endereço formatado em linhas
    #[serde(default)]
    pub display_address: Vec<String>,
    /// Ruas transversais
    #[serde(default)]
    pub cross_streets: Option<String>,
}

/// Negócio retornado pela busca de avaliações
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Business {
    /// Identificador do negócio
    pub id: String,
    /// Slug do negócio
    #[serde(default)]
    pub alias: Option<String>,
    /// Nome
    #[serde(default)]
    pub name: String,
    /// Foto principal
    #[serde(default)]
    pub image_url: Option<String>,
    /// Fechado permanentemente
    #[serde(default)]
    pub is_closed: Option<bool>,
    /// Página do negócio
    #[serde(default)]
    pub url: Option<String>,
    /// Quantidade de avaliações
    #[serde(default)]
    pub review_count: Option<u64>,
    /// Nota média (0-5)
    #[serde(default)]
    pub rating: Option<f64>,
    /// Latitude/longitude
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Telefone (E.164)
    #[serde(default)]
    pub phone: Option<String>,
    /// Telefone formatado
    #[serde(default)]
    pub display_phone: Option<String>,
    /// Distância em metros até o centro da busca
    #[serde(default)]
    pub distance: Option<f64>,
    /// Endereço
    #[serde(default)]
    pub location: Option<BusinessLocation>,
    /// Categorias
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Intervalo de funcionamento
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSlot {
    /// Dia da semana (0 = segunda)
    pub day: u8,
    /// Abertura (HHMM)
    pub start: String,
    /// Fechamento (HHMM)
    pub end: String,
    /// Passa da meia-noite
    #[serde(default)]
    pub is_overnight: bool,
}

/// Horários de funcionamento
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessHours {
    /// Intervalos de funcionamento
    #[serde(default)]
    pub open: Vec<OpenSlot>,
    /// Aberto agora
    #[serde(default)]
    pub is_open_now: Option<bool>,
    /// Tipo (ex.: REGULAR)
    #[serde(default)]
    pub hours_type: Option<String>,
}

/// Detalhes completos de um negócio
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessDetails {
    /// Identificador do negócio
    pub id: String,
    /// Página reivindicada pelo dono
    #[serde(default)]
    pub is_claimed: Option<bool>,
    /// Endereço completo
    #[serde(default)]
    pub location: Option<BusinessLocation>,
    /// URLs das fotos
    #[serde(default)]
    pub photos: Vec<String>,
    /// Horários
    #[serde(default)]
    pub hours: Vec<BusinessHours>,
    /// Transações suportadas (pickup, delivery)
    #[serde(default)]
    pub transactions: Vec<String>,
    /// Campos não modelados
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Registro achatado (busca + detalhes) de um negócio, pronto para tabela
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Identificador do negócio
    pub id: String,
    /// Slug do negócio
    pub alias: Option<String>,
    /// Nome
    pub name: String,
    /// Foto principal
    pub image_url: Option<String>,
    /// Fechado permanentemente
    pub is_closed: Option<bool>,
    /// Página do negócio
    pub url: Option<String>,
    /// Quantidade de avaliações
    pub review_count: Option<u64>,
    /// Nota média (0-5)
    pub rating: Option<f64>,
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
    /// Telefone (E.164)
    pub phone: Option<String>,
    /// Telefone formatado
    pub display_phone: Option<String>,
    /// Distância em metros
    pub distance: Option<f64>,
    /// Linha 1 do endereço
    pub address1: Option<String>,
    /// Linha 2 do endereço
    pub address2: Option<String>,
    /// Linha 3 do endereço
    pub address3: Option<String>,
    /// Cidade
    pub city: Option<String>,
    /// CEP / ZIP
    pub zip_code: Option<String>,
    /// País
    pub country: Option<String>,
    /// Estado
    pub state: Option<String>,
    /// Endereço formatado, separado por ", "
    pub display_address: Option<String>,
    /// Página reivindicada pelo dono
    pub is_claimed: Option<bool>,
    /// Ruas transversais
    pub cross_streets: Option<String>,
    /// URLs das fotos, separadas por ", "
    pub photos: String,
    /// Intervalos do primeiro horário
    pub hours: Vec<OpenSlot>,
    /// Aberto agora
    pub is_open_now: Option<bool>,
    /// Transações, separadas por ", "
    pub transactions: String,
    /// Aliases das categorias
    pub categories_alias: String,
    /// Títulos das categorias
    pub categories_title: String,
}

impl BusinessRecord {
    /// Achata o resultado de busca e (se disponível) os detalhes do negócio
    pub fn flatten(business: &Business, details: Option<&BusinessDetails>) -> Self {
        let location = business.location.as_ref();
        let coordinates = business.coordinates.as_ref();
        let first_hours = details.and_then(|d| d.hours.first());

        Self {
            id: business.id.clone(),
            alias: business.alias.clone(),
            name: business.name.clone(),
            image_url: business.image_url.clone(),
            is_closed: business.is_closed,
            url: business.url.clone(),
            review_count: business.review_count,
            rating: business.rating,
            latitude: coordinates.and_then(|c| c.latitude),
            longitude: coordinates.and_then(|c| c.longitude),
            phone: business.phone.clone(),
            display_phone: business.display_phone.clone(),
            distance: business.distance,
            address1: location.and_then(|l| l.address1.clone()),
            address2: location.and_then(|l| l.address2.clone()),
            address3: location.and_then(|l| l.address3.clone()),
            city: location.and_then(|l| l.city.clone()),
            zip_code: location.and_then(|l| l.zip_code.clone()),
            country: location.and_then(|l| l.country.clone()),
            state: location.and_then(|l| l.state.clone()),
            display_address: location.map(|l| l.display_address.join(", ")),
            is_claimed: details.and_then(|d| d.is_claimed),
            cross_streets: details
                .and_then(|d| d.location.as_ref())
                .and_then(|l| l.cross_streets.clone()),
            photos: details.map(|d| d.photos.join(", ")).unwrap_or_default(),
            hours: first_hours.map(|h| h.open.clone()).unwrap_or_default(),
            is_open_now: first_hours.and_then(|h| h.is_open_now),
            transactions: details
                .map(|d| d.transactions.join(", "))
                .unwrap_or_default(),
            categories_alias: join_field(&business.categories, |c| &c.alias),
            categories_title: join_field(&business.categories, |c| &c.title),
        }
    }
}

fn join_field<T>(items: &[T], field: impl Fn(&T) -> &String) -> String {
    items
        .iter()
        .map(|item| field(item).as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PAYLOAD UNIFICADO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Payload tipado de cada fonte agregada.
///
/// Não existe um schema universal: cada variante carrega o formato da sua fonte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SourcePayload {
    /// Sequência de resultados de busca web
    WebSearch(Vec<WebSearchHit>),
    /// Resposta sintetizada + documentos
    Research(ResearchResponse),
    /// Registros de negócios com localização
    Places(PlacesResponse),
    /// Negócios com avaliações e categorias
    Reviews(Vec<Business>),
}

impl SourcePayload {
    /// Nome do tipo de payload
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WebSearch(_) => "web_search",
            Self::Research(_) => "research",
            Self::Places(_) => "places",
            Self::Reviews(_) => "reviews",
        }
    }

    /// Quantidade de itens retornados pela fonte
    pub fn item_count(&self) -> usize {
        match self {
            Self::WebSearch(hits) => hits.len(),
            Self::Research(research) => research.results.len(),
            Self::Places(places) => places.results.len(),
            Self::Reviews(businesses) => businesses.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_location_trimmed() {
        assert_eq!(QueryParams::new("cafe").location(), None);
        assert_eq!(QueryParams::new("cafe").with_location("  ").location(), None);
        assert_eq!(
            QueryParams::new("cafe").with_location(" 90210 ").location(),
            Some("90210")
        );
    }

    #[test]
    fn test_business_keeps_unknown_fields() {
        let business: Business = serde_json::from_value(json!({
            "id": "abc",
            "name": "Acme Cafe",
            "rating": 4.5,
            "price": "$$"
        }))
        .unwrap();

        assert_eq!(business.name, "Acme Cafe");
        assert_eq!(business.extra.get("price"), Some(&json!("$$")));
    }

    #[test]
    fn test_flatten_without_details() {
        let business: Business = serde_json::from_value(json!({
            "id": "acme-cafe",
            "alias": "acme-cafe-beverly-hills",
            "name": "Acme Cafe",
            "coordinates": {"latitude": 34.07, "longitude": -118.40},
            "location": {
                "address1": "1 Main St",
                "city": "Beverly Hills",
                "zip_code": "90210",
                "display_address": ["1 Main St", "Beverly Hills, CA 90210"]
            },
            "categories": [
                {"alias": "coffee", "title": "Coffee & Tea"},
                {"alias": "bakeries", "title": "Bakeries"}
            ]
        }))
        .unwrap();

        let record = BusinessRecord::flatten(&business, None);
        assert_eq!(record.latitude, Some(34.07));
        assert_eq!(
            record.display_address.as_deref(),
            Some("1 Main St, Beverly Hills, CA 90210")
        );
        assert_eq!(record.categories_alias, "coffee, bakeries");
        assert_eq!(record.categories_title, "Coffee & Tea, Bakeries");
        assert!(record.is_claimed.is_none());
        assert!(record.photos.is_empty());
        assert!(record.hours.is_empty());
    }

    #[test]
    fn test_flatten_with_details() {
        let business = Business {
            id: "acme".into(),
            name: "Acme".into(),
            ..Default::default()
        };
        let details: BusinessDetails = serde_json::from_value(json!({
            "id": "acme",
            "is_claimed": true,
            "location": {"cross_streets": "Elm & Oak"},
            "photos": ["a.jpg", "b.jpg"],
            "hours": [{
                "open": [{"day": 0, "start": "0700", "end": "1500", "is_overnight": false}],
                "is_open_now": true
            }],
            "transactions": ["pickup", "delivery"]
        }))
        .unwrap();

        let record = BusinessRecord::flatten(&business, Some(&details));
        assert_eq!(record.is_claimed, Some(true));
        assert_eq!(record.cross_streets.as_deref(), Some("Elm & Oak"));
        assert_eq!(record.photos, "a.jpg, b.jpg");
        assert_eq!(record.hours.len(), 1);
        assert_eq!(record.is_open_now, Some(true));
        assert_eq!(record.transactions, "pickup, delivery");
        assert!(record.display_address.is_none());
    }

    #[test]
    fn test_payload_tagged_serialization() {
        let payload = SourcePayload::WebSearch(vec![WebSearchHit {
            url: "https://example.com".into(),
            ..Default::default()
        }]);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "web_search");
        assert_eq!(value["data"][0]["url"], "https://example.com");
        assert_eq!(payload.item_count(), 1);
    }
}

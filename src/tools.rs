// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FERRAMENTAS DO ASSISTENTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Schemas de function-calling expostos ao assistente e o roteador que
// despacha uma chamada (nome + argumentos JSON) para o cliente certo.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::aggregator::AggregateError;
use crate::llm::{LlmClient, LlmError};
use crate::sources::SourceError;
use crate::suite::SearchSuite;
use crate::types::QueryParams;

/// Erros do roteamento de ferramentas
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Nome de ferramenta desconhecido
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Argumento obrigatório ausente
    #[error("Missing argument '{argument}' for tool {tool}")]
    MissingArgument {
        /// Ferramenta chamada
        tool: String,
        /// Argumento que faltou
        argument: String,
    },

    /// Argumento com tipo ou valor inválido
    #[error("Invalid argument '{argument}' for tool {tool}: {reason}")]
    InvalidArgument {
        /// Ferramenta chamada
        tool: String,
        /// Argumento rejeitado
        argument: String,
        /// Motivo da rejeição
        reason: String,
    },

    /// Falha da fonte consultada
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Falha do LLM
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Falha da agregação
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Saída que não serializa
    #[error("Failed to serialize tool output: {0}")]
    Serialization(String),
}

/// Schema de uma ferramenta (nome, descrição, parâmetros em JSON Schema)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    /// Nome da função
    pub name: &'static str,
    /// Descrição para o modelo
    pub description: &'static str,
    /// JSON Schema dos parâmetros
    pub parameters: Value,
}

impl ToolSchema {
    /// Argumentos obrigatórios
    pub fn required(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Formato `{"type": "function", "function": {...}}` das APIs de chat
    pub fn to_function_tool(&self) -> Value {
        json!({ "type": "function", "function": self })
    }
}

fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn lines_param(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn schema(
    name: &'static str,
    description: &'static str,
    properties: Vec<(&str, Value)>,
) -> ToolSchema {
    let required: Vec<&str> = properties.iter().map(|(k, _)| *k).collect();
    let properties: serde_json::Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    ToolSchema {
        name,
        description,
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

static TOOL_SCHEMAS: Lazy<Vec<ToolSchema>> = Lazy::new(|| {
    vec![
        schema(
            "suggest_prompts",
            "Suggests four follow-up prompts based on the provided user prompt and assistant response.",
            vec![
                ("user_prompt", string_param("The initial prompt provided by the user.")),
                ("assistant_response", string_param("The response provided by the assistant.")),
            ],
        ),
        schema(
            "internet_search",
            "Searches the web for the query and returns the matching result URLs with titles.",
            vec![("query", string_param("The search query."))],
        ),
        schema(
            "internet_research",
            "Runs an in-depth web research for the query and returns a synthesized answer with supporting documents.",
            vec![("query", string_param("The research query."))],
        ),
        schema(
            "google_places_search",
            "Looks up businesses on Google Places, returning location, rating and status details.",
            vec![("query", string_param("The search query describing the business."))],
        ),
        schema(
            "google_address_validation",
            "Validates and standardizes a US address with Google Address Validation.",
            vec![("address_lines", lines_param("The address lines to be validated."))],
        ),
        schema(
            "google_geocode",
            "Geocodes an address with Google Geocoding, returning latitude and longitude.",
            vec![("address_lines", lines_param("The address lines to be geocoded."))],
        ),
        schema(
            "yelp_query_search",
            "Finds businesses on Yelp by search term and zipcode.",
            vec![
                ("query", string_param("The search query describing the type of business.")),
                ("zipcode", string_param("The zipcode of the business location.")),
            ],
        ),
        schema(
            "yelp_business_search",
            "Fetches the full Yelp profile of a business by its Yelp ID.",
            vec![("business_id", string_param("The Yelp ID of the business."))],
        ),
        schema(
            "yelp_search",
            "Searches Yelp and fetches details for each business, returning one flat record per business.",
            vec![
                ("query", string_param("The search query describing the type of business.")),
                ("zipcode", string_param("The zipcode of the business location.")),
            ],
        ),
        schema(
            "execute_all_searches",
            "Runs internet_search, internet_research, google_places_search and the Yelp search concurrently and returns all results.",
            vec![
                ("query", string_param("The search query.")),
                ("zipcode", string_param("The zipcode for the Yelp search.")),
            ],
        ),
    ]
});

/// Schemas de todas as ferramentas expostas ao assistente
pub fn tool_schemas() -> &'static [ToolSchema] {
    &TOOL_SCHEMAS
}

/// Busca o schema de uma ferramenta pelo nome
pub fn find_schema(name: &str) -> Option<&'static ToolSchema> {
    TOOL_SCHEMAS.iter().find(|s| s.name == name)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ROTEADOR
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Argumentos de uma chamada já validados contra o schema
struct ToolArgs<'a> {
    tool: &'a str,
    args: &'a Value,
}

impl ToolArgs<'_> {
    fn string(&self, argument: &str) -> Result<String, ToolError> {
        match self.args.get(argument) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.invalid(argument, format!("expected string, got {}", other))),
            None => Err(self.missing(argument)),
        }
    }

    fn lines(&self, argument: &str) -> Result<Vec<String>, ToolError> {
        match self.args.get(argument) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(argument, "expected array of strings".into()))
                })
                .collect(),
            // Uma única linha também é aceita
            Some(Value::String(line)) => Ok(vec![line.clone()]),
            Some(other) => Err(self.invalid(argument, format!("expected array, got {}", other))),
            None => Err(self.missing(argument)),
        }
    }

    fn missing(&self, argument: &str) -> ToolError {
        ToolError::MissingArgument {
            tool: self.tool.to_string(),
            argument: argument.to_string(),
        }
    }

    fn invalid(&self, argument: &str, reason: String) -> ToolError {
        ToolError::InvalidArgument {
            tool: self.tool.to_string(),
            argument: argument.to_string(),
            reason,
        }
    }
}

fn to_value<T: Serialize>(output: T) -> Result<Value, ToolError> {
    serde_json::to_value(output).map_err(|e| ToolError::Serialization(e.to_string()))
}

/// Despacha chamadas de ferramenta para a suíte de busca e o cliente LLM
#[derive(Clone)]
pub struct ToolRouter {
    suite: SearchSuite,
    llm: Arc<dyn LlmClient>,
}

impl ToolRouter {
    /// Cria o roteador sobre a suíte e o cliente LLM
    pub fn new(suite: SearchSuite, llm: Arc<dyn LlmClient>) -> Self {
        Self { suite, llm }
    }

    /// Executa a ferramenta `name` com os argumentos JSON `args`
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let schema = find_schema(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = ToolArgs { tool: name, args };
        for required in schema.required() {
            if args.args.get(required).map_or(true, Value::is_null) {
                return Err(args.missing(required));
            }
        }

        log::info!("🛠️  Ferramenta {}", name);

        match name {
            "suggest_prompts" => {
                let prompts = self
                    .llm
                    .suggest_prompts(
                        &args.string("user_prompt")?,
                        &args.string("assistant_response")?,
                    )
                    .await?;
                to_value(prompts)
            }
            "internet_search" => to_value(self.suite.web().search(&args.string("query")?).await?),
            "internet_research" => {
                to_value(self.suite.research().research(&args.string("query")?).await?)
            }
            "google_places_search" => to_value(
                self.suite
                    .places()
                    .places_search(&args.string("query")?)
                    .await?,
            ),
            "google_address_validation" => to_value(
                self.suite
                    .places()
                    .validate_address(&args.lines("address_lines")?)
                    .await?,
            ),
            "google_geocode" => to_value(
                self.suite
                    .places()
                    .geocode(&args.lines("address_lines")?)
                    .await?,
            ),
            "yelp_query_search" => to_value(
                self.suite
                    .reviews()
                    .search_businesses(&args.string("query")?, &args.string("zipcode")?)
                    .await?,
            ),
            "yelp_business_search" => to_value(
                self.suite
                    .reviews()
                    .business_details(&args.string("business_id")?)
                    .await?,
            ),
            "yelp_search" => to_value(
                self.suite
                    .reviews()
                    .business_records(&args.string("query")?, &args.string("zipcode")?)
                    .await?,
            ),
            "execute_all_searches" => {
                let params =
                    QueryParams::new(args.string("query")?).with_location(args.string("zipcode")?);
                Ok(self.suite.execute_all(&params).await?.to_json())
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatorConfig;
    use crate::llm::MockLlmClient;
    use crate::sources::{
        MockPlacesClient, MockResearchClient, MockReviewClient, MockWebSearchClient,
    };
    use crate::types::Business;

    fn router() -> ToolRouter {
        let suite = SearchSuite::new(
            Arc::new(MockWebSearchClient::new()),
            Arc::new(MockResearchClient::new()),
            Arc::new(MockPlacesClient::new()),
            Arc::new(MockReviewClient::with_businesses(vec![Business {
                id: "acme".into(),
                name: "Acme Cafe".into(),
                ..Default::default()
            }])),
            AggregatorConfig::default(),
        );
        ToolRouter::new(suite, Arc::new(MockLlmClient::new()))
    }

    #[test]
    fn test_all_tools_have_schemas() {
        let names: Vec<&str> = tool_schemas().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 10);
        for name in [
            "suggest_prompts",
            "internet_search",
            "internet_research",
            "google_places_search",
            "google_address_validation",
            "google_geocode",
            "yelp_query_search",
            "yelp_business_search",
            "yelp_search",
            "execute_all_searches",
        ] {
            assert!(names.contains(&name), "missing schema {}", name);
        }
    }

    #[test]
    fn test_schema_shape() {
        let schema = find_schema("google_geocode").unwrap();
        assert_eq!(schema.required(), vec!["address_lines"]);
        assert_eq!(
            schema.parameters["properties"]["address_lines"]["type"],
            "array"
        );

        let tool = find_schema("yelp_search").unwrap().to_function_tool();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "yelp_search");
        assert_eq!(
            tool["function"]["parameters"]["required"],
            json!(["query", "zipcode"])
        );
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let err = router().dispatch("fly_to_moon", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "fly_to_moon"));
    }

    #[tokio::test]
    async fn test_dispatch_missing_argument() {
        let err = router()
            .dispatch("yelp_query_search", &json!({ "query": "coffee" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::MissingArgument { argument, .. } if argument == "zipcode"
        ));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_argument() {
        let err = router()
            .dispatch("internet_search", &json!({ "query": 42 }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_suggest_prompts() {
        let output = router()
            .dispatch(
                "suggest_prompts",
                &json!({ "user_prompt": "rust", "assistant_response": "a language" }),
            )
            .await
            .unwrap();
        let object = output.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(object.contains_key("suggestedprompt1"));
        assert!(object.contains_key("suggestedprompt4"));
    }

    #[tokio::test]
    async fn test_dispatch_yelp_search_returns_records() {
        let output = router()
            .dispatch("yelp_search", &json!({ "query": "coffee", "zipcode": "90210" }))
            .await
            .unwrap();
        assert_eq!(output[0]["name"], "Acme Cafe");
        assert_eq!(output[0]["photos"], "");
    }

    #[tokio::test]
    async fn test_dispatch_execute_all_searches() {
        let output = router()
            .dispatch(
                "execute_all_searches",
                &json!({ "query": "coffee", "zipcode": "90210" }),
            )
            .await
            .unwrap();
        let object = output.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(output["review_search"]["kind"], "reviews");
    }

    #[tokio::test]
    async fn test_dispatch_source_failure_is_error() {
        let suite = SearchSuite::new(
            Arc::new(MockWebSearchClient::failing(SourceError::RateLimitError)),
            Arc::new(MockResearchClient::new()),
            Arc::new(MockPlacesClient::new()),
            Arc::new(MockReviewClient::new()),
            AggregatorConfig::default(),
        );
        let router = ToolRouter::new(suite, Arc::new(MockLlmClient::new()));
        let err = router
            .dispatch("internet_search", &json!({ "query": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Source(SourceError::RateLimitError)));
    }
}

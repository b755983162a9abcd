//! # Search Aggregator
//!
//! Consulta várias fontes externas ao mesmo tempo (busca web, pesquisa com
//! resposta sintetizada, places e avaliações de negócios) e junta tudo em um
//! único mapa fonte → payload | falha, pronto para um assistente conversacional.
//!
//! ## Arquitetura
//!
//! ### 1. Agregador (`aggregator`)
//! Fan-out/fan-in com isolamento de falhas:
//! - Consultas bloqueantes vão para o pool de blocking threads
//! - Consultas async viram tasks independentes
//! - Semáforo limita a concorrência; timeout por consulta e prazo total
//! - Falha ou panic de uma fonte vira um marcador de erro só naquela chave
//!
//! ### 2. Fontes (`sources`)
//! Um trait por fonte, com cliente HTTP real (reqwest) e mock para testes.
//!
//! ### 3. Suíte (`suite`)
//! Liga as quatro fontes ao agregador sob chaves fixas.
//!
//! ### 4. Saída estruturada (`llm`) e ferramentas (`tools`)
//! Sugestão de 4 prompts de continuação e roteamento de function calls.
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use search_aggregator::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let suite = SearchSuite::with_real_clients(
//!         &Secrets::from_env()?,
//!         load_http_timeout()?,
//!         load_aggregator_config()?,
//!     );
//!     let params = QueryParams::new("coffee shops").with_location("90210");
//!     println!("{}", suite.execute_all_as_text(&params).await?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Parâmetros de consulta e payloads tipados de cada fonte.
///
/// - [`QueryParams`]: query + localização opcional
/// - [`SourcePayload`]: payload unificado (um variante por fonte)
/// - [`BusinessRecord`]: negócio achatado (busca + detalhes)
pub mod types;

/// Agregador concorrente de consultas.
///
/// O coração do crate:
/// - `SourceQuery`: fonte nomeada + operação (bloqueante ou async)
/// - `Aggregator`: executa tudo concorrentemente e espera todas
/// - `AggregateResult`: mapa fonte → payload | falha
pub mod aggregator;

/// Clientes das fontes externas (Jina, Tavily, Google Maps, Yelp).
pub mod sources;

/// Suíte de busca com as quatro fontes fixas.
pub mod suite;

/// Cliente LLM para sugestão de prompts de continuação.
///
/// Define a trait `LlmClient` e implementações para:
/// - OpenAI Chat Completions (ou API compatível)
/// - Mock para testes
pub mod llm;

/// Schemas de function-calling e roteador de ferramentas do assistente.
pub mod tools;

/// Utilitários diversos (timing, texto).
pub mod utils;

/// Configuração do runtime, agregador, HTTP e segredos.
///
/// **Runtime Tokio:**
/// - `TOKIO_THREADS`: Número de threads do runtime (padrão: dinâmico)
/// - `TOKIO_MAX_THREADS`: Máximo de threads (padrão: 16)
/// - `TOKIO_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
///
/// **Agregador:**
/// - `AGGREGATOR_MAX_CONCURRENCY`: Consultas simultâneas (padrão: 8)
/// - `AGGREGATOR_QUERY_TIMEOUT_SECS`: Timeout por consulta (padrão: 30)
/// - `AGGREGATOR_DEADLINE_SECS`: Prazo total (padrão: sem prazo)
/// - `HTTP_TIMEOUT_SECS`: Timeout dos clientes HTTP (padrão: 60)
///
/// **LLM:**
/// - `LLM_MODEL`: Modelo (padrão: "gpt-4o")
/// - `LLM_API_BASE_URL`: URL base (padrão: "https://api.openai.com/v1")
///
/// **Segredos:** `OPENAI_API_KEY`, `TAVILY_API_KEY`, `GOOGLE_MAPS_API_KEY`,
/// `YELP_API_KEY`, `JINA_API_KEY`
pub mod config;

// Re-exports principais
pub use aggregator::{
    AggregateError, AggregateResult, Aggregator, AggregatorConfig, SourceOutcome, SourceQuery,
};
pub use config::{
    create_tokio_runtime, install_panic_hook, load_aggregator_config, load_http_timeout,
    load_runtime_config, ConfigError, LlmConfig, RuntimeConfig, Secrets,
};
pub use sources::SourceError;
pub use suite::SearchSuite;
pub use types::*;

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// ```rust,ignore
/// use search_aggregator::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aggregator::{
        AggregateError, AggregateResult, Aggregator, AggregatorConfig, SourceQuery,
    };
    pub use crate::config::{load_aggregator_config, load_http_timeout, LlmConfig, Secrets};
    pub use crate::llm::{LlmClient, OpenAiClient, SuggestedPrompts};
    pub use crate::sources::{
        PlacesClient, ResearchClient, ReviewClient, SourceError, WebSearchClient,
    };
    pub use crate::suite::SearchSuite;
    pub use crate::tools::{tool_schemas, ToolRouter};
    pub use crate::types::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Runtime Tokio, agregador, clientes HTTP e segredos dos vendors.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;
use std::time::Duration;

use crate::aggregator::AggregatorConfig;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::utils::panic_message;

/// Timeout padrão dos clientes HTTP
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Erros de configuração
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variável obrigatória ausente
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    /// Valor que não pôde ser interpretado
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Nome da variável
        name: String,
        /// Valor recebido
        value: String,
    },
}

/// Lê uma variável do ambiente do processo (vazia conta como ausente)
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn parse_positive<F>(lookup: &F, name: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEGREDOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Chaves de API dos vendors
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    /// Chave da OpenAI (sugestão de prompts)
    pub openai_api_key: String,
    /// Chave do Tavily (pesquisa)
    pub tavily_api_key: String,
    /// Chave do Google Maps (places, geocode, validação)
    pub google_maps_api_key: String,
    /// Chave do Yelp (avaliações)
    pub yelp_api_key: String,
    /// Chave do Jina (busca web)
    pub jina_api_key: String,
}

impl Secrets {
    /// Carrega todas as chaves do ambiente
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Carrega as chaves a partir de uma função de busca
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            openai_api_key: require(&lookup, "OPENAI_API_KEY")?,
            tavily_api_key: require(&lookup, "TAVILY_API_KEY")?,
            google_maps_api_key: require(&lookup, "GOOGLE_MAPS_API_KEY")?,
            yelp_api_key: require(&lookup, "YELP_API_KEY")?,
            jina_api_key: require(&lookup, "JINA_API_KEY")?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"***")
            .field("tavily_api_key", &"***")
            .field("google_maps_api_key", &"***")
            .field("yelp_api_key", &"***")
            .field("jina_api_key", &"***")
            .finish()
    }
}

/// Configuração do cliente LLM
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Chave da API
    pub api_key: String,
    /// `LLM_MODEL` (padrão: gpt-4o)
    pub model: String,
    /// `LLM_API_BASE_URL` (padrão: https://api.openai.com/v1)
    pub base_url: String,
}

impl LlmConfig {
    /// Carrega do ambiente
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Carrega a partir de uma função de busca
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: require(&lookup, "OPENAI_API_KEY")?,
            model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("LLM_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AGREGADOR E HTTP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Carrega a configuração do agregador a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `AGGREGATOR_MAX_CONCURRENCY`: consultas simultâneas (padrão: 8)
/// - `AGGREGATOR_QUERY_TIMEOUT_SECS`: timeout por consulta (padrão: 30)
/// - `AGGREGATOR_DEADLINE_SECS`: prazo total (padrão: sem prazo)
pub fn load_aggregator_config() -> Result<AggregatorConfig, ConfigError> {
    aggregator_config_from(env_lookup)
}

/// Versão de `load_aggregator_config` com função de busca injetável
pub fn aggregator_config_from<F>(lookup: F) -> Result<AggregatorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AggregatorConfig::default();

    if let Some(max) = parse_positive(&lookup, "AGGREGATOR_MAX_CONCURRENCY")? {
        config.max_concurrency = usize::try_from(max).unwrap_or(usize::MAX);
    }
    if let Some(secs) = parse_positive(&lookup, "AGGREGATOR_QUERY_TIMEOUT_SECS")? {
        config.query_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(secs) = parse_positive(&lookup, "AGGREGATOR_DEADLINE_SECS")? {
        config.deadline = Some(Duration::from_secs(secs));
    }

    log::debug!(
        "📦 Agregador: max {} simultâneas, timeout {:?}, prazo {:?}",
        config.max_concurrency,
        config.query_timeout,
        config.deadline
    );

    Ok(config)
}

/// Timeout dos clientes HTTP (`HTTP_TIMEOUT_SECS`, padrão: 60)
pub fn load_http_timeout() -> Result<Duration, ConfigError> {
    http_timeout_from(env_lookup)
}

/// Versão de `load_http_timeout` com função de busca injetável
pub fn http_timeout_from<F>(lookup: F) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_positive(&lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Ok(Duration::from_secs(secs))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RUNTIME TOKIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuração do runtime Tokio.
///
/// Controla número de threads e o pool de blocking threads, que é onde as
/// consultas bloqueantes do agregador rodam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 16
    pub max_threads: usize,

    /// Número máximo de blocking threads.
    /// Padrão: 512 (padrão do Tokio)
    pub max_blocking_threads: usize,

    /// Nome das threads do runtime.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_threads: 16,
            max_blocking_threads: 512,
            thread_name: "search-aggregator".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Cria configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calcula número efetivo de worker threads.
    ///
    /// Se `worker_threads` está definido, usa esse valor.
    /// Senão, calcula: min(cpu_cores, max_threads)
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            std::cmp::min(num_cpus::get(), self.max_threads)
        }
    }
}

/// Carrega configuração do runtime a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `TOKIO_THREADS`: Número fixo de threads (opcional)
/// - `TOKIO_MAX_THREADS`: Máximo de threads para cálculo dinâmico (padrão: 16)
/// - `TOKIO_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
///
/// Valores inválidos são ignorados (mantém o padrão).
pub fn load_runtime_config() -> RuntimeConfig {
    runtime_config_from(env_lookup)
}

/// Versão de `load_runtime_config` com função de busca injetável
pub fn runtime_config_from<F>(lookup: F) -> RuntimeConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RuntimeConfig::default();
    let positive = |name: &str| {
        lookup(name)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
    };

    if let Some(threads) = positive("TOKIO_THREADS") {
        config.worker_threads = Some(threads);
        log::info!("📦 TOKIO_THREADS={} (fixo)", threads);
    }
    if let Some(max) = positive("TOKIO_MAX_THREADS") {
        config.max_threads = max;
        log::info!("📦 TOKIO_MAX_THREADS={}", max);
    }
    if let Some(blocking) = positive("TOKIO_MAX_BLOCKING") {
        config.max_blocking_threads = blocking;
        log::info!("📦 TOKIO_MAX_BLOCKING={}", blocking);
    }

    if config.worker_threads.is_none() {
        log::info!(
            "🔧 Tokio: {} threads (dinâmico: min({} cores, {} max))",
            config.effective_worker_threads(),
            num_cpus::get(),
            config.max_threads
        );
    }

    config
}

/// Instala panic hook que loga o panic em vez de imprimir no stderr.
///
/// Panics dentro de consultas são capturados pelo agregador e viram falha da
/// fonte; o hook só garante que eles apareçam no log com thread e localização.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        log::error!(
            "[PANIC] Thread {:?} ({}) at {}: {}",
            thread.id(),
            thread_name,
            location,
            panic_message(panic_info.payload())
        );
    }));
}

/// Cria o runtime Tokio com configuração customizada.
///
/// # Exemplo
///
/// ```rust,ignore
/// fn main() -> anyhow::Result<()> {
///     let config = load_runtime_config();
///     let runtime = create_tokio_runtime(&config)?;
///     runtime.block_on(async { /* ... */ });
///     Ok(())
/// }
/// ```
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::info!(
        "🚀 Criando runtime Tokio: {} workers, {} blocking max",
        worker_threads,
        config.max_blocking_threads
    );

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}

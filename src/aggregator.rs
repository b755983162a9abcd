// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AGREGADOR CONCORRENTE DE CONSULTAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Fan-out/fan-in: dispara N consultas independentes (bloqueantes ou async),
// espera TODAS e junta os resultados em um mapa fonte → payload | falha.
//
// - Consultas bloqueantes vão para o pool de blocking threads do Tokio
// - Consultas async viram tasks independentes
// - Semáforo limita quantas rodam ao mesmo tempo
// - Falha (ou panic) de uma fonte nunca aborta as outras
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::sources::SourceError;
use crate::utils::{panic_message, ActionTimer, TimingStats};

/// Resultado de uma fonte individual
pub type SourceOutcome<T> = Result<T, SourceError>;

/// Erros que derrubam a agregação inteira
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// Duas ou mais consultas com o mesmo identificador
    #[error("Duplicate source identifier: {0}")]
    DuplicateSource(String),

    /// Task cancelada pelo runtime (ex.: shutdown)
    #[error("Aggregation join failed: {0}")]
    JoinFailed(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONSULTA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

enum QueryOp<T> {
    Blocking(Box<dyn FnOnce() -> SourceOutcome<T> + Send + 'static>),
    Async(BoxFuture<'static, SourceOutcome<T>>),
}

impl<T: Send + 'static> QueryOp<T> {
    /// Executa a operação capturando panics como falha da fonte.
    ///
    /// A permissão do semáforo acompanha a operação: numa consulta bloqueante
    /// ela só é liberada quando a blocking thread retorna, mesmo que o
    /// agregador já tenha desistido de esperar por ela.
    fn execute(self, permit: OwnedSemaphorePermit) -> BoxFuture<'static, SourceOutcome<T>> {
        match self {
            Self::Blocking(op) => async move {
                let task = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    op()
                });
                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_panic() => {
                        Err(SourceError::Panicked(panic_message(e.into_panic().as_ref())))
                    }
                    Err(e) => Err(SourceError::Cancelled(e.to_string())),
                }
            }
            .boxed(),
            Self::Async(fut) => AssertUnwindSafe(fut)
                .catch_unwind()
                .map(move |result| {
                    drop(permit);
                    result.unwrap_or_else(|payload| {
                        Err(SourceError::Panicked(panic_message(payload.as_ref())))
                    })
                })
                .boxed(),
        }
    }
}

/// Unidade de trabalho nomeada: identificador da fonte + operação.
///
/// Construída a cada invocação; não guarda estado entre agregações.
pub struct SourceQuery<T> {
    id: String,
    op: QueryOp<T>,
}

impl<T: Send + 'static> SourceQuery<T> {
    /// Consulta bloqueante (I/O síncrono), executada em uma blocking thread
    pub fn blocking<F>(id: impl Into<String>, op: F) -> Self
    where
        F: FnOnce() -> SourceOutcome<T> + Send + 'static,
    {
        Self {
            id: id.into(),
            op: QueryOp::Blocking(Box::new(op)),
        }
    }

    /// Consulta async, executada como task independente
    pub fn future<Fut>(id: impl Into<String>, fut: Fut) -> Self
    where
        Fut: Future<Output = SourceOutcome<T>> + Send + 'static,
    {
        Self {
            id: id.into(),
            op: QueryOp::Async(fut.boxed()),
        }
    }

    /// Identificador da fonte
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Se a operação é bloqueante
    pub fn is_blocking(&self) -> bool {
        matches!(self.op, QueryOp::Blocking(_))
    }
}

impl<T> std::fmt::Debug for SourceQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceQuery")
            .field("id", &self.id)
            .field(
                "op",
                &match self.op {
                    QueryOp::Blocking(_) => "blocking",
                    QueryOp::Async(_) => "async",
                },
            )
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RESULTADO AGREGADO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resultado de uma fonte com seu tempo de execução
#[derive(Debug)]
pub struct SourceReport<T> {
    /// Payload ou falha
    pub outcome: SourceOutcome<T>,
    /// Tempo desde a liberação pelo semáforo até o fim
    pub elapsed: Duration,
}

/// Mapa fonte → payload | falha, com exatamente uma entrada por fonte pedida
#[derive(Debug)]
pub struct AggregateResult<T> {
    /// ID da agregação (correlação de logs)
    pub id: Uuid,
    /// Início da agregação
    pub started_at: DateTime<Utc>,
    /// Tempo total (parede) da agregação
    pub elapsed: Duration,
    entries: HashMap<String, SourceReport<T>>,
}

impl<T> AggregateResult<T> {
    /// Número de fontes no resultado
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Se nenhuma fonte foi pedida
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Se a fonte está no resultado
    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    /// Resultado da fonte
    pub fn get(&self, source: &str) -> Option<&SourceOutcome<T>> {
        self.entries.get(source).map(|r| &r.outcome)
    }

    /// Payload da fonte, se ela teve sucesso
    pub fn payload(&self, source: &str) -> Option<&T> {
        self.get(source).and_then(|o| o.as_ref().ok())
    }

    /// Falha da fonte, se ela falhou
    pub fn error(&self, source: &str) -> Option<&SourceError> {
        self.get(source).and_then(|o| o.as_ref().err())
    }

    /// Relatório completo da fonte
    pub fn report(&self, source: &str) -> Option<&SourceReport<T>> {
        self.entries.get(source)
    }

    /// Identificadores das fontes (ordenados)
    pub fn sources(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Fontes que tiveram sucesso
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .filter_map(|(k, r)| r.outcome.as_ref().ok().map(|p| (k.as_str(), p)))
    }

    /// Fontes que falharam
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SourceError)> {
        self.entries
            .iter()
            .filter_map(|(k, r)| r.outcome.as_ref().err().map(|e| (k.as_str(), e)))
    }

    /// Quantidade de sucessos
    pub fn success_count(&self) -> usize {
        self.entries.values().filter(|r| r.outcome.is_ok()).count()
    }

    /// Quantidade de falhas
    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Se todas as fontes tiveram sucesso
    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// Estatísticas de tempo por fonte
    pub fn timing_stats(&self) -> TimingStats {
        let mut stats = TimingStats::new();
        for (source, report) in &self.entries {
            stats.record(source, report.elapsed.as_millis());
        }
        stats
    }

    /// Consome o resultado, devolvendo o mapa fonte → resultado
    pub fn into_outcomes(self) -> HashMap<String, SourceOutcome<T>> {
        self.entries
            .into_iter()
            .map(|(k, r)| (k, r.outcome))
            .collect()
    }
}

impl<T: Serialize> AggregateResult<T> {
    /// Serializa como objeto JSON fonte → payload, com marcador de falha
    /// `{"error": ..., "kind": ...}` para fontes que falharam
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for source in self.sources() {
            let value = match self.get(source) {
                Some(Ok(payload)) => serde_json::to_value(payload).unwrap_or_else(|e| {
                    json!({ "error": e.to_string(), "kind": "serialization" })
                }),
                Some(Err(err)) => json!({ "error": err.to_string(), "kind": err.kind() }),
                None => Value::Null,
            };
            map.insert(source.to_string(), value);
        }
        Value::Object(map)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AGREGADOR
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuração do agregador
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    /// Máximo de consultas simultâneas (mínimo efetivo: 1)
    pub max_concurrency: usize,
    /// Timeout por consulta
    pub query_timeout: Option<Duration>,
    /// Prazo total da agregação
    pub deadline: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            query_timeout: Some(Duration::from_secs(30)),
            deadline: None,
        }
    }
}

/// Agregador concorrente de consultas.
///
/// # Exemplo
///
/// ```rust,ignore
/// let aggregator = Aggregator::new(AggregatorConfig::default());
/// let result = aggregator
///     .run(vec![
///         SourceQuery::blocking("search", || Ok(json!(["url1", "url2"]))),
///         SourceQuery::future("review", async { Ok(json!([{"name": "Acme Cafe"}])) }),
///     ])
///     .await?;
/// assert_eq!(result.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Cria agregador com a configuração dada
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Configuração em uso
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Executa todas as consultas concorrentemente e espera todas terminarem.
    ///
    /// Uma consulta bloqueante que estoura o timeout não pode ser interrompida:
    /// o agregador só para de esperar por ela e registra `Timeout`. Ela continua
    /// ocupando sua vaga no semáforo até retornar de fato.
    pub async fn run<T: Send + 'static>(
        &self,
        queries: Vec<SourceQuery<T>>,
    ) -> Result<AggregateResult<T>, AggregateError> {
        let mut requested: Vec<String> = Vec::with_capacity(queries.len());
        let mut seen = HashSet::with_capacity(queries.len());
        for query in &queries {
            if !seen.insert(query.id.as_str()) {
                return Err(AggregateError::DuplicateSource(query.id.clone()));
            }
            requested.push(query.id.clone());
        }

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = ActionTimer::start(&format!("Agregação {}", id));
        let max_concurrency = self.config.max_concurrency.max(1);

        log::info!(
            "🚀 Agregação {}: disparando {} fontes (max {} simultâneas)",
            id,
            requested.len(),
            max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let mut join_set = JoinSet::new();

        for query in queries {
            let semaphore = semaphore.clone();
            let query_timeout = self.config.query_timeout;

            join_set.spawn(async move {
                let SourceQuery { id, op } = query;

                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let report = SourceReport {
                            outcome: Err(SourceError::Cancelled(e.to_string())),
                            elapsed: Duration::ZERO,
                        };
                        return (id, report);
                    }
                };

                let source_timer = ActionTimer::start(&id);
                let execution = op.execute(permit);
                let outcome = match query_timeout {
                    Some(limit) => tokio::time::timeout(limit, execution)
                        .await
                        .unwrap_or(Err(SourceError::Timeout(limit))),
                    None => execution.await,
                };

                let report = SourceReport {
                    outcome,
                    elapsed: source_timer.stop(),
                };
                (id, report)
            });
        }

        let deadline_at = self
            .config
            .deadline
            .map(|d| (d, tokio::time::Instant::now() + d));
        let mut entries: HashMap<String, SourceReport<T>> = HashMap::with_capacity(requested.len());

        loop {
            let next = match deadline_at {
                Some((limit, at)) => match tokio::time::timeout_at(at, join_set.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        log::warn!(
                            "⏰ Agregação {}: prazo de {:?} estourado com {} fontes pendentes",
                            id,
                            limit,
                            requested.len() - entries.len()
                        );
                        join_set.abort_all();
                        break;
                    }
                },
                None => join_set.join_next().await,
            };

            match next {
                None => break,
                Some(Ok((source, report))) => {
                    match &report.outcome {
                        Ok(_) => log::debug!(
                            "✅ {} concluída em {}ms",
                            source,
                            report.elapsed.as_millis()
                        ),
                        Err(e) => log::warn!(
                            "❌ {} falhou em {}ms: {}",
                            source,
                            report.elapsed.as_millis(),
                            e
                        ),
                    }
                    entries.insert(source, report);
                }
                Some(Err(e)) => {
                    log::error!("💥 Agregação {}: join falhou: {}", id, e);
                    join_set.abort_all();
                    return Err(AggregateError::JoinFailed(e.to_string()));
                }
            }
        }

        // Fontes que não terminaram antes do prazo
        if let Some((limit, _)) = deadline_at {
            let elapsed = timer.elapsed();
            for source in &requested {
                entries.entry(source.clone()).or_insert_with(|| SourceReport {
                    outcome: Err(SourceError::DeadlineExceeded(limit)),
                    elapsed,
                });
            }
        }

        let result = AggregateResult {
            id,
            started_at,
            elapsed: timer.stop(),
            entries,
        };

        log::info!(
            "📊 Agregação {} concluída em {}ms | {} ok | {} falhas",
            id,
            result.elapsed.as_millis(),
            result.success_count(),
            result.failure_count()
        );

        Ok(result)
    }
}

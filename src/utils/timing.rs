// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIMING UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para medir tempo de execução de operações.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::any::Any;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Timer para medir duração de operações
pub struct ActionTimer {
    start: Instant,
    action_name: String,
}

impl ActionTimer {
    /// Inicia um novo timer para uma ação
    pub fn start(action_name: &str) -> Self {
        Self {
            start: Instant::now(),
            action_name: action_name.to_string(),
        }
    }

    /// Retorna o tempo decorrido como Duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Para o timer e loga o tempo decorrido
    pub fn stop_and_log(self) -> Duration {
        let elapsed = self.elapsed();
        log::info!("⏱️  {} completado em {}ms", self.action_name, elapsed.as_millis());
        elapsed
    }

    /// Para o timer e retorna o tempo sem logar
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

/// Estatísticas de tempo por fonte (ms)
#[derive(Debug, Clone, Default)]
pub struct TimingStats {
    times: BTreeMap<String, Vec<u128>>,
}

impl TimingStats {
    /// Cria estatísticas vazias
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um tempo para a fonte
    pub fn record(&mut self, source: &str, ms: u128) {
        self.times.entry(source.to_string()).or_default().push(ms);
    }

    /// Calcula média de uma lista de tempos
    fn avg(times: &[u128]) -> f64 {
        if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<u128>() as f64 / times.len() as f64
        }
    }

    /// Média de tempo da fonte (0.0 se desconhecida)
    pub fn avg_time(&self, source: &str) -> f64 {
        self.times.get(source).map(|t| Self::avg(t)).unwrap_or(0.0)
    }

    /// Fonte mais lenta e seu pior tempo
    pub fn slowest(&self) -> Option<(&str, u128)> {
        self.times
            .iter()
            .filter_map(|(source, times)| times.iter().max().map(|max| (source.as_str(), *max)))
            .max_by_key(|(_, max)| *max)
    }

    /// Soma de todos os tempos (o que uma execução serial custaria)
    pub fn serial_time(&self) -> u128 {
        self.times.values().flatten().sum()
    }

    /// Formata um resumo das estatísticas
    pub fn summary(&self) -> String {
        let mut lines = vec!["Timing Stats:".to_string()];
        for (source, times) in &self.times {
            lines.push(format!(
                "- {}: {} calls, avg {:.1}ms, total {}ms",
                source,
                times.len(),
                Self::avg(times),
                times.iter().sum::<u128>()
            ));
        }
        lines.push(format!("- Serial equivalent: {}ms", self.serial_time()));
        lines.join("\n")
    }
}

/// Extrai mensagem legível do payload de um panic
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic payload".to_string()
    }
}

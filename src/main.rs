// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SEARCH AGGREGATOR CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// CLI para consultar todas as fontes de uma vez.
//
// Uso:
//   search-aggregator-cli "coffee shops" --location 90210
//   search-aggregator-cli --suggest "prompt do usuário" "resposta do assistente"
//   search-aggregator-cli --tool google_geocode '{"address_lines": ["1 Main St"]}'
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::Context;
use search_aggregator::config::{
    create_tokio_runtime, install_panic_hook, load_aggregator_config, load_http_timeout,
    load_runtime_config, LlmConfig, Secrets,
};
use search_aggregator::llm::{LlmClient, OpenAiClient};
use search_aggregator::tools::ToolRouter;
use search_aggregator::utils::ActionTimer;
use search_aggregator::{QueryParams, SearchSuite};
use std::path::PathBuf;
use std::sync::Arc;

/// Modo de execução escolhido pelos argumentos
enum Command {
    Search(QueryParams),
    Suggest { prompt: String, response: String },
    Tool { name: String, args: serde_json::Value },
}

/// Tenta carregar o arquivo .env de múltiplos locais possíveis
fn load_dotenv() {
    let possible_paths = [
        PathBuf::from(".env"),
        PathBuf::from("../.env"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env"),
    ];

    for path in &possible_paths {
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => {
                    eprintln!(
                        "✓ Carregado .env de: {:?}",
                        path.canonicalize().unwrap_or_else(|_| path.clone())
                    );
                    return;
                }
                Err(e) => {
                    eprintln!("⚠ Erro ao carregar {:?}: {}", path, e);
                }
            }
        }
    }

    if dotenvy::dotenv().is_err() {
        eprintln!("⚠ Nenhum arquivo .env encontrado. Usando apenas variáveis de ambiente.");
    }
}

fn print_usage(program: &str) {
    eprintln!("Search Aggregator CLI v{}", search_aggregator::VERSION);
    eprintln!();
    eprintln!("Uso: {} <query> [--location <zip>]", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --location <zip>               Localização para a busca de avaliações");
    eprintln!("  --suggest <prompt> <resposta>  Sugere 4 prompts de continuação");
    eprintln!("  --tool <nome> <json-args>      Executa uma ferramenta do assistente");
    eprintln!();
    eprintln!("Exemplos:");
    eprintln!("  {} \"coffee shops\" --location 90210", program);
    eprintln!("  {} --tool yelp_search '{{\"query\": \"coffee\", \"zipcode\": \"90210\"}}'", program);
}

fn parse_args(args: &[String]) -> anyhow::Result<Option<Command>> {
    match args.first().map(String::as_str) {
        None => Ok(None),
        Some("--suggest") if args.len() >= 3 => Ok(Some(Command::Suggest {
            prompt: args[1].clone(),
            response: args[2..].join(" "),
        })),
        Some("--tool") if args.len() >= 2 => {
            let raw = args.get(2).map(String::as_str).unwrap_or("{}");
            let tool_args = serde_json::from_str(raw)
                .with_context(|| format!("Argumentos JSON inválidos: {}", raw))?;
            Ok(Some(Command::Tool {
                name: args[1].clone(),
                args: tool_args,
            }))
        }
        Some("--suggest") | Some("--tool") => Ok(None),
        Some(_) => {
            let mut words = Vec::new();
            let mut location = None;
            let mut iter = args.iter();
            while let Some(arg) = iter.next() {
                if arg == "--location" {
                    location = iter.next().cloned();
                } else {
                    words.push(arg.as_str());
                }
            }
            if words.is_empty() {
                return Ok(None);
            }

            let mut params = QueryParams::new(words.join(" "));
            if let Some(location) = location {
                params = params.with_location(location);
            }
            Ok(Some(Command::Search(params)))
        }
    }
}

fn build_llm(http_timeout: std::time::Duration) -> anyhow::Result<Arc<dyn LlmClient>> {
    let config = LlmConfig::from_env()?;
    Ok(Arc::new(
        OpenAiClient::new(config.api_key, http_timeout)
            .with_model(&config.model)
            .with_base_url(&config.base_url),
    ))
}

async fn run(command: Command) -> anyhow::Result<()> {
    let http_timeout = load_http_timeout()?;

    match command {
        Command::Search(params) => {
            let suite = SearchSuite::with_real_clients(
                &Secrets::from_env()?,
                http_timeout,
                load_aggregator_config()?,
            );
            let timer = ActionTimer::start("Busca em todas as fontes");
            let result = suite.execute_all(&params).await?;
            timer.stop_and_log();

            println!("{}", serde_json::to_string_pretty(&result.to_json())?);

            let stats = result.timing_stats();
            log::info!("{}", stats.summary());
            if let Some((source, ms)) = stats.slowest() {
                log::info!("🐢 Fonte mais lenta: {} ({}ms)", source, ms);
            }
        }
        Command::Suggest { prompt, response } => {
            let prompts = build_llm(http_timeout)?
                .suggest_prompts(&prompt, &response)
                .await?;
            println!("{}", serde_json::to_string_pretty(&prompts)?);
        }
        Command::Tool { name, args } => {
            let suite = SearchSuite::with_real_clients(
                &Secrets::from_env()?,
                http_timeout,
                load_aggregator_config()?,
            );
            let router = ToolRouter::new(suite, build_llm(http_timeout)?);
            let output = router.dispatch(&name, &args).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_hook();

    let args: Vec<String> = std::env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "search-aggregator-cli".into());

    let Some(command) = parse_args(&args[1.min(args.len())..])? else {
        print_usage(&program);
        std::process::exit(1);
    };

    let runtime = create_tokio_runtime(&load_runtime_config())?;
    runtime.block_on(run(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_search_with_location() {
        match parse_args(&args(&["coffee", "shops", "--location", "90210"])).unwrap() {
            Some(Command::Search(params)) => {
                assert_eq!(params.query, "coffee shops");
                assert_eq!(params.location(), Some("90210"));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_parse_tool_and_suggest() {
        match parse_args(&args(&["--tool", "google_geocode", r#"{"address_lines": ["1 Main St"]}"#]))
            .unwrap()
        {
            Some(Command::Tool { name, args }) => {
                assert_eq!(name, "google_geocode");
                assert_eq!(args["address_lines"][0], "1 Main St");
            }
            _ => panic!("expected tool"),
        }

        assert!(matches!(
            parse_args(&args(&["--suggest", "p", "r"])).unwrap(),
            Some(Command::Suggest { .. })
        ));
        assert!(parse_args(&args(&["--tool", "x", "{not json"])).is_err());
        assert!(parse_args(&args(&[])).unwrap().is_none());
    }
}

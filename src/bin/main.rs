//! search-router CLI - command-line access to the failover search router
//!
//! Runs searches through the configured provider chain, probes single
//! providers, and edits the persisted chain and adapter settings.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use search_router::{
    available_sources, resolve_provider_chain, resolve_source_chain, AdapterId, AdapterUpdate,
    ConfigStore, HostSettings, ProviderRegistry, SearchResult, SearchRouter,
};

#[derive(Parser)]
#[command(name = "search-router")]
#[command(about = "Web search with provider failover")]
#[command(version)]
struct Cli {
    /// Router config file
    #[arg(long, global = true, env = "OPENCLAW_SEARCH_ADAPTERS_PATH")]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search through the configured chain
    Search {
        /// Search query
        query: String,

        /// Number of results (overrides each provider's topK)
        #[arg(short, long)]
        count: Option<u32>,

        /// Use the legacy adapter-only chain
        #[arg(long)]
        legacy: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Run a small test query against one provider
    Test {
        /// Adapter id (serper, tavily, zhipu) or source id (official:brave)
        id: String,
    },
    /// Show chain configuration and provider settings
    Status,
    /// Set the primary source (adapter:<id>, official:<name>) or adapter id
    SetPrimary { id: String },
    /// Replace the fallback sources; bare adapter ids edit the legacy list,
    /// no ids clears both lists
    SetFallbacks { ids: Vec<String> },
    /// Change one adapter's settings
    Update {
        /// Adapter id
        id: String,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Default result count, clamped to 1..=20
        #[arg(long)]
        top_k: Option<i64>,

        /// Cooldown after a rate limit, clamped to 5..=3600 seconds
        #[arg(long)]
        cooldown: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Simple,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::from_env(),
    };

    match cli.command {
        Commands::Search {
            query,
            count,
            legacy,
            format,
        } => {
            let mut router = build_router(store)?;
            let results = if legacy {
                router.search_with_provider_failover(&query, count).await?
            } else {
                router.search_with_unified_failover(&query, count).await?
            };
            display_results(&results, &format)?;
        }
        Commands::Test { id } => {
            let router = build_router(store)?;
            let (ok, message) = router.test_provider_connection(&id).await;
            if ok {
                println!("{} {} {}", "✔".green(), id.bold(), message);
            } else {
                println!("{} {} {}", "✘".red(), id.bold(), message.red());
                std::process::exit(1);
            }
        }
        Commands::Status => display_status(&store),
        Commands::SetPrimary { id } => {
            if id.contains(':') {
                store.set_primary_source(&id)?;
            } else {
                store.set_primary_provider(&id)?;
            }
            println!("primary set to {}", id.bold());
        }
        Commands::SetFallbacks { ids } => {
            let prefixed = ids.iter().filter(|id| id.contains(':')).count();
            if ids.is_empty() {
                store.set_fallback_providers(&ids)?;
                store.set_fallback_sources(&ids)?;
            } else if prefixed == 0 {
                store.set_fallback_providers(&ids)?;
            } else if prefixed == ids.len() {
                store.set_fallback_sources(&ids)?;
            } else {
                anyhow::bail!("cannot mix bare adapter ids with adapter:/official: source ids");
            }
            println!("fallbacks set to [{}]", ids.join(", "));
        }
        Commands::Update {
            id,
            enable,
            disable,
            api_key,
            base_url,
            model,
            top_k,
            cooldown,
        } => {
            let update = AdapterUpdate {
                enabled: match (enable, disable) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                api_key,
                base_url,
                model,
                top_k,
                cooldown_seconds: cooldown,
            };
            store.update_provider(&id, &update)?;
            println!("{} updated", id.bold());
        }
    }

    Ok(())
}

fn build_router(store: ConfigStore) -> anyhow::Result<SearchRouter> {
    let http = search_router::utils::http::HttpClient::new()?;
    let registry = ProviderRegistry::standard(http, HostSettings::from_env());
    Ok(SearchRouter::new(store, registry))
}

fn display_results(results: &[SearchResult], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Simple => {
            for (i, result) in results.iter().enumerate() {
                println!("{}. {}", i + 1, result.title);
                println!("   {}", result.url);
                if !result.snippet.is_empty() {
                    println!("   {}", result.snippet);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            println!("{}", "Search Results".bold().blue());
            println!("{}", "─".repeat(80).dimmed());

            for (i, result) in results.iter().enumerate() {
                println!("{}. {}", (i + 1).to_string().bold(), result.title.bold());
                println!("   {}", result.url.blue().underline());
                if !result.snippet.is_empty() {
                    let truncated: String = result.snippet.chars().take(200).collect();
                    println!("   {}", truncated.italic());
                }
                println!("   source: {}", result.source.cyan());
                println!();
            }

            println!("{} {}", "Total results:".bold(), results.len().to_string().bold());
        }
    }
    Ok(())
}

fn display_status(store: &ConfigStore) {
    let cfg = store.load().redacted();
    let join = |items: Vec<String>| {
        if items.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            items.join(" → ")
        }
    };

    println!("{} {}", "Config:".bold(), store.path().display());
    println!(
        "{} {}",
        "Unified chain:".bold(),
        join(resolve_source_chain(&cfg).iter().map(|s| s.to_string()).collect())
    );
    println!(
        "{} {}",
        "Legacy chain:".bold(),
        join(resolve_provider_chain(&cfg).iter().map(|s| s.to_string()).collect())
    );
    println!(
        "{} {}",
        "Active source:".bold(),
        cfg.active_source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!();

    println!("{}", "Adapters:".bold().blue());
    for id in AdapterId::ALL {
        let p = cfg.provider(id);
        let state = if p.enabled { "enabled".green() } else { "disabled".red() };
        let key = if p.has_api_key() {
            p.api_key.normal()
        } else {
            format!("unset (e.g. ${})", id.env_key()).yellow()
        };
        println!("  {} ({}) - {}", id.to_string().bold(), id.label().italic(), state);
        println!("    key: {key}  url: {}", p.base_url);
        println!("    topK: {}  cooldown: {}s", p.top_k, p.cooldown_seconds);
    }
    println!();

    let sources: Vec<String> = available_sources().iter().map(|s| s.to_string()).collect();
    println!("{} {}", "Available sources:".bold(), sources.join(", "));
}

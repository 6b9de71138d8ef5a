use anyhow::Result;
use atlas_api::{start_server, AppState};
use atlas_assistant::{
    AnthropicTransport, Assistant, AssistantTransport, CitationMethod, Message,
};
use atlas_catalog::{Catalog, Ingestor, UploadTracker};
use atlas_metrics::MetricsService;
use atlas_models::{AtlasError, Config};
use atlas_store::{HttpObjectStore, PapersStore};
use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use sqlx::SqlitePool;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "diatom-atlas-server",
    about = "Diatom Atlas labelling service"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "configs/default.toml")]
    config: String,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,
}

/// Stand-in transport used when no API key is configured: the rest of
/// the service works, assistant endpoints fail with a config error.
struct UnconfiguredAssistant;

#[async_trait::async_trait]
impl AssistantTransport for UnconfiguredAssistant {
    async fn complete(&self, _messages: &[Message]) -> Result<String, AtlasError> {
        Err(AtlasError::ConfigError {
            reason: "assistant API key is not configured".to_string(),
        })
    }
}

fn load_config(path: &str) -> Result<Config> {
    let config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ATLAS_").split("__"))
        .extract()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    atlas_metrics::init_tracing().map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let args = Args::parse();
    info!("Starting Diatom Atlas server");

    let config = load_config(&args.config)?;

    // Container runtimes hand the port down via PORT; a --port flag wins
    // over both.
    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(config.server.port);

    if !config.data.dir.is_empty() {
        fs::create_dir_all(&config.data.dir)?;
    }
    if let Some(db_path) = config.data.db_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            fs::create_dir_all(parent)?;
        }
        if !Path::new(db_path).exists() {
            fs::File::create(db_path)?;
            info!("Created database file: {}", db_path);
        }
    }

    let pool = SqlitePool::connect(&config.data.db_url).await?;
    info!("Database connected");

    let client = reqwest::Client::new();
    let store = Arc::new(HttpObjectStore::new(client.clone(), &config.storage));
    let papers_store = Arc::new(PapersStore::new(store, config.storage.clone()));

    let catalog = Arc::new(Catalog::new(papers_store.clone()));
    match catalog.load().await {
        Ok(count) => info!("Loaded {} papers from storage", count),
        Err(e) => warn!("Could not load papers document, starting empty: {}", e),
    }

    let transport: Box<dyn AssistantTransport> =
        match AnthropicTransport::new(client.clone(), config.assistant.clone()) {
            Ok(transport) => Box::new(transport),
            Err(e) => {
                warn!("Assistant disabled: {}", e);
                Box::new(UnconfiguredAssistant)
            }
        };
    let assistant = Arc::new(Assistant::new(transport));

    let tracker = Arc::new(UploadTracker::new(pool).await?);
    let ingestor = Arc::new(Ingestor::new(
        client,
        papers_store.clone(),
        catalog.clone(),
        assistant.clone(),
        tracker,
        config.limits.clone(),
        CitationMethod::Default,
    ));

    let metrics = Arc::new(MetricsService::new()?);

    let state = AppState::new(
        config.clone(),
        catalog,
        assistant,
        ingestor,
        papers_store,
        metrics,
    );

    let bind = config.server.bind.clone();
    tokio::select! {
        result = start_server(bind, port, state) => {
            result.map_err(|e| anyhow::anyhow!("server error: {e}"))?;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}

//! Config loading, logging setup and pipeline wiring shared by every command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use academaide_config::AppConfig;
use academaide_core::{ConversationStore, ResponseCache};
use academaide_pipeline::{ChatPipeline, Collaborators, PipelineSettings};
use academaide_store::{
    Fixture, InMemoryAcademicStore, InMemoryConversationStore, InMemoryResponseCache,
    InMemoryVectorStore, PostgresStore, RedisResponseCache,
};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Where records, turns and cached replies live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMode {
    /// PostgreSQL for records and chat logs, Redis for the cache.
    Persistent,
    /// Process-local stores, optionally seeded from a fixture file.
    Ephemeral { fixture: Option<PathBuf> },
}

impl StoreMode {
    pub fn from_flags(ephemeral: bool, fixture: Option<PathBuf>) -> Self {
        if ephemeral || fixture.is_some() {
            Self::Ephemeral { fixture }
        } else {
            Self::Persistent
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral { .. })
    }
}

/// Load from `path` if given, else the default location.
pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The filter directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &AppConfig, verbose: bool) -> String {
    if verbose {
        "debug".into()
    } else {
        config.logging.level.clone()
    }
}

pub fn init_logging(config: &AppConfig, verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config, verbose)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json || config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Connect to the backends named by `mode` and build the pipeline.
pub async fn build_pipeline(config: &AppConfig, mode: &StoreMode) -> CliResult<ChatPipeline> {
    let providers = academaide_providers::build_from_config(config)?;
    let settings = PipelineSettings::from_config(config);

    let collaborators = match mode {
        StoreMode::Persistent => {
            let pg = Arc::new(
                PostgresStore::connect(&config.database.url, config.database.max_connections).await?,
            );
            let cache = connect_cache(&config.cache.redis_url).await;
            let conversations: Arc<dyn ConversationStore> = pg.clone();
            Collaborators {
                records: pg.clone(),
                vectors: pg,
                conversations,
                cache,
                embedder: providers.embedding,
                generator: providers.generation,
            }
        }
        StoreMode::Ephemeral { fixture } => {
            let (records, vectors) = match fixture {
                Some(path) => {
                    let (records, vectors) = Fixture::load(path)?.into_stores();
                    info!(fixture = %path.display(), "Seeded in-memory stores");
                    (records, vectors)
                }
                None => (InMemoryAcademicStore::new(), InMemoryVectorStore::new()),
            };
            Collaborators {
                records: Arc::new(records),
                vectors: Arc::new(vectors),
                conversations: Arc::new(InMemoryConversationStore::new()),
                cache: Arc::new(InMemoryResponseCache::new()),
                embedder: providers.embedding,
                generator: providers.generation,
            }
        }
    };

    info!(
        ephemeral = mode.is_ephemeral(),
        model = %settings.generation_model,
        "Pipeline ready"
    );
    Ok(ChatPipeline::new(collaborators, settings))
}

/// A Redis outage at startup degrades to a process-local cache.
async fn connect_cache(redis_url: &str) -> Arc<dyn ResponseCache> {
    match RedisResponseCache::connect(redis_url).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, "Redis unavailable, using in-memory response cache");
            Arc::new(InMemoryResponseCache::new())
        }
    }
}

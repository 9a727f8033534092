//! `academaide doctor`: diagnose config and backend health.

use academaide_config::AppConfig;
use academaide_core::GenerationService;
use academaide_providers::OllamaClient;
use academaide_store::{PostgresStore, RedisResponseCache};

use crate::runtime::{CliResult, StoreMode};

pub async fn run(config: AppConfig, mode: StoreMode) -> CliResult<()> {
    println!("AcademAide Doctor");
    println!("=================\n");

    let mut issues = 0;

    // Loading already validated it; an invalid file never gets this far.
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file valid ({})", config_path.display());
    } else {
        println!("  info  No config file at {}, using defaults", config_path.display());
    }

    if mode.is_ephemeral() {
        println!("  info  Ephemeral mode, skipping Postgres and Redis");
    } else {
        match PostgresStore::connect(&config.database.url, 1).await {
            Ok(store) => match store.ping().await {
                Ok(()) => println!("  ok    PostgreSQL reachable"),
                Err(e) => {
                    println!("  FAIL  PostgreSQL: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  FAIL  PostgreSQL: {e}");
                issues += 1;
            }
        }

        match RedisResponseCache::connect(&config.cache.redis_url).await {
            Ok(cache) => match cache.ping().await {
                Ok(()) => println!("  ok    Redis reachable"),
                Err(e) => {
                    println!("  warn  Redis: {e} (chat still works without the cache)");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  warn  Redis: {e} (chat still works without the cache)");
                issues += 1;
            }
        }
    }

    let endpoints = [
        ("Generation", &config.generation.base_url),
        ("Embedding", &config.embedding.base_url),
    ];
    for (label, url) in endpoints {
        let healthy = match OllamaClient::new(url.as_str(), config.generation_timeout()) {
            Ok(client) => client.health_check().await.unwrap_or(false),
            Err(_) => false,
        };
        if healthy {
            println!("  ok    {label} endpoint reachable ({url})");
        } else {
            println!("  FAIL  {label} endpoint unreachable ({url})");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

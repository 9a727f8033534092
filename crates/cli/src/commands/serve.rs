//! `academaide serve`: start the HTTP gateway.

use std::sync::Arc;

use academaide_config::AppConfig;

use crate::runtime::{CliResult, StoreMode, build_pipeline};

pub async fn run(mut config: AppConfig, mode: StoreMode, port_override: Option<u16>) -> CliResult<()> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("AcademAide Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.generation.model);
    println!(
        "   Stores:    {}",
        if mode.is_ephemeral() { "in-memory" } else { "postgres + redis" }
    );

    let pipeline = build_pipeline(&config, &mode).await?;
    academaide_gateway::start(&config, Arc::new(pipeline)).await?;

    Ok(())
}

//! `academaide chat`: single-message or interactive chat as a given user.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use academaide_config::AppConfig;
use academaide_core::Role;
use academaide_pipeline::{Agent, ChatPipeline, ChatReply, ChatRequest};

use crate::runtime::{CliResult, StoreMode, build_pipeline};

pub async fn run(
    config: AppConfig,
    mode: StoreMode,
    user_id: String,
    role: String,
    agent: String,
    message: Option<String>,
) -> CliResult<()> {
    let pipeline = build_pipeline(&config, &mode).await?;
    let role = Role::parse(&role);

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let request = ChatRequest::new(&user_id, role, msg).with_agent(&agent);
        let reply = send(&pipeline, &request).await;
        eprint!("\r              \r");
        print_reply(&reply?);
        return Ok(());
    }

    println!();
    println!("  AcademAide, interactive mode");
    println!();
    println!("  User:    {user_id} ({role})");
    println!("  Persona: {}", Agent::parse(&agent));
    println!("  Model:   {}", config.generation.model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let request = ChatRequest::new(&user_id, role, line).with_agent(&agent);
        match send(&pipeline, &request).await {
            Ok(reply) => {
                println!();
                print_reply(&reply);
                println!();
            }
            Err(e) => eprintln!("  [Error] {e}"),
        }
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

/// Run one chat call; Ctrl-C cancels it without logging or caching.
async fn send(pipeline: &ChatPipeline, request: &ChatRequest) -> academaide_core::Result<ChatReply> {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let reply = pipeline.chat(request, &cancel).await;
    ctrl_c.abort();
    reply
}

fn print_reply(reply: &ChatReply) {
    for line in reply.text.lines() {
        println!("  Assistant > {line}");
    }
    let mut notes = Vec::new();
    if reply.cache_hit {
        notes.push("cached");
    }
    if reply.is_fallback {
        notes.push("fallback");
    }
    if !notes.is_empty() {
        println!("  ({})", notes.join(", "));
    }
}

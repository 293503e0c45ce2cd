//! lark-bridge CLI: run the bridge, broadcast, inspect and trim stored history. Config from env and `.env`.

use anyhow::{Context, Result};
use bridge_core::init_console_tracing;
use bridge_cli::{database_path, load_config, Cli, Commands};
use clap::Parser;
use lark_bot::{build_components, run_bridge};
use storage::MessageStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = load_config()?;
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_signal(cancel.clone()));
            run_bridge(config, cancel).await
        }
        Commands::Broadcast { text } => handle_broadcast(text).await,
        Commands::History {
            conversation,
            limit,
        } => handle_history(&conversation, limit).await,
        Commands::Trim { conversation, keep } => handle_trim(&conversation, keep).await,
    }
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
                    _ = term.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C, shutting down");
    }
    cancel.cancel();
}

async fn handle_broadcast(text: Option<String>) -> Result<()> {
    init_console_tracing();

    let config = load_config()?;
    config.validate()?;
    let text = text.unwrap_or_else(|| config.broadcast_text.clone());
    let components = build_components(&config).await?;

    let report = components
        .dispatcher
        .broadcast(&text)
        .await
        .context("Broadcast aborted")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn handle_history(conversation: &str, limit: i64) -> Result<()> {
    let path = database_path();
    let store = MessageStore::new(&path)
        .await
        .with_context(|| format!("Open message store at {}", path))?;

    let messages = store
        .list_by_conversation(conversation, limit)
        .await
        .context("Query conversation history")?;

    if messages.is_empty() {
        println!("No messages for conversation {} (path: {}).", conversation, path);
        return Ok(());
    }

    const BODY_PREVIEW_LEN: usize = 80;
    println!("{} message(s) in {} (oldest first):\n", messages.len(), conversation);
    println!(
        "{:<8} {:<20} {:<6} {:<30} {}",
        "id", "created_at", "sender", "platform_message_id", "body_preview"
    );
    println!("{}", "-".repeat(120));

    for m in &messages {
        let preview: String = m.body.chars().take(BODY_PREVIEW_LEN).collect();
        println!(
            "{:<8} {:<20} {:<6} {:<30} {}",
            m.id,
            m.created_at.format("%Y-%m-%d %H:%M:%S"),
            m.sender_kind,
            m.platform_message_id,
            preview.replace('\n', " ")
        );
    }

    Ok(())
}

async fn handle_trim(conversation: &str, keep: u32) -> Result<()> {
    let path = database_path();
    let store = MessageStore::new(&path)
        .await
        .with_context(|| format!("Open message store at {}", path))?;

    let deleted = store
        .trim_to_recent(conversation, keep)
        .await
        .context("Trim conversation history")?;

    println!(
        "Deleted {} message(s) from {}, kept at most {}.",
        deleted, conversation, keep
    );
    Ok(())
}

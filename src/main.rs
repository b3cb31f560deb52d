//! telegram-log - record log entries and relay the important ones to Telegram
//!
//! Appends every message to a persistent in-memory log (optionally saved as a
//! snapshot between runs), mirrors it to the console, and relays entries at or
//! above the minimum level to the configured chat.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use telegram_log::{
    cli::Cli,
    config::Config,
    logs::{MemoryLog, MultiLog, TracingLog},
    notification::HttpTransport,
    Entry, EmbeddableLog, TelegramLog,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    // RUST_LOG takes precedence over the configured filter.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!(
        "Chat Id: {}",
        config
            .telegram
            .chat_id
            .map_or_else(|| "Not configured".to_string(), |id| id.to_string())
    );
    info!(
        "Request URI: {}",
        if config.telegram.request_uri.is_some() {
            "Configured"
        } else {
            "Not configured"
        }
    );
    info!("Delivery Timeout: {}s", config.telegram.timeout_seconds);
    match &config.store.snapshot_path {
        Some(path) => info!("Snapshot: {}", path.display()),
        None => info!("Snapshot: Disabled"),
    }
    info!("-------------------------------------------------------");

    let mut log = build_log(&config)?;

    let messages = if cli.messages.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read messages from stdin")?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        cli.messages.clone()
    };

    for message in &messages {
        match log.with_entry(&Entry::new(cli.level, message.as_str())) {
            Ok(next) => log = next,
            Err(e) => {
                error!(error = %e, "Failed to append entry");
                // Keep the last good state so the failed entry can be retried.
                save_snapshot(&config, &log)?;
                return Err(e).context("Failed to append entry");
            }
        }
    }

    save_snapshot(&config, &log)?;
    info!("Appended {} entries.", messages.len());
    Ok(())
}

/// Builds the decorator chain, restoring it from the snapshot when one exists.
fn build_log(config: &Config) -> Result<TelegramLog> {
    let transport = HttpTransport::new(Duration::from_secs(config.telegram.timeout_seconds))
        .accept_invalid_certs(config.telegram.allow_invalid_certs);
    let base = MultiLog::new()
        .with_embedded(Box::new(TracingLog))
        .as_embeddable()
        .context("multi log must stay embeddable")?
        .with_embedded(Box::new(MemoryLog::new()));
    let mut log = TelegramLog::new(base).with_transport(Arc::new(transport));

    if let Some(path) = config.store.snapshot_path.as_deref().filter(|p| p.exists()) {
        log = load_snapshot(&log, path)?;
    }

    // Explicit configuration overrides whatever the snapshot carried.
    if let Some(id) = config.telegram.chat_id {
        log = log.with_chat_id(id);
    }
    if let Some(uri) = &config.telegram.request_uri {
        log = log.with_request_uri(uri.as_str());
    }
    if let Some(level) = config.telegram.min_level {
        log = log.with_min_level(level);
    }
    Ok(log)
}

fn load_snapshot(log: &TelegramLog, path: &Path) -> Result<TelegramLog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Snapshot {} is not valid JSON", path.display()))?;
    let restored = log
        .restored(&data)
        .with_context(|| format!("Failed to restore snapshot {}", path.display()))?;
    info!("Restored log state from {}", path.display());
    Ok(restored)
}

fn save_snapshot(config: &Config, log: &TelegramLog) -> Result<()> {
    let Some(path) = &config.store.snapshot_path else {
        return Ok(());
    };
    let data = serde_json::to_string_pretty(&log.serialized()?)?;
    std::fs::write(path, data).with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    Ok(())
}

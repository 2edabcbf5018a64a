//! Example of short-poll and long-poll clients sharing one latest value.
//!
//! This example shows how to:
//! - Load settings with environment overrides
//! - Publish "Update #n" on a cadence
//! - Answer short polls and long polls the way an HTTP handler would
//!
//! Run with: POLL_UPDATE_INTERVAL_MS=1000 cargo run --example long_poll

use hotswap_poll::prelude::*;
use hotswap_poll::settings::{DEFAULT_ENV_PREFIX, DEFAULT_ENV_SEPARATOR};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (latest, settings) = LatestValue::<String>::builder()
        .with_env_overrides(DEFAULT_ENV_PREFIX, DEFAULT_ENV_SEPARATOR)
        .build()?;

    println!("=== Long Poll Example ===\n");
    println!("Updates every {:?}", settings.update_interval());
    println!("Long polls wait up to {:?}\n", settings.long_poll_timeout());

    let updater = latest
        .updater(SequenceSource::new(settings.label_prefix.clone()))
        .spawn(settings.update_interval());

    // Short poll: answers immediately, usually with nothing new
    let short = latest.peek(parse_baseline(Some("0")));
    println!("shortpoll?lastSeenId=0 -> {}", PollResponse::from_result(short.as_deref()).to_json()?);

    // Long poll clients, each tracking the last version it saw
    let mut clients = Vec::new();
    for client in 0..3 {
        let latest = latest.clone();
        let timeout = settings.resolve_timeout(None);
        clients.push(tokio::spawn(async move {
            let mut last_seen = 0;
            for _ in 0..3 {
                let result = latest.await_newer(last_seen, timeout).await;
                let body = PollResponse::from_result(result.as_deref()).to_json()?;
                println!("[client {client}] longpoll?lastSeenId={last_seen} -> {body}");
                if let Some(value) = result {
                    last_seen = value.version;
                }
            }
            Ok::<_, PollError>(())
        }));
    }

    for client in clients {
        client
            .await
            .map_err(|e| PollError::Other(format!("client task failed: {}", e)))??;
    }

    // A caller that is already up to date gets "no update" from a short poll
    let current = latest.store().version().to_string();
    let short = latest.peek(parse_baseline(Some(&current)));
    println!(
        "\nshortpoll?lastSeenId={current} -> {}",
        PollResponse::from_result(short.as_deref()).to_json()?
    );

    updater.shutdown().await;
    println!("\n=== Example Complete ===");
    Ok(())
}

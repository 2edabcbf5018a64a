//! Example publishing a file's contents as new versions.
//!
//! Edit the printed file while the example runs; every save becomes a new
//! version delivered to the waiting long poll.
//!
//! Run with: cargo run --example file_feed

use hotswap_poll::prelude::*;
use hotswap_poll::updater::{FileSource, FileWatcher};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::temp_dir().join("hotswap-poll-feed.txt");
    std::fs::write(&path, "initial contents")?;

    let latest: LatestValue = LatestValue::default();
    let (watcher, triggers) = FileWatcher::new(&path, Duration::from_millis(200))?;
    let updater = latest
        .updater(FileSource::new(watcher.path()))
        .spawn_triggered(triggers);

    println!("=== File Feed Example ===\n");
    println!("Watching {}", watcher.path().display());

    // Simulate two saves so the example finishes on its own
    let writer_path = path.clone();
    tokio::spawn(async move {
        for (i, text) in ["first edit", "second edit"].into_iter().enumerate() {
            tokio::time::sleep(Duration::from_millis(500 * (i as u64 + 1))).await;
            let _ = std::fs::write(&writer_path, text);
        }
    });

    let mut last_seen = 0;
    for _ in 0..2 {
        let result = latest.await_newer(last_seen, Duration::from_secs(10)).await;
        println!("{}", PollResponse::from_result(result.as_deref()).to_json()?);
        match result {
            Some(value) => last_seen = value.version,
            None => println!("no change within 10s"),
        }
    }

    drop(watcher);
    updater.shutdown().await;
    println!("\n=== Example Complete ===");
    Ok(())
}

//! Walks through cache hits, a rate-limited remote and the throttle stall
//! without touching the network, then prints the recorded metrics.
//!
//! Run:
//!   cargo run --example offline

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use stashbox::{Operation, Remote, RemoteError};
use stashbox_configuration::StashConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stashbox=debug")),
        )
        .init();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    metrics::set_global_recorder(recorder).map_err(|_| "metrics recorder already installed")?;

    let mut config = StashConfig::new("forecast");
    config.ttl = Duration::from_secs(30);
    config.throttle.default_backoff = Duration::from_millis(500);
    config.throttle.poll_interval = Duration::from_millis(100);
    let fetcher = config.into_fetcher()?;

    // The first call is rejected, every later one succeeds.
    let calls = Arc::new(AtomicUsize::new(0));
    let remote = |calls: Arc<AtomicUsize>| async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(RemoteError::rate_limited(None)),
            n => Ok(Remote::new(format!("sunny, call #{n}"))),
        }
    };

    let first = fetcher
        .fetch::<String, _, _>("berlin", Operation::Read, || remote(calls.clone()))
        .await;
    info!(?first, "first fetch");

    let second: String = fetcher
        .fetch("berlin", Operation::Read, || remote(calls.clone()))
        .await?;
    info!(%second, "second fetch waited out the throttle");

    let third: String = fetcher
        .fetch("berlin", Operation::Read, || remote(calls.clone()))
        .await?;
    info!(%third, "third fetch served from cache");

    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let value = match value {
            DebugValue::Counter(v) => v.to_string(),
            DebugValue::Gauge(v) => v.to_string(),
            DebugValue::Histogram(samples) => format!("{} samples", samples.len()),
        };
        println!("{} = {}", key.key().name(), value);
    }

    Ok(())
}

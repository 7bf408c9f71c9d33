//! Caches GitHub repository metadata and honours its rate limits.
//!
//! Run:
//!   RUST_LOG=stashbox=debug cargo run --example github
//!
//! The first lookup goes to the API, the second is served from the file
//! cache under `./target/stashbox-demo`. When GitHub answers 429 the
//! throttler is armed and the error says how long to wait.

use serde::{Deserialize, Serialize};
use stashbox::{FetchError, Operation};
use stashbox_configuration::StashConfig;
use stashbox_reqwest::RemoteRequest;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct Repo {
    full_name: String,
    stargazers_count: u64,
    open_issues_count: u64,
}

const CONFIG: &str = r#"
namespace: github-repos
ttl: 10m
storage:
  type: File
  path: ./target/stashbox-demo
throttle:
  default_backoff: 5m
  poll_interval: 1s
fetch:
  single_flight: true
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stashbox=debug")),
        )
        .init();

    let config = StashConfig::from_yaml(CONFIG)?;
    let fetcher = config.into_fetcher()?;
    let client = reqwest::Client::new();

    for attempt in 1..=2 {
        let result = fetcher
            .fetch("rust-lang/cargo", Operation::Read, || {
                client
                    .get("https://api.github.com/repos/rust-lang/cargo")
                    .header("User-Agent", "stashbox-demo/0.1")
                    .send_json::<Repo>()
            })
            .await;

        match result {
            Ok(repo) => info!(
                attempt,
                name = %repo.full_name,
                stars = repo.stargazers_count,
                issues = repo.open_issues_count,
                "repository loaded"
            ),
            Err(error @ FetchError::RateLimited { .. }) => {
                info!(attempt, %error, "rate limited, try again later");
                break;
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}

//! Keep-alive ping loop
//!
//! Free hosting tiers put idle instances to sleep; a periodic GET against
//! the instance's own public URL keeps it awake. Fully decoupled from the
//! editing logic: no shared state, nothing to synchronize.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Time between pings
const PING_INTERVAL: Duration = Duration::from_secs(600);

/// Per-request timeout
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawn the background ping loop against `url`
pub fn spawn(url: String) -> JoinHandle<()> {
    info!("Keep-alive started (ping every {:?})", PING_INTERVAL);
    tokio::spawn(ping_loop(url))
}

async fn ping_loop(url: String) {
    let client = match reqwest::Client::builder().timeout(PING_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Keep-alive disabled, HTTP client build failed: {}", e);
            return;
        }
    };

    let mut interval = tokio::time::interval(PING_INTERVAL);
    loop {
        interval.tick().await;
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url = %url, "Keep-alive ping ok");
            }
            Ok(response) => {
                warn!(url = %url, status = %response.status(), "Keep-alive ping returned non-success");
            }
            Err(e) => {
                error!(url = %url, "Keep-alive ping failed: {}", e);
            }
        }
    }
}

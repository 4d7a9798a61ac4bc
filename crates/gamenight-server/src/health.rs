use std::time::Duration;

use tracing::{debug, warn};

const PING_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Pings an external uptime monitor once an hour.
pub async fn run_ping_loop(url: String) {
    let client = reqwest::Client::new();
    let mut interval = tokio::time::interval(PING_INTERVAL);

    loop {
        interval.tick().await;

        match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => debug!("Health check ping sent"),
            Err(e) => warn!("Health check ping failed: {}", e),
        }
    }
}

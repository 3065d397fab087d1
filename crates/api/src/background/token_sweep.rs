//! Periodic removal of expired refresh tokens.
//!
//! Rows past their `expires` instant can never be consumed, so they are only
//! clutter. This job deletes them on a fixed `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::authority::SessionAuthority;

/// Run the sweep loop until `cancel` is triggered.
///
/// The first sweep happens immediately. Failures are logged by the authority
/// and the loop keeps going.
pub async fn run(authority: Arc<SessionAuthority>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Token sweep job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                authority.sweep_expired().await;
            }
        }
    }
}

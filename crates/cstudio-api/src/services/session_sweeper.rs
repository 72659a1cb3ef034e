//! Background service that expires idle sessions.
//!
//! Expiring a session cancels its token, which stops any batch or video
//! run still working for it.

use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::session::SessionStore;

/// Interval between sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Idle session sweeper.
pub struct SessionSweeper {
    sessions: SessionStore,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions,
            interval: SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` fires.
    ///
    /// This function should be spawned as a background task.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Starting session sweeper (interval: {:?}, ttl: {:?})",
            self.interval,
            self.sessions.ttl()
        );

        let mut ticker = interval(self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let removed = self.sessions.sweep_expired().await;
                    if removed > 0 {
                        let remaining = self.sessions.len().await;
                        info!(removed, remaining, "Expired idle sessions");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_expires_and_stops() {
        let store = SessionStore::new(Duration::ZERO);
        let session = store.create().await;
        let shutdown = CancellationToken::new();

        let sweeper = SessionSweeper::new(store.clone()).with_interval(Duration::from_secs(1));
        let task = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { sweeper.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.is_empty().await);
        assert!(session.cancel.is_cancelled());

        shutdown.cancel();
        task.await.unwrap();
    }
}

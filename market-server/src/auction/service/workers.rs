use {
    super::Service,
    std::time::Duration,
    tokio::time::MissedTickBehavior,
    tokio_util::{
        sync::CancellationToken,
        task::TaskTracker,
    },
};

/// Periodically concludes auctions whose end time has passed.
pub struct ExpirationWorker {
    service:  Service,
    interval: Duration,
}

/// Stops the worker it was returned for.
#[derive(Debug, Clone)]
pub struct ExpirationWorkerHandle {
    shutdown: CancellationToken,
}

impl ExpirationWorkerHandle {
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl ExpirationWorker {
    pub fn new(service: Service, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawns the sweep loop on the tracker. The first sweep runs right away.
    ///
    /// The loop ends when either the returned handle or `shutdown` is cancelled.
    pub fn start(self, tracker: &TaskTracker, shutdown: CancellationToken) -> ExpirationWorkerHandle {
        let handle = ExpirationWorkerHandle {
            shutdown: shutdown.child_token(),
        };
        let stop = handle.shutdown.clone();
        tracker.spawn(async move { self.run(stop).await });
        handle
    }

    async fn run(self, stop: CancellationToken) {
        tracing::info!(interval = ?self.interval, "Starting expiration sweep...");
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = self.service.sweep_expired_auctions().await {
                        tracing::error!(error = ?err, "Expiration sweep failed");
                    }
                }
            }
        }
        tracing::info!("Shutting down expiration sweep...");
    }
}

use dnsroute_application::use_cases::ReloadRoutesUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 5;

/// Polls the route source and swaps in a new rule set when it changes.
///
/// A failed reload keeps the rules that are already active.
pub struct RouteReloadJob {
    reload: Arc<ReloadRoutesUseCase>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl RouteReloadJob {
    pub fn new(reload: Arc<ReloadRoutesUseCase>) -> Self {
        Self {
            reload,
            interval_secs: DEFAULT_RELOAD_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval_secs,
            "Starting route reload job"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        interval.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("RouteReloadJob: shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.reload.reload_if_changed().await {
                        Ok(Some(count)) => {
                            info!(rules = count, "RouteReloadJob: routes refreshed");
                        }
                        Ok(None) => {
                            debug!("RouteReloadJob: no changes");
                        }
                        Err(e) => {
                            error!(error = %e, "RouteReloadJob: reload failed, keeping active routes");
                        }
                    }
                }
            }
        }
    }
}

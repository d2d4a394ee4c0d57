use crate::ports::RouteSource;
use crate::routing::{RouteTable, RuleSet};
use dnsroute_domain::DomainError;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Loads rules from a [`RouteSource`] and installs them atomically.
///
/// A load or compile failure leaves the active rule set in place.
pub struct ReloadRoutesUseCase {
    source: Arc<dyn RouteSource>,
    routes: Arc<RouteTable>,
    last_loaded: Mutex<Option<SystemTime>>,
}

impl ReloadRoutesUseCase {
    pub fn new(source: Arc<dyn RouteSource>, routes: Arc<RouteTable>) -> Self {
        Self {
            source,
            routes,
            last_loaded: Mutex::new(None),
        }
    }

    /// Unconditional reload. Returns the number of active rules.
    pub async fn execute(&self) -> Result<usize, DomainError> {
        let mut last_loaded = self.last_loaded.lock().await;
        let modified = self.source.last_modified().await;
        let count = self.load_and_swap().await?;
        *last_loaded = modified;
        Ok(count)
    }

    /// Reloads only when the source reports a modification time different
    /// from the one seen at the last successful load. Sources without a
    /// modification time are always reloaded.
    pub async fn reload_if_changed(&self) -> Result<Option<usize>, DomainError> {
        let mut last_loaded = self.last_loaded.lock().await;
        let modified = self.source.last_modified().await;

        if modified.is_some() && modified == *last_loaded {
            debug!(source = %self.source.describe(), "Routes unchanged");
            return Ok(None);
        }

        let count = self.load_and_swap().await?;
        *last_loaded = modified;
        Ok(Some(count))
    }

    async fn load_and_swap(&self) -> Result<usize, DomainError> {
        let rules = self.source.load().await?;
        let compiled = RuleSet::compile(&rules)?;
        let count = compiled.len();
        let previous = self.routes.replace(compiled);

        info!(
            source = %self.source.describe(),
            rules = count,
            previous = previous.len(),
            "Routes loaded"
        );

        Ok(count)
    }
}

use dnsroute_application::ports::RouteSource;
use dnsroute_application::routing::RouteTable;
use dnsroute_application::use_cases::ReloadRoutesUseCase;
use dnsroute_domain::config::RoutesConfig;
use dnsroute_infrastructure::routes::{FileRouteSource, InlineRouteSource};
use dnsroute_jobs::RouteReloadJob;
use std::sync::Arc;
use tracing::info;

pub struct RouteServices {
    pub routes: Arc<RouteTable>,
    pub reload: Arc<ReloadRoutesUseCase>,
    reload_interval_secs: Option<u64>,
}

impl RouteServices {
    /// Builds the route source and performs the initial load. A rule file
    /// that cannot be loaded at startup is fatal.
    pub async fn new(config: &RoutesConfig) -> anyhow::Result<Self> {
        let (source, reload_interval_secs): (Arc<dyn RouteSource>, _) = match &config.file {
            Some(file) => {
                let source = FileRouteSource::new(file)?.with_inline_rules(config.rules.clone());
                let interval = (config.reload_interval_secs > 0).then_some(config.reload_interval_secs);
                (Arc::new(source), interval)
            }
            None => (Arc::new(InlineRouteSource::new(config.rules.clone())), None),
        };

        let routes = Arc::new(RouteTable::empty());
        let reload = Arc::new(ReloadRoutesUseCase::new(source, Arc::clone(&routes)));
        let count = reload.execute().await?;

        info!(rules = count, "Routing rules ready");

        Ok(Self {
            routes,
            reload,
            reload_interval_secs,
        })
    }

    /// The polling job, when the rules come from a file and polling is on.
    pub fn reload_job(&self) -> Option<RouteReloadJob> {
        self.reload_interval_secs
            .map(|secs| RouteReloadJob::new(Arc::clone(&self.reload)).with_interval(secs))
    }
}

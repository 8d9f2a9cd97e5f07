use routegate_core::{LoadError, RouteLoader, RoutePath};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Stand-in for fetching a route's code: sleeps, then succeeds unless the
/// path was marked failing
#[derive(Debug, Default)]
pub(crate) struct SimulatedLoader {
    delay: Duration,
    failing: HashSet<RoutePath>,
}

impl SimulatedLoader {
    pub(crate) fn new(delay: Duration, failing: &[String]) -> Arc<Self> {
        Arc::new(Self {
            delay,
            failing: failing.iter().map(RoutePath::new).collect(),
        })
    }
}

#[async_trait::async_trait]
impl RouteLoader for SimulatedLoader {
    async fn load(&self, path: &RoutePath) -> Result<(), LoadError> {
        tracing::debug!(route = %path, delay = ?self.delay, "fetching route module");
        tokio::time::sleep(self.delay).await;
        if self.failing.contains(path) {
            return Err(LoadError::new("simulated network failure"));
        }
        Ok(())
    }
}

//! Navigation prefetch trigger
//!
//! After a navigation renders, warms the entered route's declared prefetch
//! targets at idle time. Never loads immediately and never fails the
//! navigation: unknown routes are logged as configuration errors and
//! skipped.

use crate::registry::RouteRegistry;
use crate::scheduler::{IdleTicket, PrefetchScheduler, DEFAULT_IDLE_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;

/// Warms prefetch targets of entered routes
#[derive(Debug, Clone)]
pub struct NavigationPrefetcher {
    registry: Arc<RouteRegistry>,
    scheduler: PrefetchScheduler,
    idle_timeout: Duration,
}

impl NavigationPrefetcher {
    /// Create trigger over the scheduler's registry
    #[must_use]
    pub fn new(scheduler: PrefetchScheduler) -> Self {
        Self {
            registry: Arc::clone(scheduler.registry()),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            scheduler,
        }
    }

    /// With idle timeout hint
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Underlying scheduler
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &PrefetchScheduler {
        &self.scheduler
    }

    /// Schedule idle prefetches for the route just entered
    ///
    /// Returns one ticket per valid target, in declaration order.
    pub fn on_navigated(&self, path: &str) -> Vec<IdleTicket> {
        let route = match self.registry.lookup(path) {
            Ok(route) => route,
            Err(error) => {
                tracing::warn!(kind = "config", route = path, "{error}");
                return Vec::new();
            }
        };

        route
            .prefetch_targets
            .iter()
            .filter_map(|target| {
                if !self.registry.contains(target.as_str()) {
                    tracing::warn!(
                        kind = "config",
                        route = path,
                        target = %target,
                        "prefetch target is not registered, skipping"
                    );
                    return None;
                }
                Some(self.scheduler.trigger_when_idle(target.as_str(), self.idle_timeout))
            })
            .collect()
    }
}

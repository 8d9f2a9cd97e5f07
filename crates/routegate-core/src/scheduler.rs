//! Prefetch scheduler
//!
//! Decides when a route's loader runs and deduplicates repeated requests:
//! - [`PrefetchScheduler::trigger_immediate`] loads right away
//! - [`PrefetchScheduler::trigger_when_idle`] defers the load to idle time
//! - [`PrefetchScheduler::trigger_many`] fans out over several routes
//!
//! # Dedup
//!
//! The ledger is read synchronously before the first suspension point of
//! every request, and consulted again when an idle wait ends. Two requests
//! that both observe "not completed" before either load resolves may both
//! invoke the loader; only one of them inserts into the ledger. After the
//! first successful load no further loader invocation happens for the path.
//!
//! # Failure containment
//!
//! Loader failures and panics are converted into [`PrefetchError`] at this
//! boundary. Failed paths are not recorded and stay retryable.

use crate::error::PrefetchError;
use crate::idle::{IdleScheduler, IdleWake};
use crate::ledger::PrefetchLedger;
use crate::registry::{RouteLoader, RouteRegistry};
use crate::types::{PrefetchMode, RoutePath};
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default timeout hint for idle-deferred prefetches
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Successful prefetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Loader ran and succeeded
    Loaded,
    /// Ledger already held the path; loader not invoked
    AlreadyCompleted,
}

/// Settled results of a batch prefetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Paths whose loader ran and succeeded
    pub loaded: Vec<RoutePath>,
    /// Paths already completed before the batch
    pub skipped: Vec<RoutePath>,
    /// Failed attempts
    pub failed: Vec<PrefetchError>,
}

impl PrefetchReport {
    /// Check if no attempt failed
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of attempts
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.loaded.len() + self.skipped.len() + self.failed.len()
    }

    fn record(&mut self, path: RoutePath, result: Result<PrefetchOutcome, PrefetchError>) {
        match result {
            Ok(PrefetchOutcome::Loaded) => self.loaded.push(path),
            Ok(PrefetchOutcome::AlreadyCompleted) => self.skipped.push(path),
            Err(error) => self.failed.push(error),
        }
    }
}

/// Handle to an idle-deferred prefetch
///
/// Dropping the ticket does not cancel the load.
#[derive(Debug)]
pub struct IdleTicket {
    state: TicketState,
}

#[derive(Debug)]
enum TicketState {
    Settled(bool),
    Pending(JoinHandle<bool>),
}

impl IdleTicket {
    fn done(completed: bool) -> Self {
        Self {
            state: TicketState::Settled(completed),
        }
    }

    fn pending(handle: JoinHandle<bool>) -> Self {
        Self {
            state: TicketState::Pending(handle),
        }
    }

    /// Check if a background load was scheduled by this call
    #[inline]
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, TicketState::Pending(_))
    }

    /// Wait for the background load
    ///
    /// Returns `true` if the path is completed when the attempt settles.
    pub async fn settled(self) -> bool {
        match self.state {
            TicketState::Settled(completed) => completed,
            TicketState::Pending(handle) => handle.await.unwrap_or(false),
        }
    }
}

/// Deduplicating prefetch scheduler
///
/// Cheap to clone; clones share the registry, ledger and idle capability.
#[derive(Debug, Clone)]
pub struct PrefetchScheduler {
    registry: Arc<RouteRegistry>,
    ledger: Arc<PrefetchLedger>,
    idle: Arc<dyn IdleScheduler>,
    idle_timeout: Duration,
}

impl PrefetchScheduler {
    /// Create scheduler with its own empty ledger
    #[must_use]
    pub fn new(
        registry: impl Into<Arc<RouteRegistry>>,
        idle: impl Into<Arc<dyn IdleScheduler>>,
    ) -> Self {
        Self {
            registry: registry.into(),
            ledger: Arc::new(PrefetchLedger::new()),
            idle: idle.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// With idle timeout hint used by batch idle prefetches
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Route registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Idle timeout hint used by batch idle prefetches
    #[inline]
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Load a route now
    ///
    /// No-op returning `AlreadyCompleted` if the path is in the ledger.
    ///
    /// # Errors
    /// - `PrefetchError::UnknownRoute` if the path is not registered
    /// - `PrefetchError::LoadFailed` / `LoaderPanicked` if loading fails;
    ///   the path stays retryable
    pub async fn trigger_immediate(&self, path: &str) -> Result<PrefetchOutcome, PrefetchError> {
        self.prefetch(path, PrefetchMode::Immediate).await
    }

    /// Load a route once the host is idle, bounded by `timeout`
    ///
    /// Issues exactly one background load per call unless the path is
    /// already completed or unknown. Failures are logged, never returned.
    /// Outside a tokio runtime nothing is scheduled.
    pub fn trigger_when_idle(&self, path: &str, timeout: Duration) -> IdleTicket {
        if self.ledger.contains(path) {
            tracing::debug!(route = path, "idle prefetch skipped, already completed");
            return IdleTicket::done(true);
        }
        let Ok((route, loader)) = self.resolve(path) else {
            return IdleTicket::done(false);
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(route = path, "no async runtime, idle prefetch dropped");
            return IdleTicket::done(false);
        };

        tracing::debug!(route = path, ?timeout, "idle prefetch scheduled");
        let scheduler = self.clone();
        IdleTicket::pending(runtime.spawn(async move {
            scheduler
                .load_when_idle(route, loader, timeout)
                .await
                .is_ok()
        }))
    }

    /// Prefetch several routes concurrently
    ///
    /// Attempts run without relative ordering and the report is returned
    /// once every attempt has settled.
    pub async fn trigger_many<I, P>(&self, paths: I, mode: PrefetchMode) -> PrefetchReport
    where
        I: IntoIterator<Item = P>,
        P: Into<RoutePath>,
    {
        let attempts = paths.into_iter().map(|path| {
            let path: RoutePath = path.into();
            async move {
                let result = self.prefetch(path.as_str(), mode).await;
                (path, result)
            }
        });

        let mut report = PrefetchReport::default();
        for (path, result) in join_all(attempts).await {
            report.record(path, result);
        }
        tracing::debug!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch prefetch settled"
        );
        report
    }

    /// Prefetch every registered route
    ///
    /// Startup and tooling only.
    pub async fn warm_all(&self, mode: PrefetchMode) -> PrefetchReport {
        let paths = self.registry.paths();
        tracing::info!(routes = paths.len(), ?mode, "warming all routes");
        self.trigger_many(paths, mode).await
    }

    /// Check if path has completed
    #[inline]
    #[must_use]
    pub fn is_completed(&self, path: &str) -> bool {
        self.ledger.contains(path)
    }

    /// Completed paths, sorted
    #[inline]
    #[must_use]
    pub fn completed(&self) -> Vec<RoutePath> {
        self.ledger.snapshot()
    }

    /// Clear the ledger
    ///
    /// Test isolation only.
    #[inline]
    pub fn reset(&self) {
        self.ledger.clear();
    }

    async fn prefetch(
        &self,
        path: &str,
        mode: PrefetchMode,
    ) -> Result<PrefetchOutcome, PrefetchError> {
        if self.ledger.contains(path) {
            tracing::debug!(route = path, "prefetch skipped, already completed");
            return Ok(PrefetchOutcome::AlreadyCompleted);
        }
        let (route, loader) = self.resolve(path)?;

        match mode {
            PrefetchMode::Immediate => {
                let result = self.load(route, loader).await;
                if let Err(error) = &result {
                    tracing::error!(route = path, %error, "prefetch failed");
                }
                result
            }
            PrefetchMode::Idle => self.load_when_idle(route, loader, self.idle_timeout).await,
        }
    }

    async fn load_when_idle(
        &self,
        route: RoutePath,
        loader: Arc<dyn RouteLoader>,
        timeout: Duration,
    ) -> Result<PrefetchOutcome, PrefetchError> {
        let wake = self.idle.wait_idle(timeout).await;
        if wake == IdleWake::TimedOut {
            tracing::debug!(route = %route, "idle hint elapsed, loading anyway");
        }
        if self.ledger.contains(route.as_str()) {
            return Ok(PrefetchOutcome::AlreadyCompleted);
        }

        let result = self.load(route, loader).await;
        if let Err(error) = &result {
            tracing::warn!(route = %error.path(), %error, "idle prefetch failed");
        }
        result
    }

    async fn load(
        &self,
        route: RoutePath,
        loader: Arc<dyn RouteLoader>,
    ) -> Result<PrefetchOutcome, PrefetchError> {
        let attempt = AssertUnwindSafe(loader.load(&route)).catch_unwind().await;

        match attempt {
            Ok(Ok(())) => {
                if self.ledger.mark_completed(route.clone()) {
                    tracing::info!(route = %route, "route prefetched");
                }
                Ok(PrefetchOutcome::Loaded)
            }
            Ok(Err(source)) => Err(PrefetchError::load_failed(route, source)),
            Err(_) => Err(PrefetchError::LoaderPanicked { path: route }),
        }
    }

    fn resolve(&self, path: &str) -> Result<(RoutePath, Arc<dyn RouteLoader>), PrefetchError> {
        match self.registry.lookup(path) {
            Ok(descriptor) => Ok((descriptor.path.clone(), Arc::clone(&descriptor.loader))),
            Err(error) => {
                tracing::warn!(kind = "config", route = path, "{error}");
                Err(PrefetchError::UnknownRoute(RoutePath::new(path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::idle::{IdleStrategy, FALLBACK_DELAY};
    use crate::registry::{FnLoader, RegistryBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn counting(calls: &Arc<AtomicUsize>) -> Arc<dyn RouteLoader> {
        let calls = Arc::clone(calls);
        FnLoader::shared(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    /// Fails the first `failures` calls, then succeeds
    fn flaky(calls: &Arc<AtomicUsize>, failures: usize) -> Arc<dyn RouteLoader> {
        let calls = Arc::clone(calls);
        FnLoader::shared(move || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    Err(LoadError::new("chunk request failed"))
                } else {
                    Ok(())
                }
            }
        })
    }

    struct PanickingLoader;

    #[async_trait::async_trait]
    impl RouteLoader for PanickingLoader {
        async fn load(&self, _path: &RoutePath) -> Result<(), LoadError> {
            panic!("module evaluation crashed")
        }
    }

    fn scheduler(builder: RegistryBuilder) -> PrefetchScheduler {
        PrefetchScheduler::new(builder.build().unwrap(), IdleStrategy::fallback())
    }

    #[tokio::test]
    async fn immediate_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));

        assert_eq!(scheduler.trigger_immediate("/").await, Ok(PrefetchOutcome::Loaded));
        assert_eq!(
            scheduler.trigger_immediate("/").await,
            Ok(PrefetchOutcome::AlreadyCompleted)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_completed("/"));
    }

    #[tokio::test]
    async fn immediate_failure_stays_retryable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", flaky(&calls, 1)));

        let err = scheduler.trigger_immediate("/").await.unwrap_err();
        assert!(matches!(err, PrefetchError::LoadFailed { .. }));
        assert!(!scheduler.is_completed("/"));

        assert_eq!(scheduler.trigger_immediate("/").await, Ok(PrefetchOutcome::Loaded));
        assert!(scheduler.is_completed("/"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn immediate_unknown_route() {
        let scheduler = scheduler(RegistryBuilder::new());

        let err = scheduler.trigger_immediate("/nowhere").await.unwrap_err();
        assert_eq!(err, PrefetchError::UnknownRoute(RoutePath::new("/nowhere")));
        assert!(scheduler.completed().is_empty());
    }

    #[tokio::test]
    async fn loader_panic_is_contained() {
        let scheduler = scheduler(RegistryBuilder::new().route("/", Arc::new(PanickingLoader)));

        let err = scheduler.trigger_immediate("/").await.unwrap_err();
        assert_eq!(err, PrefetchError::LoaderPanicked { path: RoutePath::new("/") });
        assert!(err.is_retryable());
        assert!(!scheduler.is_completed("/"));
    }

    #[tokio::test(start_paused = true)]
    async fn when_idle_defers_by_fallback_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));

        let start = Instant::now();
        let ticket = scheduler.trigger_when_idle("/", DEFAULT_IDLE_TIMEOUT);
        assert!(ticket.is_scheduled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(ticket.settled().await);
        assert!(start.elapsed() >= FALLBACK_DELAY);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_completed("/"));
    }

    #[tokio::test(start_paused = true)]
    async fn when_idle_skips_completed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));
        scheduler.trigger_immediate("/").await.unwrap();

        let ticket = scheduler.trigger_when_idle("/", DEFAULT_IDLE_TIMEOUT);
        assert!(!ticket.is_scheduled());
        assert!(ticket.settled().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn when_idle_failure_is_swallowed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", flaky(&calls, 1)));

        assert!(!scheduler.trigger_when_idle("/", DEFAULT_IDLE_TIMEOUT).settled().await);
        assert!(!scheduler.is_completed("/"));

        assert!(scheduler.trigger_when_idle("/", DEFAULT_IDLE_TIMEOUT).settled().await);
        assert!(scheduler.is_completed("/"));
    }

    #[tokio::test]
    async fn when_idle_unknown_route_is_not_scheduled() {
        let scheduler = scheduler(RegistryBuilder::new());
        let ticket = scheduler.trigger_when_idle("/nowhere", DEFAULT_IDLE_TIMEOUT);
        assert!(!ticket.is_scheduled());
        assert!(!ticket.settled().await);
    }

    #[test]
    fn when_idle_outside_runtime_is_not_scheduled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));
        let ticket = scheduler.trigger_when_idle("/", DEFAULT_IDLE_TIMEOUT);
        assert!(!ticket.is_scheduled());
    }

    #[tokio::test]
    async fn trigger_many_reports_each_attempt() {
        let ok = Arc::new(AtomicUsize::new(0));
        let bad = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            RegistryBuilder::new()
                .route("/a", counting(&ok))
                .route("/b", counting(&ok))
                .route("/broken", flaky(&bad, usize::MAX)),
        );
        scheduler.trigger_immediate("/b").await.unwrap();

        let report = scheduler
            .trigger_many(["/a", "/b", "/broken", "/missing"], PrefetchMode::Immediate)
            .await;

        assert_eq!(report.loaded, vec![RoutePath::new("/a")]);
        assert_eq!(report.skipped, vec![RoutePath::new("/b")]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().any(PrefetchError::is_configuration));
        assert!(!report.is_clean());
        assert_eq!(report.total(), 4);
        assert_eq!(scheduler.completed(), vec![RoutePath::new("/a"), RoutePath::new("/b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_many_idle_waits_for_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            RegistryBuilder::new()
                .route("/a", counting(&calls))
                .route("/b", counting(&calls)),
        );

        let start = Instant::now();
        let report = scheduler.trigger_many(["/a", "/b"], PrefetchMode::Idle).await;
        assert!(start.elapsed() >= FALLBACK_DELAY);
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn warm_all_loads_every_route() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            RegistryBuilder::new()
                .route("/login", counting(&calls))
                .route("/", counting(&calls)),
        );

        let report = scheduler.warm_all(PrefetchMode::Immediate).await;
        assert_eq!(report.loaded.len(), 2);
        assert!(scheduler.is_completed("/login"));
        assert!(scheduler.is_completed("/"));
    }

    #[tokio::test]
    async fn reset_clears_ledger() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));
        scheduler.trigger_immediate("/").await.unwrap();

        scheduler.reset();
        assert!(!scheduler.is_completed("/"));

        scheduler.trigger_immediate("/").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clones_share_ledger() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(RegistryBuilder::new().route("/", counting(&calls)));
        let clone = scheduler.clone();

        clone.trigger_immediate("/").await.unwrap();
        assert!(scheduler.is_completed("/"));
    }

    #[tokio::test]
    async fn separate_schedulers_are_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = scheduler(RegistryBuilder::new().route("/", counting(&calls)));
        let second = scheduler(RegistryBuilder::new().route("/", counting(&calls)));

        first.trigger_immediate("/").await.unwrap();
        assert!(!second.is_completed("/"));
    }
}

//! Router orchestration
//!
//! Ties one navigation together:
//! 1. Resolve the target in the registry (unknown target is a configuration error)
//! 2. Snapshot the session and ask the [`AuthGate`]
//! 3. On redirect, invoke the host [`Navigator`] with the redirect options
//! 4. On allow, hand the entered route to the [`NavigationPrefetcher`]
//!
//! The gate decision is fully resolved before any prefetch is issued, and
//! prefetching never affects the outcome of the navigation.

use crate::config::NavConfig;
use crate::gate::{AuthGate, GateDecision, Redirect};
use crate::idle::IdleStrategy;
use crate::registry::RouteRegistry;
use crate::scheduler::{IdleTicket, PrefetchScheduler};
use crate::session::SessionState;
use crate::trigger::NavigationPrefetcher;
use crate::types::{NavState, NavigateOptions, NavigationIntent, RoutePath};
use std::sync::Arc;

/// Imperative navigation side effect provided by the host
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Move to `path`
    fn navigate(&self, path: &RoutePath, options: &NavigateOptions);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn navigate(&self, path: &RoutePath, options: &NavigateOptions) {
        (**self).navigate(path, options);
    }
}

/// Result of one navigation attempt
#[derive(Debug)]
pub enum NavigationOutcome {
    /// Target may render; prefetches were scheduled for its targets
    Rendered {
        /// Entered route
        path: RoutePath,
        /// Idle prefetches issued on entry
        prefetches: Vec<IdleTicket>,
    },
    /// Target requires login; the navigator was sent to the login route
    Redirected(Redirect),
    /// Target is not registered
    NotFound(RoutePath),
}

impl NavigationOutcome {
    /// Check if the target renders
    #[inline]
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    /// Redirect instruction, if any
    #[inline]
    #[must_use]
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Redirected(redirect) => Some(redirect),
            _ => None,
        }
    }
}

/// Navigation router
#[derive(Debug)]
pub struct Router<S, N> {
    registry: Arc<RouteRegistry>,
    gate: AuthGate,
    prefetcher: NavigationPrefetcher,
    session: S,
    navigator: N,
}

impl<S: SessionState, N: Navigator> Router<S, N> {
    /// Create router
    #[must_use]
    pub fn new(prefetcher: NavigationPrefetcher, gate: AuthGate, session: S, navigator: N) -> Self {
        Self {
            registry: Arc::clone(prefetcher.scheduler().registry()),
            gate,
            prefetcher,
            session,
            navigator,
        }
    }

    /// Wire a router from configuration
    ///
    /// Uses `host_idle` when the host can report idleness, the configured
    /// timer fallback otherwise. A missing or protected login route and a
    /// missing root route are logged as configuration errors.
    #[must_use]
    pub fn from_config(
        config: &NavConfig,
        registry: impl Into<Arc<RouteRegistry>>,
        host_idle: Option<crate::idle::IdleSignal>,
        session: S,
        navigator: N,
    ) -> Self {
        let registry: Arc<RouteRegistry> = registry.into();
        let gate = AuthGate::new(config.login_route(), config.root_route());
        let (login, root) = (gate.login_path().as_str(), gate.root_path().as_str());
        for issue in registry.check_auth_routes(login, root) {
            tracing::warn!(kind = "config", "{issue}");
        }

        let idle = IdleStrategy::select(host_idle, config.fallback_delay());
        let scheduler =
            PrefetchScheduler::new(registry, idle).with_idle_timeout(config.idle_timeout());
        let prefetcher =
            NavigationPrefetcher::new(scheduler).with_idle_timeout(config.idle_timeout());
        Self::new(prefetcher, gate, session, navigator)
    }

    /// Navigate to `target`
    ///
    /// `origin` is the resumption origin carried in the history state of
    /// this navigation (the `from` of a previous redirect), if any.
    pub fn navigate(&self, target: &str, origin: Option<&str>) -> NavigationOutcome {
        let route = match self.registry.lookup(target) {
            Ok(route) => route,
            Err(error) => {
                tracing::warn!(kind = "config", route = target, "{error}");
                return NavigationOutcome::NotFound(RoutePath::new(target));
            }
        };

        let intent = NavigationIntent {
            target: route.path.clone(),
            origin: origin.map(RoutePath::new),
            is_authenticated: self.session.is_authenticated(),
        };

        match self.gate.evaluate(route.requires_auth(), &intent) {
            GateDecision::Allow => {
                tracing::info!(route = target, origin = ?intent.origin, "navigation allowed");
                NavigationOutcome::Rendered {
                    prefetches: self.prefetcher.on_navigated(target),
                    path: intent.target,
                }
            }
            GateDecision::Redirect(redirect) => {
                tracing::info!(route = target, to = %redirect.to, "navigation redirected to login");
                self.navigator.navigate(&redirect.to, &redirect.options);
                NavigationOutcome::Redirected(redirect)
            }
        }
    }

    /// Resume after a successful login
    ///
    /// The caller signs the session in first. `state` is the history state
    /// the login route was entered with. Navigates (replacing the login
    /// entry) to the remembered origin, or the root route.
    pub fn complete_login(&self, state: &NavState) -> RoutePath {
        let intent = NavigationIntent::new(self.gate.login_path(), self.session.is_authenticated())
            .with_state(state);
        let target = self.gate.resume_target(&intent);
        tracing::info!(to = %target, "resuming after login");
        self.navigator.navigate(&target, &NavigateOptions::replace());
        target
    }

    /// Return to the login route after the caller signed the session out
    pub fn logout(&self) {
        self.navigator
            .navigate(self.gate.login_path(), &NavigateOptions::replace());
    }

    /// Authentication gate
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Prefetch scheduler
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &PrefetchScheduler {
        self.prefetcher.scheduler()
    }

    /// Session state
    #[inline]
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Host navigator
    #[inline]
    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}

//! Testing utilities for the routegate workspace
//!
//! Shared loaders, navigators and fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use routegate_core::{
    IdleSignal, InMemorySession, LoadError, NavConfig, NavigateOptions, RegistryBuilder,
    RouteLoader, RouteMeta, RoutePath, RouteRegistry, Router, UserInfo, UserSession,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Loader that counts invocations per path
///
/// Optionally sleeps before resolving and fails for selected paths.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    latency: Duration,
    calls: Mutex<HashMap<RoutePath, usize>>,
    failing: Mutex<HashSet<RoutePath>>,
}

impl RecordingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    /// Make loads of `path` fail until [`RecordingLoader::heal`]
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(RoutePath::new(path));
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait::async_trait]
impl RouteLoader for RecordingLoader {
    async fn load(&self, path: &RoutePath) -> Result<(), LoadError> {
        *self.calls.lock().entry(path.clone()).or_insert(0) += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.lock().contains(path) {
            return Err(LoadError::new(format!("failed to fetch chunk for {path}")));
        }
        Ok(())
    }
}

/// Navigator recording every call
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<(RoutePath, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn history(&self) -> Vec<(RoutePath, NavigateOptions)> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<(RoutePath, NavigateOptions)> {
        self.history.lock().last().cloned()
    }
}

impl routegate_core::Navigator for RecordingNavigator {
    fn navigate(&self, path: &RoutePath, options: &NavigateOptions) {
        self.history.lock().push((path.clone(), options.clone()));
    }
}

/// `/login` (public, prefetches `/`) and `/` (protected, no prefetch)
pub fn login_home_registry(loader: Arc<RecordingLoader>) -> RouteRegistry {
    RegistryBuilder::new()
        .route_with(
            "/login",
            loader.clone(),
            RouteMeta::public().with_title("Sign in"),
            ["/"],
        )
        .route_with("/", loader, RouteMeta::protected().with_title("Home"), Vec::<&str>::new())
        .build()
        .expect("fixture registry is valid")
}

pub fn admin_session() -> UserSession {
    UserSession {
        token: "mock_token_admin".to_string(),
        user: UserInfo {
            id: "1".to_string(),
            username: "admin".to_string(),
            nickname: "Administrator".to_string(),
            roles: vec!["admin".to_string()],
        },
    }
}

pub type TestRouter = Router<Arc<InMemorySession>, Arc<RecordingNavigator>>;

/// Router over `registry` with a fresh signed-out session and recording navigator
pub fn setup_router(
    registry: RouteRegistry,
    host_idle: Option<IdleSignal>,
) -> (TestRouter, Arc<InMemorySession>, Arc<RecordingNavigator>) {
    let session = Arc::new(InMemorySession::new());
    let navigator = RecordingNavigator::new();
    let router = Router::from_config(
        &NavConfig::default(),
        registry,
        host_idle,
        Arc::clone(&session),
        Arc::clone(&navigator),
    );
    (router, session, navigator)
}

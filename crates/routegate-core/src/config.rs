//! Navigation configuration
//!
//! Route table and scheduling knobs, loaded from TOML:
//!
//! ```toml
//! login_path = "/login"
//! idle_timeout_ms = 2000
//!
//! [[routes]]
//! path = "/login"
//! title = "Sign in"
//! requires_auth = false
//! prefetch = ["/"]
//!
//! [[routes]]
//! path = "/"
//! ```

use crate::error::ConfigError;
use crate::types::{RouteMeta, RoutePath};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Where unauthenticated users are redirected
    pub login_path: String,
    /// Resumption target when no origin was remembered
    pub root_path: String,
    /// Timeout hint for idle-deferred prefetches, in milliseconds
    pub idle_timeout_ms: u64,
    /// Delay used when no idle primitive is available, in milliseconds
    pub fallback_delay_ms: u64,
    /// Route table
    pub routes: Vec<RouteSpec>,
}

impl NavConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::Invalid` if validation fails
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`NavConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&source)
    }

    /// With login path
    #[inline]
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// With idle timeout hint
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With an additional route
    #[inline]
    #[must_use]
    pub fn with_route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }

    /// Idle timeout hint
    #[inline]
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Timer fallback delay
    #[inline]
    #[must_use]
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    /// Login path as route key
    #[inline]
    #[must_use]
    pub fn login_route(&self) -> RoutePath {
        RoutePath::new(&self.login_path)
    }

    /// Root path as route key
    #[inline]
    #[must_use]
    pub fn root_route(&self) -> RoutePath {
        RoutePath::new(&self.root_path)
    }

    /// Validate configuration
    ///
    /// # Errors
    /// `ConfigError::Invalid` for an empty login or root path, or an empty
    /// route path anywhere in the table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login_path.is_empty() {
            return Err(ConfigError::Invalid("login_path must not be empty".to_string()));
        }
        if self.root_path.is_empty() {
            return Err(ConfigError::Invalid("root_path must not be empty".to_string()));
        }
        check_route_paths(&self.routes)
    }
}

fn check_route_paths(routes: &[RouteSpec]) -> Result<(), ConfigError> {
    for route in routes {
        if route.path.is_empty() {
            return Err(ConfigError::Invalid("route path must not be empty".to_string()));
        }
        check_route_paths(&route.children)?;
    }
    Ok(())
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            root_path: "/".to_string(),
            idle_timeout_ms: 2000,
            fallback_delay_ms: 200,
            routes: Vec::new(),
        }
    }
}

/// One entry of the route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Route key
    pub path: String,
    /// Human readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whether the route requires authentication (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    /// Routes to warm when entered
    #[serde(default)]
    pub prefetch: Vec<String>,
    /// Nested routes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteSpec>,
}

impl RouteSpec {
    /// Create route spec
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
            requires_auth: None,
            prefetch: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Mark as public
    #[inline]
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = Some(false);
        self
    }

    /// With prefetch targets
    #[must_use]
    pub fn with_prefetch<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefetch = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Resolved metadata
    #[must_use]
    pub fn meta(&self) -> RouteMeta {
        RouteMeta {
            title: self.title.clone(),
            requires_auth: self.requires_auth.unwrap_or(true),
        }
    }
}

//! Core types shared by the registry, scheduler and gate
//!
//! Defines:
//! - Route identity ([`RoutePath`])
//! - Route metadata ([`RouteMeta`])
//! - Per-navigation snapshots ([`NavigationIntent`])
//! - Navigation side-effect options ([`NavigateOptions`], [`NavState`])

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Unique route key (the route's path)
///
/// Backed by `Arc<str>` so the same key can sit in the registry, the
/// ledger and in-flight prefetch tasks without reallocating.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath(Arc<str>);

impl RoutePath {
    /// Create a route path
    #[inline]
    #[must_use]
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref()))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for the empty path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoutePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoutePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoutePath {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&RoutePath> for RoutePath {
    fn from(value: &RoutePath) -> Self {
        value.clone()
    }
}

/// Route metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Human readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Whether rendering requires an authenticated session
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

fn default_requires_auth() -> bool {
    true
}

impl RouteMeta {
    /// Metadata for a route anyone may visit
    #[inline]
    #[must_use]
    pub fn public() -> Self {
        Self {
            title: None,
            requires_auth: false,
        }
    }

    /// Metadata for an authenticated-only route
    #[inline]
    #[must_use]
    pub fn protected() -> Self {
        Self::default()
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for RouteMeta {
    fn default() -> Self {
        Self {
            title: None,
            requires_auth: default_requires_auth(),
        }
    }
}

/// How a prefetch is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchMode {
    /// Invoke the loader right away
    Immediate,
    /// Defer the loader until the host is idle (bounded by a timeout hint)
    #[default]
    Idle,
}

/// Snapshot taken for one navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    /// Where the user asked to go
    pub target: RoutePath,
    /// Destination remembered for post-login resumption, carried in from
    /// the history state of this navigation
    pub origin: Option<RoutePath>,
    /// Session state at decision time
    pub is_authenticated: bool,
}

impl NavigationIntent {
    /// Create intent for a target
    #[inline]
    #[must_use]
    pub fn new(target: impl Into<RoutePath>, is_authenticated: bool) -> Self {
        Self {
            target: target.into(),
            origin: None,
            is_authenticated,
        }
    }

    /// With resumption origin
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<RoutePath>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// With resumption origin taken from history state
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: &NavState) -> Self {
        self.origin.clone_from(&state.from);
        self
    }
}

/// History state carried with a navigation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    /// Original destination to resume after login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<RoutePath>,
}

impl NavState {
    /// State remembering `from` as the resumption target
    #[inline]
    #[must_use]
    pub fn from_path(from: impl Into<RoutePath>) -> Self {
        Self {
            from: Some(from.into()),
        }
    }
}

/// Options for the imperative navigate side effect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// State attached to the history entry
    #[serde(default)]
    pub state: NavState,
}

impl NavigateOptions {
    /// Replace the current entry, no state
    #[inline]
    #[must_use]
    pub fn replace() -> Self {
        Self {
            replace: true,
            state: NavState::default(),
        }
    }

    /// With state
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: NavState) -> Self {
        self.state = state;
        self
    }
}

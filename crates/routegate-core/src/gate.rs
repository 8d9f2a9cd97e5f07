//! Authentication gate
//!
//! Per-navigation decision: render the target, or redirect to the login
//! route remembering the target for resumption.
//!
//! | requires_auth | authenticated | decision |
//! |---------------|---------------|----------|
//! | false         | any           | Allow    |
//! | true          | true          | Allow    |
//! | true          | false         | Redirect |
//!
//! The gate is pure and total: no I/O, no error type. A redirect writes the
//! target into the resumption state; the intent of the following
//! navigation carries it back as [`NavigationIntent::origin`]. The gate
//! does not perform the post-login navigation; callers consult
//! [`AuthGate::resume_target`].

use crate::types::{NavState, NavigateOptions, NavigationIntent, RoutePath};

/// Redirect instruction produced by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Destination (the login route)
    pub to: RoutePath,
    /// Replace semantics and resumption state
    pub options: NavigateOptions,
}

impl Redirect {
    /// Remembered origin for post-login resumption
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&RoutePath> {
        self.options.state.from.as_ref()
    }
}

/// Gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the target
    Allow,
    /// Send the user to log in first
    Redirect(Redirect),
}

impl GateDecision {
    /// Check if rendering is allowed
    #[inline]
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Authentication gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGate {
    login_path: RoutePath,
    root_path: RoutePath,
}

impl AuthGate {
    /// Create gate
    #[inline]
    #[must_use]
    pub fn new(login_path: impl Into<RoutePath>, root_path: impl Into<RoutePath>) -> Self {
        Self {
            login_path: login_path.into(),
            root_path: root_path.into(),
        }
    }

    /// Login route
    #[inline]
    #[must_use]
    pub fn login_path(&self) -> &RoutePath {
        &self.login_path
    }

    /// Default resumption target
    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &RoutePath {
        &self.root_path
    }

    /// Decide whether `intent` may render a route with `requires_auth`
    #[must_use]
    pub fn evaluate(&self, requires_auth: bool, intent: &NavigationIntent) -> GateDecision {
        if !requires_auth || intent.is_authenticated {
            return GateDecision::Allow;
        }
        GateDecision::Redirect(Redirect {
            to: self.login_path.clone(),
            options: NavigateOptions::replace().with_state(NavState::from_path(&intent.target)),
        })
    }

    /// Where to go after a successful login
    ///
    /// The intent's resumption origin, or the root route.
    #[must_use]
    pub fn resume_target(&self, intent: &NavigationIntent) -> RoutePath {
        intent
            .origin
            .clone()
            .unwrap_or_else(|| self.root_path.clone())
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new("/login", "/")
    }
}

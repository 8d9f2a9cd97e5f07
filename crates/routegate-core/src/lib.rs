//! Routegate Core
//!
//! The navigation core of a client application:
//! - **Route registry**: immutable table of lazily loadable page modules
//! - **Prefetch scheduler**: deduplicated immediate or idle-time module loads
//! - **Navigation trigger**: warms a route's declared prefetch targets on entry
//! - **Authentication gate**: render-or-redirect decision per navigation
//!
//! # Example
//!
//! ```rust,ignore
//! use routegate_core::prelude::*;
//!
//! let registry = RegistryBuilder::new()
//!     .route_with("/login", loader, RouteMeta::public(), ["/"])
//!     .route("/", loader)
//!     .build()?;
//!
//! let scheduler = PrefetchScheduler::new(registry, IdleStrategy::fallback());
//! scheduler.trigger_immediate("/").await?;
//! assert!(scheduler.is_completed("/"));
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod gate;
pub mod idle;
pub mod ledger;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod trigger;
pub mod types;

// Re-exports
pub use config::{NavConfig, RouteSpec};
pub use error::{ConfigError, LoadError, NavError, PrefetchError, RegistryError};
pub use gate::{AuthGate, GateDecision, Redirect};
pub use idle::{
    HostIdle, IdleScheduler, IdleSignal, IdleStrategy, IdleWake, TimerFallback, FALLBACK_DELAY,
};
pub use ledger::PrefetchLedger;
pub use registry::{FnLoader, RegistryBuilder, RouteDescriptor, RouteLoader, RouteRegistry};
pub use router::{NavigationOutcome, Navigator, Router};
pub use scheduler::{
    IdleTicket, PrefetchOutcome, PrefetchReport, PrefetchScheduler, DEFAULT_IDLE_TIMEOUT,
};
pub use session::{InMemorySession, SessionState, UserInfo, UserSession};
pub use trigger::NavigationPrefetcher;
pub use types::{NavState, NavigateOptions, NavigationIntent, PrefetchMode, RouteMeta, RoutePath};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring a router
    pub use crate::{
        AuthGate, GateDecision, IdleStrategy, NavConfig, NavigationIntent, NavigationOutcome,
        NavigationPrefetcher, Navigator, PrefetchMode, PrefetchScheduler, RegistryBuilder,
        RouteLoader, RouteMeta, RoutePath, RouteRegistry, Router, SessionState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

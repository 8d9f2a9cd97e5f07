//! Route registry
//!
//! Immutable table of navigable destinations. Each [`RouteDescriptor`]
//! carries the loader that materialises the route's module, its
//! metadata and the routes to warm once it is entered.
//!
//! The registry is built once at startup through [`RegistryBuilder`] and
//! never mutated afterwards.

use crate::config::{NavConfig, RouteSpec};
use crate::error::{LoadError, RegistryError};
use crate::types::{RouteMeta, RoutePath};
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Materialises a route's module
///
/// Implementations must tolerate repeated invocation: the scheduler's
/// dedup ledger is a logical layer and a narrow race may call `load`
/// more than once for the same path.
#[async_trait::async_trait]
pub trait RouteLoader: Send + Sync {
    /// Load the module behind `path`
    async fn load(&self, path: &RoutePath) -> Result<(), LoadError>;
}

/// Adapts a zero-argument async closure into a [`RouteLoader`]
pub struct FnLoader<F> {
    f: F,
}

impl<F, Fut> FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), LoadError>> + Send,
{
    /// Wrap closure
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wrap closure as a shareable loader
    #[inline]
    #[must_use]
    pub fn shared(f: F) -> Arc<dyn RouteLoader>
    where
        F: 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait::async_trait]
impl<F, Fut> RouteLoader for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), LoadError>> + Send,
{
    async fn load(&self, _path: &RoutePath) -> Result<(), LoadError> {
        (self.f)().await
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader").finish_non_exhaustive()
    }
}

/// One navigable destination
#[derive(Clone)]
pub struct RouteDescriptor {
    /// Unique route key
    pub path: RoutePath,
    /// Module loader
    pub loader: Arc<dyn RouteLoader>,
    /// Metadata (auth requirement, title)
    pub meta: RouteMeta,
    /// Routes to warm when this one is entered, in order
    pub prefetch_targets: Vec<RoutePath>,
}

impl RouteDescriptor {
    /// Create descriptor for an authenticated route without prefetch targets
    #[must_use]
    pub fn new(path: impl Into<RoutePath>, loader: Arc<dyn RouteLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
            meta: RouteMeta::default(),
            prefetch_targets: Vec::new(),
        }
    }

    /// With metadata
    #[inline]
    #[must_use]
    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    /// With prefetch targets
    #[must_use]
    pub fn with_prefetch<I, P>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<RoutePath>,
    {
        self.prefetch_targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Whether rendering requires authentication
    #[inline]
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.meta.requires_auth
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("path", &self.path)
            .field("meta", &self.meta)
            .field("prefetch_targets", &self.prefetch_targets)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RouteRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    routes: Vec<RouteDescriptor>,
}

impl RegistryBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an authenticated route without prefetch targets
    #[must_use]
    pub fn route(self, path: impl Into<RoutePath>, loader: Arc<dyn RouteLoader>) -> Self {
        self.descriptor(RouteDescriptor::new(path, loader))
    }

    /// Add a route with metadata and prefetch targets
    #[must_use]
    pub fn route_with<I, P>(
        self,
        path: impl Into<RoutePath>,
        loader: Arc<dyn RouteLoader>,
        meta: RouteMeta,
        prefetch: I,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<RoutePath>,
    {
        self.descriptor(
            RouteDescriptor::new(path, loader)
                .with_meta(meta)
                .with_prefetch(prefetch),
        )
    }

    /// Add a prepared descriptor
    #[must_use]
    pub fn descriptor(mut self, descriptor: RouteDescriptor) -> Self {
        self.routes.push(descriptor);
        self
    }

    /// Add every route of a configured route table
    ///
    /// Nested children are flattened depth-first in declaration order.
    /// `factory` supplies the loader for each path.
    #[must_use]
    pub fn from_config<F>(config: &NavConfig, mut factory: F) -> Self
    where
        F: FnMut(&RoutePath) -> Arc<dyn RouteLoader>,
    {
        let mut builder = Self::new();
        for spec in &config.routes {
            builder = builder.push_spec(spec, &mut factory);
        }
        builder
    }

    fn push_spec<F>(mut self, spec: &RouteSpec, factory: &mut F) -> Self
    where
        F: FnMut(&RoutePath) -> Arc<dyn RouteLoader>,
    {
        let path = RoutePath::new(&spec.path);
        let loader = factory(&path);
        self = self.descriptor(
            RouteDescriptor::new(path, loader)
                .with_meta(spec.meta())
                .with_prefetch(spec.prefetch.iter().map(String::as_str)),
        );
        for child in &spec.children {
            self = self.push_spec(child, factory);
        }
        self
    }

    /// Build the registry
    ///
    /// # Errors
    /// - `RegistryError::EmptyPath` for a descriptor with an empty path
    /// - `RegistryError::DuplicateRoute` when two descriptors share a path
    ///
    /// Dangling prefetch references are reported as configuration
    /// warnings, not errors; use [`RouteRegistry::validate_strict`] to
    /// reject them.
    pub fn build(self) -> Result<RouteRegistry, RegistryError> {
        let mut routes = IndexMap::with_capacity(self.routes.len());
        for descriptor in self.routes {
            if descriptor.path.is_empty() {
                return Err(RegistryError::EmptyPath);
            }
            if routes.contains_key(&descriptor.path) {
                return Err(RegistryError::DuplicateRoute(descriptor.path));
            }
            routes.insert(descriptor.path.clone(), descriptor);
        }

        let registry = RouteRegistry { routes };
        for issue in registry.dangling_prefetches() {
            tracing::warn!(kind = "config", "{issue}");
        }
        Ok(registry)
    }
}

/// Immutable route table
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: IndexMap<RoutePath, RouteDescriptor>,
}

impl RouteRegistry {
    /// Look up a route
    ///
    /// # Errors
    /// `RegistryError::UnknownRoute` if `path` is not registered. This is a
    /// configuration or usage error; callers report it, never ignore it.
    pub fn lookup(&self, path: &str) -> Result<&RouteDescriptor, RegistryError> {
        self.routes
            .get(path)
            .ok_or_else(|| RegistryError::UnknownRoute(RoutePath::new(path)))
    }

    /// Check if path is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Descriptors in declaration order
    ///
    /// Intended for startup and tooling (bulk warm-up, listings), not the
    /// navigation hot path.
    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.values()
    }

    /// Paths in declaration order
    #[must_use]
    pub fn paths(&self) -> Vec<RoutePath> {
        self.routes.keys().cloned().collect()
    }

    /// Number of routes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Prefetch references to unregistered paths
    #[must_use]
    pub fn dangling_prefetches(&self) -> Vec<RegistryError> {
        self.routes
            .values()
            .flat_map(|descriptor| {
                descriptor
                    .prefetch_targets
                    .iter()
                    .filter(|target| !self.routes.contains_key(*target))
                    .map(|target| RegistryError::DanglingPrefetch {
                        route: descriptor.path.clone(),
                        target: target.clone(),
                    })
            })
            .collect()
    }

    /// Check the routes the auth flow depends on
    ///
    /// The login route must be registered and public; the root route (the
    /// default resumption target) must be registered.
    #[must_use]
    pub fn check_auth_routes(&self, login_path: &str, root_path: &str) -> Vec<RegistryError> {
        let mut issues = Vec::new();
        match self.routes.get(login_path) {
            Some(login) if login.requires_auth() => {
                issues.push(RegistryError::ProtectedLoginRoute(login.path.clone()));
            }
            Some(_) => {}
            None => issues.push(RegistryError::UnknownRoute(RoutePath::new(login_path))),
        }
        if !self.routes.contains_key(root_path) {
            issues.push(RegistryError::UnknownRoute(RoutePath::new(root_path)));
        }
        issues
    }

    /// Every configuration problem: auth routes first, then dangling
    /// prefetch references in declaration order
    #[must_use]
    pub fn audit(&self, login_path: &str, root_path: &str) -> Vec<RegistryError> {
        let mut issues = self.check_auth_routes(login_path, root_path);
        issues.extend(self.dangling_prefetches());
        issues
    }

    /// Reject dangling prefetch references
    ///
    /// # Errors
    /// The first `RegistryError::DanglingPrefetch` found, in declaration order.
    pub fn validate_strict(&self) -> Result<(), RegistryError> {
        match self.dangling_prefetches().into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }
}

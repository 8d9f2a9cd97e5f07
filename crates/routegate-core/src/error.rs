//! Error types for Routegate Core
//!
//! Provides error handling for:
//! - Registry construction and lookup (configuration errors)
//! - Module loading and prefetching
//! - Configuration loading
//!
//! The authentication gate has no error type: it is a total function.

use crate::types::RoutePath;
use std::path::PathBuf;

/// Main routegate error type
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// Registry error
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Prefetch error
    #[error("prefetch error: {0}")]
    Prefetch(#[from] PrefetchError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Registry construction and lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two descriptors share a path
    #[error("duplicate route: '{0}'")]
    DuplicateRoute(RoutePath),

    /// Path is not registered
    #[error("unknown route: '{0}'")]
    UnknownRoute(RoutePath),

    /// Descriptor with an empty path
    #[error("route path must not be empty")]
    EmptyPath,

    /// Prefetch list references a path that is not registered
    #[error("route '{route}' prefetches unknown route '{target}'")]
    DanglingPrefetch {
        /// Route declaring the prefetch list
        route: RoutePath,
        /// Missing target
        target: RoutePath,
    },

    /// Login route requires authentication, so signed-out users can never
    /// reach it
    #[error("login route '{0}' requires authentication")]
    ProtectedLoginRoute(RoutePath),
}

/// Failure reported by a route loader
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    /// Create load error with message
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Prefetch errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefetchError {
    /// No loader registered for the path
    #[error("no loader registered for route '{0}'")]
    UnknownRoute(RoutePath),

    /// The loader reported a failure
    #[error("loading route '{path}' failed: {source}")]
    LoadFailed {
        /// Route being loaded
        path: RoutePath,
        /// Loader failure
        #[source]
        source: LoadError,
    },

    /// The loader panicked; the panic was contained at the scheduler
    #[error("loader for route '{path}' panicked")]
    LoaderPanicked {
        /// Route being loaded
        path: RoutePath,
    },
}

impl PrefetchError {
    /// Route the error refers to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &RoutePath {
        match self {
            Self::UnknownRoute(path)
            | Self::LoadFailed { path, .. }
            | Self::LoaderPanicked { path } => path,
        }
    }

    /// Check if error stems from configuration rather than loading
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownRoute(_))
    }

    /// Check if a later request for the same path may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LoadFailed { .. } | Self::LoaderPanicked { .. })
    }

    pub(crate) fn load_failed(path: RoutePath, source: LoadError) -> Self {
        Self::LoadFailed { path, source }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid route table: {0}")]
    Parse(#[from] toml::de::Error),

    /// Well-formed but semantically invalid
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefetch_error_classification() {
        let unknown = PrefetchError::UnknownRoute(RoutePath::new("/nope"));
        assert!(unknown.is_configuration());
        assert!(!unknown.is_retryable());

        let failed = PrefetchError::load_failed(RoutePath::new("/"), LoadError::new("chunk 404"));
        assert!(!failed.is_configuration());
        assert!(failed.is_retryable());
        assert_eq!(failed.path().as_str(), "/");
    }

    #[test]
    fn error_messages() {
        let failed = PrefetchError::load_failed(RoutePath::new("/"), LoadError::new("chunk 404"));
        assert_eq!(failed.to_string(), "loading route '/' failed: chunk 404");

        let dangling = RegistryError::DanglingPrefetch {
            route: RoutePath::new("/login"),
            target: RoutePath::new("/gone"),
        };
        assert_eq!(
            dangling.to_string(),
            "route '/login' prefetches unknown route '/gone'"
        );
    }

    #[test]
    fn nav_error_from_conversions() {
        let err: NavError = RegistryError::EmptyPath.into();
        assert!(matches!(err, NavError::Registry(RegistryError::EmptyPath)));

        let err: NavError = ConfigError::Invalid("x".to_string()).into();
        assert_eq!(err.to_string(), "configuration error: invalid configuration: x");
    }
}

//! Error types produced by the merge engine.
//!
//! Every failure is fatal to the enclosing merge call: nothing is retried or
//! recovered locally. Errors carry the diagnostic context available at the
//! point of detection (method names, classified kinds, recursion limits) so
//! callers can diagnose without re-deriving engine state.

use std::sync::Arc;

use thiserror::Error;

use crate::value::Kind;

/// Result alias used throughout the crate.
///
/// Errors are shared behind [`Arc`] so deferred values can fan a single
/// failure out to every continuation awaiting it.
pub type ExtendResult<T> = Result<T, Arc<ExtendError>>;

/// Errors that can occur while deriving configuration or executing a merge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtendError {
    /// No layer in the configuration lineage defines a required method.
    #[error("extend config method '{method}' must be defined")]
    MissingMethod {
        /// Name of the method that could not be resolved.
        method: String,
    },

    /// Two configurations were supplied in leading-argument position.
    #[error(
        "both first and second arguments cannot be configurations; \
         use a boolean or a single derived configuration instead"
    )]
    AmbiguousConfig,

    /// The target argument cannot carry properties.
    #[error("target is {found}, expected an object, array, or function")]
    BadTarget {
        /// Classified kind of the rejected target.
        found: Kind,
    },

    /// The recursion ceiling was exceeded while merging nested values.
    #[error("merge recursion exceeded {limit} levels; raise max_recursions if this is intended")]
    RecursionLimit {
        /// Configured ceiling that was hit.
        limit: usize,
    },

    /// A decorator tried to override a method that is disallowed in
    /// property-level configuration.
    #[error("'{method}' cannot be overridden from a decorator")]
    ForbiddenDecoratorMethod {
        /// Name of the rejected method.
        method: String,
    },

    /// A value with no JSON representation was found during conversion.
    #[error("cannot represent a {kind} value outside the engine")]
    UnsupportedValue {
        /// Kind of the offending value.
        kind: Kind,
    },

    /// A user-supplied handler or transformer failed.
    #[error("handler '{name}' failed: {source}")]
    Handler {
        /// Label of the failing handler.
        name: String,
        /// Underlying error reported by the handler.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ExtendError {
    /// Wraps a handler failure with its label, ready for [`ExtendResult`].
    pub fn handler(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new(Self::Handler {
            name: name.into(),
            source: source.into(),
        })
    }

    /// Shorthand for a [`ExtendError::MissingMethod`] failure.
    pub fn missing_method(method: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MissingMethod {
            method: method.into(),
        })
    }
}

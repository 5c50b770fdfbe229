//! Extensions for mapping errors into `ExtendResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| Arc::new(e.into()))`
//! patterns when converting external error types into the crate's
//! `ExtendResult<T>` alias (`Result<T, Arc<ExtendError>>`).

use std::sync::Arc;

use crate::error::{ExtendError, ExtendResult};

/// Generic extension for mapping any `Result<T, E>` with `E: Into<ExtendError>`
/// into an `ExtendResult<T>`.
pub trait IntoExtendResult<T, E> {
    /// Convert `Result<T, E>` into `ExtendResult<T>` using `Into<ExtendError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into
    /// `Arc<ExtendError>`.
    fn into_extend(self) -> ExtendResult<T>;
}

impl<T, E> IntoExtendResult<T, E> for Result<T, E>
where
    E: Into<ExtendError>,
{
    fn into_extend(self) -> ExtendResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

/// Extension for labelling arbitrary failures as handler errors.
///
/// Useful inside custom kind handlers and decorator transformers whose
/// underlying operations return foreign error types.
pub trait HandlerResultExt<T> {
    /// Convert the error into an [`ExtendError::Handler`] labelled `name`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped handler failure when the input is `Err`.
    fn in_handler(self, name: &str) -> ExtendResult<T>;
}

impl<T, E> HandlerResultExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn in_handler(self, name: &str) -> ExtendResult<T> {
        self.map_err(|e| ExtendError::handler(name, e))
    }
}

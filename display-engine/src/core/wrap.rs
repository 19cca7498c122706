//! Safe-call wrappers for host-boundary calls.
//!
//! Anything that reaches into the embedding page (element queries, the
//! platform random source, host callbacks) runs through these wrappers so a
//! failure on the host side becomes a `HostError` value instead of unwinding
//! through the engine.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure captured from a wrapped host call.
///
/// The original error (or panic payload) is kept so callers can downcast to
/// the concrete type the host raised.
#[derive(Debug)]
pub struct HostError {
    message: String,
    source: Option<BoxError>,
    payload: Option<Box<dyn Any + Send>>,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            payload: None,
        }
    }

    /// Wrap an error value returned by the host.
    pub fn from_error(err: impl Into<BoxError>) -> Self {
        let source = err.into();
        Self {
            message: source.to_string(),
            source: Some(source),
            payload: None,
        }
    }

    /// Wrap the payload of a caught panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else if let Some(err) = payload.downcast_ref::<BoxError>() {
            err.to_string()
        } else {
            "host call panicked".to_string()
        };
        Self {
            message,
            source: None,
            payload: Some(payload),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The host error value, when the failure was a returned error.
    pub fn original(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// The raw panic payload, when the failure was a panic.
    pub fn panic_payload(&self) -> Option<&(dyn Any + Send)> {
        self.payload.as_deref()
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for HostError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

/// Turn a call that may panic into one that returns `Result`.
///
/// The return value is passed through untouched: wrapping a function that
/// returns a future yields `Ok(future)` without polling it.
pub fn wrap_throws<A, T, F>(mut f: F) -> impl FnMut(A) -> Result<T, HostError>
where
    F: FnMut(A) -> T,
{
    move |args| panic::catch_unwind(AssertUnwindSafe(|| f(args))).map_err(HostError::from_panic)
}

/// Async counterpart of [`wrap_throws`].
///
/// The returned future resolves to `Ok` with the inner value, or to `Err`
/// carrying the host's error or panic payload. It never panics itself.
pub fn wrap_throws_async<A, T, E, F, Fut>(
    mut f: F,
) -> impl FnMut(A) -> LocalBoxFuture<'static, Result<T, HostError>>
where
    F: FnMut(A) -> Fut,
    Fut: Future<Output = Result<T, E>> + 'static,
    T: 'static,
    E: Into<BoxError> + 'static,
{
    move |args| {
        let started = panic::catch_unwind(AssertUnwindSafe(|| f(args)));
        async move {
            let fut = match started {
                Ok(fut) => fut,
                Err(payload) => return Err(HostError::from_panic(payload)),
            };
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(HostError::from_error(err)),
                Err(payload) => Err(HostError::from_panic(payload)),
            }
        }
        .boxed_local()
    }
}

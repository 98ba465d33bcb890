//! Error types.
//!
//! Two kinds of failure exist and they never mix:
//!
//! - [`Error`] surfaces infrastructure failures: binding to a port, parsing
//!   the listen address, accepting a connection.
//! - [`HandlerError`] is what a handler returns when it cannot produce a
//!   response. The router's error handler turns it into one.

use std::fmt;
use std::net::AddrParseError;
use std::sync::Arc;

use http::StatusCode;

/// The error type returned by the server's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failed handler.
///
/// Any `std::error::Error + Send + Sync` converts into it, so `?` works
/// inside handlers returning `Result<T, HandlerError>`:
///
/// ```rust
/// use astor_otel::{HandlerError, Request};
///
/// async fn read_config(_req: Request) -> Result<String, HandlerError> {
///     let text = std::fs::read_to_string("/etc/app.toml")?;
///     Ok(text)
/// }
/// ```
///
/// Cloning is cheap: the source error sits behind an `Arc`, so middleware can
/// observe the same error the error handler consumed.
#[derive(Clone)]
pub struct HandlerError {
    source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    status: Option<StatusCode>,
}

impl HandlerError {
    /// Wraps an arbitrary error.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self { source: Arc::from(err.into()), status: None }
    }

    /// An error that only carries a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(message.into())
    }

    /// An error that asks the default error handler for a specific status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status: Some(status), ..Self::msg(message) }
    }

    /// The status requested by the handler, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The underlying error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.source
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("source", &self.source)
            .field("status", &self.status)
            .finish()
    }
}

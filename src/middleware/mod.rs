//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: tracing, metrics, request-id injection and
//! authentication-header inspection.
//!
//! Middleware runs *after* routing, so [`Request::route`] already holds the
//! matched pattern, and *around* the error handler, so the [`Response`] it
//! gets back from [`Next::run`] is final and still carries the handler error
//! through [`Response::error`].
//!
//! ```rust
//! use astor_otel::middleware::{self, Next};
//! use astor_otel::{Request, Response, Router};
//!
//! async fn server_header(req: Request, next: Next) -> Response {
//!     let mut res = next.run(req).await;
//!     res.headers_mut().insert("server", http::HeaderValue::from_static("astor"));
//!     res
//! }
//!
//! let app = Router::new().layer(middleware::from_fn(server_header));
//! ```
//!
//! Built-in middleware:
//! - [`otel`]: per-request OpenTelemetry server span and HTTP metrics

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, Endpoint};
use crate::request::Request;
use crate::response::Response;

pub mod otel;

/// A request interceptor.
///
/// Call `next.run(req)` to continue down the chain, or return a response
/// without calling it to short-circuit.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response>;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain after the current middleware.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: Endpoint) -> Self {
        Self { stack, index: 0, endpoint }
    }

    /// Runs the remaining middleware and finally the route handler.
    pub fn run(self, req: Request) -> BoxFuture<Response> {
        match self.stack.get(self.index).cloned() {
            Some(middleware) => {
                let next = Self { index: self.index + 1, ..self };
                middleware.call(req, next)
            }
            None => self.endpoint.call(req),
        }
    }
}

/// Middleware built from an async function, see [`from_fn`].
pub struct FromFn<F>(F);

/// Wraps `async fn(Request, Next) -> Response` as [`Middleware`].
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        Box::pin((self.0)(req, next))
    }
}

//! Route handlers and the endpoint that settles their errors.
//!
//! Handlers of different types share one routing table as
//! `Arc<dyn ErasedHandler>`. A handler may return `Result<T, E>`; the `Err`
//! side is not rendered here but by the router's
//! [`error_handler`](crate::Router::error_handler), once, inside the endpoint.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::error::HandlerError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// Public only because `Handler::into_boxed_handler` names it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<Response>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Turns a handler error into the response the client sees.
pub type ErrorHandler = Arc<dyn Fn(&HandlerError) -> Response + Send + Sync + 'static>;

/// Any `async fn(Request) -> impl IntoResponse`.
///
/// Sealed; closures and fns get it from the blanket impl.
pub trait Handler: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut, R> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Routed(self))
    }
}

struct Routed<F>(F);

impl<F, Fut, R> ErasedHandler for Routed<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let response = (self.0)(req);
        Box::pin(async move { response.await.into_response() })
    }
}

/// The innermost step of a middleware chain: the matched handler plus the
/// error handler that settles its failures.
#[derive(Clone)]
pub(crate) struct Endpoint {
    handler: BoxedHandler,
    on_error: ErrorHandler,
}

impl Endpoint {
    pub(crate) fn new(handler: BoxedHandler, on_error: ErrorHandler) -> Self {
        Self { handler, on_error }
    }

    /// Runs the handler. A returned error passes through the error handler
    /// exactly once and stays attached to the final response.
    pub(crate) fn call(self, req: Request) -> BoxFuture<Response> {
        let fut = self.handler.call(req);
        Box::pin(async move {
            let mut response = fut.await;
            let Some(err) = response.unhandled.take() else {
                return response;
            };
            let mut handled = (self.on_error)(&err);
            // The error handler's own output is final, whatever it returned.
            handled.unhandled = None;
            handled.error = Some(err);
            handled
        })
    }
}

/// Default error handler: the status the error asked for (500 otherwise),
/// with the error message as a plain-text body.
pub fn default_error_handler(err: &HandlerError) -> Response {
    let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder().status(status).text(err.to_string())
}

/// Fallback for paths no route matched.
pub(crate) async fn not_found(_req: Request) -> StatusCode {
    StatusCode::NOT_FOUND
}

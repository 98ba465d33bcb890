//! # astor-otel
//!
//! OpenTelemetry instrumentation for the astor HTTP framework: one server
//! span and one set of HTTP metrics per request, with trace context
//! propagated in from the caller's headers.
//!
//! The framework underneath stays minimal: a radix-tree router via
//! [`matchit`], hyper for the wire, a middleware chain that runs after
//! routing, and an error handler that settles handler failures exactly once.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use astor_otel::middleware::otel;
//! use astor_otel::{HandlerError, Request, Response, Router, Server};
//! use opentelemetry::trace::TraceContextExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users", create_user)
//!         .layer(otel::middleware("users-api"));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     // The server span opened by the middleware:
//!     let trace_id = otel::context(&req).span().span_context().trace_id();
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}","trace":"{trace_id}"}}"#))
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, HandlerError> {
//!     if req.body().is_empty() {
//!         // Recorded on the span, answered by the router's error handler.
//!         return Err(HandlerError::msg("empty body"));
//!     }
//!     Ok(Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(req.body().clone()))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::{Error, HandlerError};
pub use handler::{BoxFuture, ErrorHandler, Handler, default_error_handler};
pub use request::{RemoteAddr, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;

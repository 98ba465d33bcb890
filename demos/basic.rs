//! Instrumented CRUD-style endpoints.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01' \
//!        http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/users          # handler error, 500
//!   curl -X DELETE http://localhost:3000/users/42

use astor_otel::middleware::otel;
use astor_otel::{HandlerError, Request, Response, Router, Server};
use http::StatusCode;
use opentelemetry::global;
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), astor_otel::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Real deployments attach an exporter (OTLP, Jaeger, ...) here.
    let provider = TracerProvider::builder().build();
    global::set_tracer_provider(provider);
    global::set_text_map_propagator(TraceContextPropagator::new());

    let app = Router::new()
        .get("/users/:id",    get_user)
        .post("/users",       create_user)
        .delete("/users/:id", delete_user)
        .layer(otel::Otel::builder("users-api").port(3000).build());

    let result = Server::bind("0.0.0.0:3000").serve(app).await;

    // Flush spans of requests that finished during the drain.
    global::shutdown_tracer_provider();
    result
}

// GET /users/:id, echoing the trace the request belongs to.
async fn get_user(req: Request) -> Response {
    let trace_id = otel::context(&req).span().span_context().trace_id();
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice","trace_id":"{trace_id}"}}"#))
}

// POST /users
async fn create_user(req: Request) -> Result<Response, HandlerError> {
    if req.body().is_empty() {
        return Err(HandlerError::msg("request body is empty"));
    }

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#))
}

// DELETE /users/:id → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

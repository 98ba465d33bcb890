//! OpenTelemetry server instrumentation.
//!
//! [`Otel`] opens one `Server` span per request, parented on whatever trace
//! context the caller propagated in the headers, and records HTTP server
//! metrics when the response is ready.
//!
//! ```rust,no_run
//! use astor_otel::middleware::otel;
//! use astor_otel::{Request, Router};
//! use opentelemetry::trace::TraceContextExt;
//!
//! async fn get_user(req: Request) -> String {
//!     let cx = otel::context(&req);
//!     cx.span().add_event("loading user", vec![]);
//!     format!("user {}", req.param("id").unwrap_or("?"))
//! }
//!
//! let app = Router::new()
//!     .get("/user/:id", get_user)
//!     .layer(otel::middleware("users-api"));
//! ```
//!
//! Span names use the matched route pattern (`/user/:id`), never the
//! resolved path. Requests matching no route are still traced, named by their
//! raw path, so 404 traffic stays visible.

use std::sync::Arc;
use std::time::Instant;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::HeaderExtractor;

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

mod config;
mod metrics;
pub mod semconv;

pub use config::OtelBuilder;

use config::{SharedPropagator, SkipFilter, SpanNameFormatter};
use metrics::Instruments;
use semconv::{EXCEPTION_EVENT, EXCEPTION_MESSAGE, HTTP_RESPONSE_CONTENT_LENGTH, HTTP_STATUS_CODE};

/// Instrumentation scope of every tracer and meter this middleware creates.
pub const INSTRUMENTATION_NAME: &str = "astor-otel";

/// Tracing and metrics middleware. Build with [`middleware`] or
/// [`Otel::builder`], then install with [`Router::layer`](crate::Router::layer).
#[derive(Clone)]
pub struct Otel {
    inner: Arc<Inner>,
}

struct Inner {
    server_name: String,
    tracer: BoxedTracer,
    instruments: Instruments,
    propagator: Option<SharedPropagator>,
    span_name_formatter: Option<SpanNameFormatter>,
    skip: Option<SkipFilter>,
    collect_client_ip: bool,
    port: Option<u16>,
}

/// Middleware using the global tracer provider, meter provider and
/// propagator.
pub fn middleware(server_name: impl Into<String>) -> Otel {
    Otel::builder(server_name).build()
}

impl Otel {
    /// Starts configuring the middleware. `server_name` becomes the
    /// `http.server_name` attribute of every span.
    pub fn builder(server_name: impl Into<String>) -> OtelBuilder {
        OtelBuilder::new(server_name)
    }
}

impl Middleware for Otel {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        Box::pin(Arc::clone(&self.inner).instrument(req, next))
    }
}

/// Request extension holding the server span's context.
#[derive(Clone)]
struct RequestContext(Context);

/// The context carrying the server span of `req`.
///
/// Without the middleware installed this is an empty context, whose
/// [`span`](TraceContextExt::span) is the invalid no-op span.
pub fn context(req: &Request) -> Context {
    req.extensions()
        .get::<RequestContext>()
        .map(|cx| cx.0.clone())
        .unwrap_or_default()
}

impl Inner {
    async fn instrument(self: Arc<Self>, mut req: Request, next: Next) -> Response {
        if self.skip.as_ref().is_some_and(|skip| skip(&req)) {
            return next.run(req).await;
        }

        let parent_cx = self.extract(&req);
        let span = self
            .tracer
            .span_builder(self.span_name(&req))
            .with_kind(SpanKind::Server)
            .with_attributes(semconv::server_request(
                &req,
                &self.server_name,
                self.collect_client_ip,
                self.port,
            ))
            .start_with_context(&self.tracer, &parent_cx);
        let cx = parent_cx.with_span(span);

        let in_flight = InFlight::start(Arc::clone(&self), cx.clone(), &req);
        req.extensions_mut().insert(RequestContext(cx));

        let response = next.run(req).await;
        in_flight.finish(&response);
        response
    }

    /// Parent context from the request headers. Malformed or missing headers
    /// give a context without a remote span, so the server span is a root.
    fn extract(&self, req: &Request) -> Context {
        let extractor = HeaderExtractor(req.headers());
        let root = Context::new();
        match &self.propagator {
            Some(propagator) => propagator.extract_with_context(&root, &extractor),
            None => global::get_text_map_propagator(|propagator| {
                propagator.extract_with_context(&root, &extractor)
            }),
        }
    }

    fn span_name(&self, req: &Request) -> String {
        let route = req.route().unwrap_or(req.path());
        match &self.span_name_formatter {
            Some(formatter) => formatter(req.method(), route),
            None => route.to_owned(),
        }
    }
}

/// Ends the span and settles the metrics of one request exactly once, either
/// with the response or, if the request future is dropped first, with no
/// status at all.
struct InFlight {
    otel: Arc<Inner>,
    cx: Context,
    attrs: Vec<KeyValue>,
    request_size: u64,
    start: Instant,
    done: bool,
}

impl InFlight {
    fn start(otel: Arc<Inner>, cx: Context, req: &Request) -> Self {
        let attrs = semconv::server_metrics(req);
        otel.instruments.active_requests.add(1, &attrs);
        Self {
            otel,
            cx,
            attrs,
            request_size: req.body().len() as u64,
            start: Instant::now(),
            done: false,
        }
    }

    fn finish(mut self, response: &Response) {
        self.complete(Some(response));
    }

    fn complete(&mut self, response: Option<&Response>) {
        if std::mem::replace(&mut self.done, true) {
            return;
        }

        let span = self.cx.span();
        let instruments = &self.otel.instruments;
        let mut attrs = self.attrs.clone();

        match response {
            Some(res) => {
                let status = i64::from(res.status_code().as_u16());
                let response_size = res.body().len() as u64;

                span.set_attribute(KeyValue::new(HTTP_STATUS_CODE, status));
                span.set_attribute(KeyValue::new(HTTP_RESPONSE_CONTENT_LENGTH, response_size as i64));
                if let Some(description) = semconv::span_error(res.status_code(), res.error()) {
                    span.add_event(
                        EXCEPTION_EVENT,
                        vec![KeyValue::new(EXCEPTION_MESSAGE, description.clone())],
                    );
                    span.set_status(Status::error(description));
                }

                attrs.push(KeyValue::new(HTTP_STATUS_CODE, status));
                instruments.response_size.record(response_size, &attrs);
            }
            None => {
                tracing::debug!(
                    trace_id = %span.span_context().trace_id(),
                    "request dropped before a response was produced",
                );
            }
        }
        span.end();

        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        instruments.duration.record(elapsed_ms, &attrs);
        instruments.request_size.record(self.request_size, &attrs);
        instruments.active_requests.add(-1, &self.attrs);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.complete(None);
    }
}

//! Construction-time options for [`Otel`].

use std::sync::Arc;

use http::Method;
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{Tracer, TracerProvider};

use super::metrics::Instruments;
use super::{INSTRUMENTATION_NAME, Inner, Otel};
use crate::request::Request;

pub(crate) type SpanNameFormatter = Arc<dyn Fn(&Method, &str) -> String + Send + Sync>;
pub(crate) type SkipFilter = Arc<dyn Fn(&Request) -> bool + Send + Sync>;
pub(crate) type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Builder for the [`Otel`] middleware.
///
/// Every option falls back to a process-wide default. Tracer and meter
/// defaults are read from [`opentelemetry::global`] once, in
/// [`build`](OtelBuilder::build); install global providers before that.
pub struct OtelBuilder {
    server_name: String,
    tracer: Option<BoxedTracer>,
    meter: Option<Meter>,
    propagator: Option<SharedPropagator>,
    span_name_formatter: Option<SpanNameFormatter>,
    skip: Option<SkipFilter>,
    collect_client_ip: bool,
    port: Option<u16>,
}

impl OtelBuilder {
    pub(crate) fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            tracer: None,
            meter: None,
            propagator: None,
            span_name_formatter: None,
            skip: None,
            collect_client_ip: true,
            port: None,
        }
    }

    /// Creates spans with a tracer from `provider` instead of the global one.
    pub fn tracer_provider<P>(mut self, provider: &P) -> Self
    where
        P: TracerProvider,
        P::Tracer: Send + Sync + 'static,
        <P::Tracer as Tracer>::Span: Send + Sync + 'static,
    {
        let tracer = provider.tracer(INSTRUMENTATION_NAME);
        self.tracer = Some(BoxedTracer::new(Box::new(tracer)));
        self
    }

    /// Registers the instruments on a meter from `provider` instead of the
    /// global one.
    pub fn meter_provider<P: MeterProvider>(mut self, provider: &P) -> Self {
        self.meter = Some(provider.meter(INSTRUMENTATION_NAME));
        self
    }

    /// Extracts parent context with `propagator`.
    ///
    /// Without one, the global text-map propagator is consulted on every
    /// request, so it may be replaced after the middleware is built.
    pub fn propagator<P>(mut self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        self.propagator = Some(Arc::new(propagator));
        self
    }

    /// Names spans with `f(method, route)`. For unmatched requests the route
    /// argument is the raw path.
    pub fn span_name_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Method, &str) -> String + Send + Sync + 'static,
    {
        self.span_name_formatter = Some(Arc::new(f));
        self
    }

    /// Passes requests for which `f` returns `true` through untraced and
    /// unmeasured.
    pub fn skip<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(f));
        self
    }

    /// Whether to record `http.client_ip`. On by default.
    pub fn collect_client_ip(mut self, enabled: bool) -> Self {
        self.collect_client_ip = enabled;
        self
    }

    /// Records `net.host.port` on every span.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn build(self) -> Otel {
        let tracer = self.tracer.unwrap_or_else(|| global::tracer(INSTRUMENTATION_NAME));
        let meter = self.meter.unwrap_or_else(|| global::meter(INSTRUMENTATION_NAME));

        Otel {
            inner: Arc::new(Inner {
                server_name: self.server_name,
                tracer,
                instruments: Instruments::new(&meter),
                propagator: self.propagator,
                span_name_formatter: self.span_name_formatter,
                skip: self.skip,
                collect_client_ip: self.collect_client_ip,
                port: self.port,
            }),
        }
    }
}

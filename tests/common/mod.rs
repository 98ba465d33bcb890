#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use astor_otel::Request;
use astor_otel::middleware::otel;
use bytes::Bytes;
use opentelemetry::trace::{SpanContext, SpanKind, TraceContextExt};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;

/// Tracer provider that keeps every finished span in memory.
pub fn tracer_provider() -> (TracerProvider, InMemorySpanExporter) {
    init_test_tracing();
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider, exporter)
}

/// Only logs errors, into the test output.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}

pub fn get(path: &str) -> http::Request<Bytes> {
    http::Request::get(path).body(Bytes::new()).unwrap()
}

/// Finished spans of kind `Server`, in end order.
pub fn server_spans(exporter: &InMemorySpanExporter) -> Vec<SpanData> {
    exporter
        .get_finished_spans()
        .unwrap()
        .into_iter()
        .filter(|span| span.span_kind == SpanKind::Server)
        .collect()
}

pub fn attr_str(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

pub fn attr_i64(span: &SpanData, key: &str) -> Option<i64> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .and_then(|kv| match kv.value {
            opentelemetry::Value::I64(v) => Some(v),
            _ => None,
        })
}

/// Slot a handler fills with the span context it saw.
pub type Seen = Arc<Mutex<Option<SpanContext>>>;

pub fn record_span(seen: &Seen, req: &Request) {
    let cx = otel::context(req);
    *seen.lock().unwrap() = Some(cx.span().span_context().clone());
}

pub fn seen(seen: &Seen) -> SpanContext {
    seen.lock().unwrap().clone().expect("handler did not run")
}

//! HTTP server metric instruments.
//!
//! - `http.server.duration`: histogram of request latency in milliseconds
//! - `http.server.request.size`: histogram of request body bytes
//! - `http.server.response.size`: histogram of response body bytes
//! - `http.server.active_requests`: requests currently in flight

use opentelemetry::metrics::{Histogram, Meter, UpDownCounter};

/// Instruments registered once per middleware instance.
#[derive(Debug)]
pub(crate) struct Instruments {
    pub(crate) duration: Histogram<f64>,
    pub(crate) request_size: Histogram<u64>,
    pub(crate) response_size: Histogram<u64>,
    pub(crate) active_requests: UpDownCounter<i64>,
}

impl Instruments {
    pub(crate) fn new(meter: &Meter) -> Self {
        Self {
            duration: meter
                .f64_histogram("http.server.duration")
                .with_description("Duration of inbound HTTP requests")
                .with_unit("ms")
                .init(),
            request_size: meter
                .u64_histogram("http.server.request.size")
                .with_description("Size of inbound HTTP request bodies")
                .with_unit("By")
                .init(),
            response_size: meter
                .u64_histogram("http.server.response.size")
                .with_description("Size of outbound HTTP response bodies")
                .with_unit("By")
                .init(),
            active_requests: meter
                .i64_up_down_counter("http.server.active_requests")
                .with_description("Number of inbound HTTP requests in flight")
                .with_unit("{request}")
                .init(),
        }
    }
}

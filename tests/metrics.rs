mod common;

use astor_otel::middleware::otel::{INSTRUMENTATION_NAME, Otel};
use astor_otel::{Request, Router};
use common::get;
use http::StatusCode;
use opentelemetry_sdk::metrics::data::Histogram;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::testing::metrics::InMemoryMetricsExporter;

// The periodic reader's flush blocks until its background task answers, so
// that task needs a worker thread of its own.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn metrics_land_in_one_scope() {
    common::init_test_tracing();
    let exporter = InMemoryMetricsExporter::default();
    let reader = PeriodicReader::builder(exporter.clone(), runtime::Tokio).build();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();

    let app = Router::new()
        .get("/", |_req: Request| async { StatusCode::OK })
        .layer(Otel::builder("foobar").meter_provider(&provider).build());

    for _ in 0..3 {
        app.handle(get("/")).await;
    }

    provider.force_flush().unwrap();
    let exported = exporter.get_finished_metrics().unwrap();
    let resource = exported.last().expect("no metrics exported");

    assert_eq!(resource.scope_metrics.len(), 1);
    let scope = &resource.scope_metrics[0];
    assert_eq!(scope.scope.name, INSTRUMENTATION_NAME);

    let names: Vec<&str> = scope.metrics.iter().map(|m| m.name.as_ref()).collect();
    for expected in [
        "http.server.duration",
        "http.server.request.size",
        "http.server.response.size",
        "http.server.active_requests",
    ] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }

    let duration = scope
        .metrics
        .iter()
        .find(|m| m.name == "http.server.duration")
        .and_then(|m| m.data.as_any().downcast_ref::<Histogram<f64>>())
        .expect("duration is an f64 histogram");
    let count: u64 = duration.data_points.iter().map(|p| p.count).sum();
    assert_eq!(count, 3);
}

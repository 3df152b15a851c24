//! OpenTelemetry metrics support for couchbase query operations
//!
//! Optional, behind the `metrics` cargo feature. Tracks query counts, query
//! durations, error counts, and the number of in-flight operations, labeled by
//! query kind and bucket where known.

use crate::query::QueryKind;
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector for couchbase query operations
#[derive(Clone, Debug)]
pub struct CouchbaseMetrics {
    /// Total number of queries dispatched
    queries_total: Counter<u64>,
    /// Duration from dispatch to completion in milliseconds
    query_duration: Histogram<f64>,
    /// Total number of failed queries
    errors_total: Counter<u64>,
    /// Number of dispatched queries whose completion has not fired yet
    queries_in_flight: UpDownCounter<i64>,
}

impl CouchbaseMetrics {
    /// Create a new metrics instance with the provided meter
    #[must_use]
    pub fn new(meter: &Meter) -> Self {
        Self {
            queries_total: meter
                .u64_counter("couchbase.queries.total")
                .with_description("Total number of couchbase queries dispatched")
                .build(),

            query_duration: meter
                .f64_histogram("couchbase.query.duration")
                .with_description("Duration of couchbase queries in milliseconds")
                .build(),

            errors_total: meter
                .u64_counter("couchbase.errors.total")
                .with_description("Total number of failed couchbase queries")
                .build(),

            queries_in_flight: meter
                .i64_up_down_counter("couchbase.queries.in_flight")
                .with_description("Number of couchbase queries awaiting completion")
                .build(),
        }
    }

    /// Record a completed query
    pub fn record_query(
        &self,
        duration: Duration,
        success: bool,
        kind: Option<QueryKind>,
        bucket: Option<&str>,
    ) {
        let attributes = query_attributes(success, kind, bucket);

        self.queries_total.add(1, &attributes);
        let millis = duration.as_secs_f64() * 1000.0;
        self.query_duration.record(millis, &attributes);

        if !success {
            self.errors_total.add(1, &attributes);
        }
    }

    /// Note a query entering flight
    pub fn query_started(&self) {
        self.queries_in_flight.add(1, &[]);
    }

    /// Note a query leaving flight
    pub fn query_finished(&self) {
        self.queries_in_flight.add(-1, &[]);
    }
}

fn query_attributes(
    success: bool,
    kind: Option<QueryKind>,
    bucket: Option<&str>,
) -> Vec<KeyValue> {
    let mut attributes = vec![KeyValue::new("success", success)];
    if let Some(kind) = kind {
        attributes.push(KeyValue::new("query.type", kind.as_str()));
    }
    if let Some(bucket) = bucket {
        attributes.push(KeyValue::new("bucket.name", bucket.to_owned()));
    }
    attributes
}

/// Builder for configuring a metrics collection
pub struct MetricsBuilder {
    meter: Option<Meter>,
}

impl MetricsBuilder {
    /// Create a new metrics builder
    #[must_use]
    pub fn new() -> Self {
        Self { meter: None }
    }

    /// Enable metrics collection with the provided meter
    #[must_use]
    pub fn with_meter(mut self, meter: Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Build the metrics instance, `None` when no meter was provided
    #[must_use]
    pub fn build(self) -> Option<Arc<CouchbaseMetrics>> {
        self.meter.as_ref().map(CouchbaseMetrics::new).map(Arc::new)
    }
}

impl Default for MetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer utility for measuring operation durations
pub struct OperationTimer {
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start a new timer
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Get the elapsed duration
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Per-operation recorder held by the span finisher
///
/// Started when a query is dispatched; records the outcome on first finish.
pub(crate) struct QueryRecorder {
    metrics: Arc<CouchbaseMetrics>,
    timer: OperationTimer,
    kind: Option<QueryKind>,
    bucket: Option<String>,
}

impl QueryRecorder {
    pub(crate) fn start(
        metrics: Arc<CouchbaseMetrics>,
        kind: Option<QueryKind>,
        bucket: Option<&str>,
    ) -> Self {
        metrics.query_started();
        Self {
            metrics,
            timer: OperationTimer::start(),
            kind,
            bucket: bucket.map(str::to_owned),
        }
    }

    pub(crate) fn record(&self, success: bool) {
        self.metrics.query_finished();
        self.metrics
            .record_query(self.timer.elapsed(), success, self.kind, self.bucket.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{
        InMemoryMetricExporter, InMemoryMetricExporterBuilder, PeriodicReader, SdkMeterProvider,
    };

    fn counter_total(exporter: &InMemoryMetricExporter, name: &str) -> Option<u64> {
        for resource_metrics in exporter.get_finished_metrics().unwrap() {
            for scope in resource_metrics.scope_metrics() {
                for metric in scope.metrics() {
                    if metric.name() == name {
                        if let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() {
                            return Some(sum.data_points().map(|point| point.value()).sum());
                        }
                    }
                }
            }
        }
        None
    }

    #[test]
    fn test_failed_query_increments_error_counter() {
        let exporter = InMemoryMetricExporterBuilder::new().build();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        let metrics = CouchbaseMetrics::new(&provider.meter("test"));

        metrics.record_query(
            Duration::from_millis(100),
            true,
            Some(QueryKind::N1ql),
            Some("datadog-test"),
        );
        metrics.record_query(Duration::from_millis(5), false, Some(QueryKind::N1ql), None);

        provider.force_flush().unwrap();

        assert_eq!(counter_total(&exporter, "couchbase.queries.total"), Some(2));
        // Only the failed query reaches the error counter.
        assert_eq!(counter_total(&exporter, "couchbase.errors.total"), Some(1));
    }

    #[test]
    fn test_metrics_creation() {
        let provider = SdkMeterProvider::default();
        let meter = provider.meter("test");
        let metrics = CouchbaseMetrics::new(&meter);

        // Recording must not panic whatever the label combination.
        metrics.record_query(
            Duration::from_millis(100),
            true,
            Some(QueryKind::N1ql),
            Some("datadog-test"),
        );
        metrics.record_query(Duration::from_millis(5), false, None, None);
        metrics.query_started();
        metrics.query_finished();
    }

    #[test]
    fn test_metrics_builder() {
        let provider = SdkMeterProvider::default();
        let meter = provider.meter("test");

        let metrics = MetricsBuilder::new().with_meter(meter).build();
        assert!(metrics.is_some());
    }

    #[test]
    fn test_metrics_builder_disabled() {
        let metrics = MetricsBuilder::new().build();
        assert!(metrics.is_none());
    }

    #[test]
    fn test_query_recorder() {
        let provider = SdkMeterProvider::default();
        let meter = provider.meter("test");
        let metrics = Arc::new(CouchbaseMetrics::new(&meter));

        let recorder = QueryRecorder::start(metrics, Some(QueryKind::View), Some("datadog-test"));
        std::thread::sleep(Duration::from_millis(10));
        recorder.record(true);
        assert!(recorder.timer.elapsed().as_millis() >= 10);
    }
}

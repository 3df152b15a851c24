//! Builder pattern for configuring couchbase instrumentation
//!
//! This module provides the configuration surface for the instrumentation
//! layer. All providers must be explicitly passed - no global providers are
//! used. The built [`CouchbaseInstrumentation`] is cheap to clone and is shared
//! by every cluster-level and bucket-level wrapper it instruments.

use crate::context::ContextCarrier;
use opentelemetry::global::BoxedTracer;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::{CouchbaseMetrics, QueryRecorder};
#[cfg(feature = "metrics")]
use crate::query::QueryKind;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::Meter;

/// Service name used when no override is configured
pub const DEFAULT_SERVICE_NAME: &str = "couchbase";

/// Builder for [`CouchbaseInstrumentation`]
///
/// # Example
///
/// ```rust,ignore
/// let instrumentation = CouchbaseInstrumentation::builder()
///     .with_tracer(my_tracer)              // Optional - only if you want tracing
///     .with_service_name("orders-couchbase")
///     .build();
/// ```
pub struct InstrumentationBuilder {
    tracer: Option<BoxedTracer>,
    service_name: Option<String>,
    context_propagation: bool,
    #[cfg(feature = "metrics")]
    meter: Option<Meter>,
}

impl InstrumentationBuilder {
    /// Create a new builder with tracing disabled and propagation enabled
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracer: None,
            service_name: None,
            context_propagation: true,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    /// Add a tracer for span creation
    ///
    /// Without a tracer, wrapped hosts dispatch queries untraced.
    #[must_use]
    pub fn with_tracer(mut self, tracer: BoxedTracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Override the service name recorded on each span
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Enable or disable active-context propagation into completion handlers
    ///
    /// When disabled, the context carrier's activation becomes a pure no-op:
    /// completion handlers observe whatever context the runtime left ambient.
    #[must_use]
    pub fn with_context_propagation(mut self, enabled: bool) -> Self {
        self.context_propagation = enabled;
        self
    }

    /// Add a meter for per-query metrics collection
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_meter(mut self, meter: Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Build the shared instrumentation handle
    #[must_use]
    pub fn build(self) -> CouchbaseInstrumentation {
        CouchbaseInstrumentation {
            shared: Arc::new(Shared {
                tracer: self.tracer,
                service_name: self
                    .service_name
                    .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned()),
                carrier: ContextCarrier::new(self.context_propagation),
                #[cfg(feature = "metrics")]
                metrics: self.meter.as_ref().map(|m| Arc::new(CouchbaseMetrics::new(m))),
            }),
        }
    }
}

impl Default for InstrumentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Shared {
    tracer: Option<BoxedTracer>,
    service_name: String,
    carrier: ContextCarrier,
    #[cfg(feature = "metrics")]
    metrics: Option<Arc<CouchbaseMetrics>>,
}

/// Shared instrumentation state handed to each wrapper
#[derive(Clone, Debug)]
pub struct CouchbaseInstrumentation {
    shared: Arc<Shared>,
}

impl CouchbaseInstrumentation {
    /// Start building an instrumentation configuration
    #[must_use]
    pub fn builder() -> InstrumentationBuilder {
        InstrumentationBuilder::new()
    }

    /// The service name recorded on each span
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.shared.service_name
    }

    /// The context capture/activate policy
    #[must_use]
    pub fn carrier(&self) -> ContextCarrier {
        self.shared.carrier
    }

    pub(crate) fn tracer(&self) -> Option<&BoxedTracer> {
        self.shared.tracer.as_ref()
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn query_recorder(
        &self,
        kind: Option<QueryKind>,
        bucket: Option<&str>,
    ) -> Option<QueryRecorder> {
        self.shared
            .metrics
            .as_ref()
            .map(|metrics| QueryRecorder::start(Arc::clone(metrics), kind, bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let instrumentation = InstrumentationBuilder::new().build();
        assert_eq!(instrumentation.service_name(), DEFAULT_SERVICE_NAME);
        assert!(instrumentation.carrier().enabled());
        assert!(instrumentation.tracer().is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let instrumentation = CouchbaseInstrumentation::builder()
            .with_service_name("orders-couchbase")
            .with_context_propagation(false)
            .build();
        assert_eq!(instrumentation.service_name(), "orders-couchbase");
        assert!(!instrumentation.carrier().enabled());
    }
}

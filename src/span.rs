//! Span construction and the exactly-once finisher
//!
//! One span per dispatched query, named [`SPAN_NAME`], kind client, parented on
//! the context captured at issue time. The span is owned by a [`PendingSpan`]
//! until one of the completion paths finishes it; a second finish is a no-op.

use crate::builder::CouchbaseInstrumentation;
use crate::client::{QueryCallback, QueryHost};
use crate::completion::{wrap_callback, InstrumentedEmitter};
use crate::error::QueryError;
use crate::query::QueryDescriptor;
use opentelemetry::global::BoxedSpan;
use opentelemetry::trace::{Span as _, SpanKind, Status, Tracer as _};
use opentelemetry::{Key, KeyValue};
use opentelemetry_semantic_conventions::attribute::{DB_QUERY_TEXT, DB_SYSTEM_NAME};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[cfg(feature = "metrics")]
use crate::metrics::QueryRecorder;

/// Span name shared by every query the interceptor traces
pub const SPAN_NAME: &str = "couchbase.call";

/// Classification constant carried in `span.type`
///
/// The wrapped system's own convention labels these spans `sql` even though the
/// backend is not relational; the value is reproduced verbatim.
pub const SPAN_TYPE_SQL: &str = "sql";

/// Value of the `db.system.name` attribute
pub const DB_SYSTEM: &str = "couchbase";

/// Attribute key for the configured service name
pub const SERVICE_NAME: Key = Key::from_static_str("service.name");

/// Attribute key for the span resource
pub const RESOURCE_NAME: Key = Key::from_static_str("resource.name");

/// Attribute key for the span classification
pub const SPAN_TYPE: Key = Key::from_static_str("span.type");

/// Attribute key for the query kind
pub const QUERY_TYPE: Key = Key::from_static_str("query.type");

/// Attribute key for the bucket a query resolves against
pub const BUCKET_NAME: Key = Key::from_static_str("bucket.name");

/// Attribute key for a view query's design document
pub const DDOC: Key = Key::from_static_str("ddoc");

/// A span bound to one in-flight operation until its completion fires
///
/// Both completion paths of one operation may feed it; only the first finish
/// closes the span. The slot is taken under a momentary lock, never held across
/// user code.
pub(crate) struct PendingSpan {
    span: Mutex<Option<BoxedSpan>>,
    #[cfg(feature = "metrics")]
    recorder: Option<QueryRecorder>,
}

impl PendingSpan {
    pub(crate) fn new(span: BoxedSpan) -> Self {
        Self {
            span: Mutex::new(Some(span)),
            #[cfg(feature = "metrics")]
            recorder: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_recorder(mut self, recorder: Option<QueryRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Close the span, recording error state when present
    ///
    /// Idempotent; also degrades to a no-op if the slot lock was poisoned, so a
    /// fault here can never block result delivery.
    pub(crate) fn finish(&self, error: Option<&QueryError>) {
        let Ok(mut slot) = self.span.lock() else {
            return;
        };
        let Some(mut span) = slot.take() else {
            return;
        };
        drop(slot);

        if let Some(err) = error {
            span.record_error(err);
            span.set_status(Status::error(err.to_string()));
        }
        span.end();

        #[cfg(feature = "metrics")]
        if let Some(recorder) = &self.recorder {
            recorder.record(error.is_none());
        }
    }
}

impl CouchbaseInstrumentation {
    /// Shared interception strategy for cluster-level and bucket-level hosts
    ///
    /// Captures the active context, opens the span, substitutes the completion
    /// argument, and dispatches through the host untouched otherwise. Without a
    /// configured tracer the dispatch passes through untraced.
    pub(crate) fn trace_query<H: QueryHost>(
        &self,
        host: &H,
        query: &QueryDescriptor,
        callback: Option<QueryCallback>,
    ) -> Option<InstrumentedEmitter<H::Emitter>> {
        let Some(tracer) = self.tracer() else {
            debug!("no tracer configured, dispatching couchbase query untraced");
            return host
                .dispatch(query, callback)
                .map(InstrumentedEmitter::passthrough);
        };

        let captured = self.carrier().capture();

        let mut attributes = vec![
            KeyValue::new(SERVICE_NAME, self.service_name().to_owned()),
            KeyValue::new(SPAN_TYPE, SPAN_TYPE_SQL),
            KeyValue::new(DB_SYSTEM_NAME, DB_SYSTEM),
        ];
        if let Some(kind) = query.kind() {
            attributes.push(KeyValue::new(QUERY_TYPE, kind.as_str()));
        }
        if let Some(resource) = query.resource() {
            attributes.push(KeyValue::new(RESOURCE_NAME, resource.to_owned()));
        }
        if let Some(statement) = query.statement() {
            attributes.push(KeyValue::new(DB_QUERY_TEXT, statement.to_owned()));
        }
        if let Some(ddoc) = query.ddoc() {
            attributes.push(KeyValue::new(DDOC, ddoc.to_owned()));
        }
        if let Some(bucket) = host.bucket_name() {
            attributes.push(KeyValue::new(BUCKET_NAME, bucket.to_owned()));
        }

        let span_builder = tracer
            .span_builder(SPAN_NAME)
            .with_kind(SpanKind::Client)
            .with_attributes(attributes);
        let span = match captured.context() {
            Some(context) => span_builder.start_with_context(tracer, context),
            None => span_builder.start(tracer),
        };

        debug!(kind = ?query.kind(), "dispatching traced couchbase query");

        let pending = PendingSpan::new(span);
        #[cfg(feature = "metrics")]
        let pending = pending.with_recorder(self.query_recorder(query.kind(), host.bucket_name()));
        let pending = Arc::new(pending);

        let callback =
            callback.map(|user| wrap_callback(Arc::clone(&pending), captured.clone(), user));

        host.dispatch(query, callback)
            .map(|emitter| InstrumentedEmitter::new(emitter, pending, captured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::global::BoxedTracer;
    use opentelemetry::trace::noop::NoopTracer;
    use opentelemetry::trace::Tracer;

    fn noop_span() -> BoxedSpan {
        let tracer = BoxedTracer::new(Box::new(NoopTracer::new()));
        tracer.start("test")
    }

    #[test]
    fn test_finish_is_idempotent() {
        let pending = PendingSpan::new(noop_span());
        pending.finish(None);
        pending.finish(None);
        pending.finish(Some(&QueryError::new("late error is swallowed")));
    }

    #[test]
    fn test_finish_with_error_first() {
        let pending = PendingSpan::new(noop_span());
        pending.finish(Some(&QueryError::with_code(59, "timeout")));
        pending.finish(None);
    }
}

/*!
`otel-instrumentation-couchbase` wraps callback/event-driven Couchbase SDK clients so
that every asynchronous query becomes an OpenTelemetry span, with the active trace
context carried correctly across the asynchronous boundary the client introduces.

# How it works

The classic Couchbase SDKs complete queries through one of two idioms, chosen by
whether the caller supplied a trailing callback: a callback invoked once with
`(error, rows)`, or an event emitter firing row events followed by one terminal
success or error event. This crate intercepts the query dispatch method of
cluster-level and bucket-level handles and, per invocation:

- captures the active [`opentelemetry::Context`] by value at issue time,
- opens one `couchbase.call` client span tagged with the query kind, resource,
  bucket, and design document derived from the query descriptor,
- substitutes the completion argument so the span finishes exactly once whichever
  delivery path fires, and
- re-establishes the issue-time context around the caller's own callback or
  listeners, so user code observes the span that was active when the query was
  issued, no matter how many unrelated operations interleave.

The wrapped client itself stays untouched: arguments, results, and events reach the
caller unmodified and undelayed, and instrumentation faults fail open.

# Usage

```rust,ignore
use otel_instrumentation_couchbase::{
    CouchbaseInstrumentation, QueryDescriptor, QueryHostExt,
};

let instrumentation = CouchbaseInstrumentation::builder()
    .with_tracer(tracer)
    .with_service_name("orders-couchbase")
    .build();

// `cluster` is any client handle implementing `QueryHost`.
let cluster = cluster.instrument_cluster(instrumentation);

cluster.query(&QueryDescriptor::n1ql("SELECT 1+1"), Some(Box::new(|result| {
    // Runs with the issue-time trace context active.
})));
```

# Features

- **One wrapping strategy** for cluster-level and bucket-level handles
- **Both completion idioms** normalized into a single idempotent finish signal
- **Per-operation context snapshots** - no shared mutable "current span" slot, so
  concurrently pending queries never cross-talk
- **Optional metrics** behind the `metrics` feature flag

# Limitations

No cancellation: if the wrapped client never completes an operation, its span stays
open indefinitely. Some client versions are known to delay completion until an
unrelated reconnect; the adapter stays armed without a timeout because resolving
that is the client's own failure mode.

*/
#![warn(clippy::all, clippy::pedantic)]

pub mod bucket;
pub mod builder;
pub mod client;
pub mod cluster;
pub mod completion;
pub mod context;
pub mod error;
pub mod ext;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod query;
pub mod span;

pub use bucket::InstrumentedBucket;
pub use builder::{CouchbaseInstrumentation, InstrumentationBuilder, DEFAULT_SERVICE_NAME};
pub use client::{
    ErrorListener, QueryCallback, QueryEmitter, QueryHost, QueryResult, Row, RowListener,
    RowsListener,
};
pub use cluster::InstrumentedCluster;
pub use completion::InstrumentedEmitter;
pub use context::{CapturedContext, ContextCarrier};
pub use error::QueryError;
pub use ext::QueryHostExt;
#[cfg(feature = "metrics")]
pub use metrics::{CouchbaseMetrics, MetricsBuilder};
pub use query::{QueryDescriptor, QueryKind};
pub use span::{DB_SYSTEM, SPAN_NAME, SPAN_TYPE_SQL};

//! Cluster-level wrapper

use crate::builder::CouchbaseInstrumentation;
use crate::client::{QueryCallback, QueryHost};
use crate::completion::InstrumentedEmitter;
use crate::query::QueryDescriptor;
use std::ops::Deref;

/// A wrapper around a cluster-level client handle that traces every query
///
/// The wrapper preserves the dispatch method's arity and semantics: it only
/// substitutes the completion argument, never the query itself. A bucket-level
/// handle gets the same treatment through
/// [`InstrumentedBucket`](crate::bucket::InstrumentedBucket).
///
/// # Example
///
/// ```rust,ignore
/// let cluster = InstrumentedCluster::new(cluster, instrumentation.clone());
///
/// // Callback idiom: the callback runs in the context active right now,
/// // not whatever is ambient when the client delivers completion.
/// cluster.query(&QueryDescriptor::n1ql("SELECT 1+1"), Some(Box::new(|result| {
///     // ...
/// })));
///
/// // Event idiom: no callback, completion arrives on the returned emitter.
/// let mut emitter = cluster
///     .query(&QueryDescriptor::n1ql("SELECT 1+1"), None)
///     .expect("event-idiom calls return an emitter");
/// emitter.on_rows(Box::new(|rows| { /* ... */ }));
/// ```
pub struct InstrumentedCluster<C> {
    inner: C,
    instrumentation: CouchbaseInstrumentation,
}

impl<C: QueryHost> InstrumentedCluster<C> {
    /// Wrap an existing cluster handle
    #[must_use]
    pub fn new(inner: C, instrumentation: CouchbaseInstrumentation) -> Self {
        Self {
            inner,
            instrumentation,
        }
    }

    /// Dispatch a query through the wrapped cluster
    ///
    /// Returns the instrumented emitter when the call used the event idiom
    /// (no callback supplied).
    pub fn query(
        &self,
        query: &QueryDescriptor,
        callback: Option<QueryCallback>,
    ) -> Option<InstrumentedEmitter<C::Emitter>> {
        self.instrumentation.trace_query(&self.inner, query, callback)
    }

    /// The instrumentation configuration this wrapper uses
    #[must_use]
    pub fn instrumentation(&self) -> &CouchbaseInstrumentation {
        &self.instrumentation
    }

    /// Get a reference to the inner cluster handle
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Consume self and return the inner cluster handle
    #[must_use]
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C> Deref for InstrumentedCluster<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<C> AsRef<C> for InstrumentedCluster<C> {
    fn as_ref(&self) -> &C {
        &self.inner
    }
}

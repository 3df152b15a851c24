//! Bucket-level wrapper

use crate::builder::CouchbaseInstrumentation;
use crate::client::{QueryCallback, QueryHost};
use crate::completion::InstrumentedEmitter;
use crate::query::QueryDescriptor;
use std::ops::Deref;

/// A wrapper around a bucket-level client handle that traces every query
///
/// Dispatch semantics are identical to
/// [`InstrumentedCluster`](crate::cluster::InstrumentedCluster); the bucket
/// level additionally names the bucket that queries resolve against, which
/// becomes the `bucket.name` span tag when the client can report it
/// synchronously at call time. A bucket still connecting reports none, and the
/// tag is omitted rather than defaulted.
pub struct InstrumentedBucket<B> {
    inner: B,
    instrumentation: CouchbaseInstrumentation,
}

impl<B: QueryHost> InstrumentedBucket<B> {
    /// Wrap an existing bucket handle
    #[must_use]
    pub fn new(inner: B, instrumentation: CouchbaseInstrumentation) -> Self {
        Self {
            inner,
            instrumentation,
        }
    }

    /// Dispatch a query through the wrapped bucket
    ///
    /// Returns the instrumented emitter when the call used the event idiom
    /// (no callback supplied).
    pub fn query(
        &self,
        query: &QueryDescriptor,
        callback: Option<QueryCallback>,
    ) -> Option<InstrumentedEmitter<B::Emitter>> {
        self.instrumentation.trace_query(&self.inner, query, callback)
    }

    /// The bucket name, when the client can resolve it at this moment
    #[must_use]
    pub fn bucket_name(&self) -> Option<&str> {
        self.inner.bucket_name()
    }

    /// The instrumentation configuration this wrapper uses
    #[must_use]
    pub fn instrumentation(&self) -> &CouchbaseInstrumentation {
        &self.instrumentation
    }

    /// Get a reference to the inner bucket handle
    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Consume self and return the inner bucket handle
    #[must_use]
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> Deref for InstrumentedBucket<B> {
    type Target = B;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<B> AsRef<B> for InstrumentedBucket<B> {
    fn as_ref(&self) -> &B {
        &self.inner
    }
}

//! Extension trait for wrapping client handles
//!
//! Provides a method-chaining way to put instrumentation around any type that
//! implements [`QueryHost`], instead of calling the wrapper constructors
//! directly.

use crate::bucket::InstrumentedBucket;
use crate::builder::CouchbaseInstrumentation;
use crate::client::QueryHost;
use crate::cluster::InstrumentedCluster;

/// Extension methods on query-dispatching client handles
///
/// # Example
///
/// ```rust,ignore
/// use otel_instrumentation_couchbase::QueryHostExt;
///
/// let cluster = connect_cluster().instrument_cluster(instrumentation.clone());
/// let bucket = cluster.open_bucket("datadog-test").instrument_bucket(instrumentation);
/// ```
pub trait QueryHostExt: QueryHost + Sized {
    /// Wrap this handle as an instrumented cluster-level host
    #[must_use]
    fn instrument_cluster(
        self,
        instrumentation: CouchbaseInstrumentation,
    ) -> InstrumentedCluster<Self> {
        InstrumentedCluster::new(self, instrumentation)
    }

    /// Wrap this handle as an instrumented bucket-level host
    #[must_use]
    fn instrument_bucket(
        self,
        instrumentation: CouchbaseInstrumentation,
    ) -> InstrumentedBucket<Self> {
        InstrumentedBucket::new(self, instrumentation)
    }
}

impl<H: QueryHost + Sized> QueryHostExt for H {}

//! Client-facing seam: the traits a wrapped Couchbase client binding implements
//!
//! The instrumentation does not link against a particular client crate. It wraps
//! anything exposing the dispatch surface of the classic Couchbase SDKs: a
//! cluster-like or bucket-like handle whose query method takes an optional
//! trailing callback and, when no callback is supplied, returns an event emitter
//! instead. Test doubles implement the same traits.

use crate::error::QueryError;
use crate::query::QueryDescriptor;

/// A single result row, as delivered by the client
pub type Row = serde_json::Value;

/// The outcome delivered through the callback idiom
pub type QueryResult = Result<Vec<Row>, QueryError>;

/// Callback-idiom completion handler, invoked exactly once per operation
pub type QueryCallback = Box<dyn FnOnce(QueryResult) + Send>;

/// Listener for non-terminal row events
pub type RowListener = Box<dyn FnMut(&Row) + Send>;

/// Listener for the terminal success event
pub type RowsListener = Box<dyn FnOnce(&[Row]) + Send>;

/// Listener for the terminal error event
pub type ErrorListener = Box<dyn FnOnce(&QueryError) + Send>;

/// Event-idiom completion surface of an in-flight query
///
/// The emitter fires zero or more non-terminal row events followed by exactly
/// one terminal event: either a success event carrying all rows or an error
/// event. Multiple listeners may be registered per event; the client invokes
/// them in registration order.
pub trait QueryEmitter: Send {
    /// Register a listener for non-terminal row events
    fn on_row(&mut self, listener: RowListener);

    /// Register a listener for the terminal success event
    fn on_rows(&mut self, listener: RowsListener);

    /// Register a listener for the terminal error event
    fn on_error(&mut self, listener: ErrorListener);
}

/// A cluster-like or bucket-like handle that dispatches queries
///
/// Both host levels share identical dispatch semantics: when `callback` is
/// supplied the client invokes it exactly once with the outcome and returns
/// `None`; otherwise the call returns the emitter that will deliver completion.
pub trait QueryHost {
    /// Emitter type returned for event-idiom calls
    type Emitter: QueryEmitter;

    /// The bucket this host resolves queries against, when the client can name
    /// it synchronously at call time. Hosts whose connection is still being
    /// established return `None` rather than a placeholder.
    fn bucket_name(&self) -> Option<&str>;

    /// Dispatch a query using the client's own transport
    fn dispatch(
        &self,
        query: &QueryDescriptor,
        callback: Option<QueryCallback>,
    ) -> Option<Self::Emitter>;
}

//! Normalizes the client's two completion idioms into one finish signal
//!
//! A wrapped call completes through exactly one of two delivery paths: a
//! trailing callback invoked once, or a terminal event on the returned emitter.
//! Both paths feed the same idempotent [`PendingSpan`], so neither is treated
//! as primary and arming both for one operation is safe. Caller-observable
//! behavior is preserved: user callbacks and listeners receive the original
//! arguments, unmodified and undelayed, with the issue-time context
//! re-established around the user code.

use crate::client::{ErrorListener, QueryCallback, QueryEmitter, RowListener, RowsListener};
use crate::context::CapturedContext;
use crate::span::PendingSpan;
use std::sync::Arc;

/// Substitute completion callback for the callback idiom
///
/// Finishes the span first, then hands the untouched result to the user's
/// callback inside the captured context.
pub(crate) fn wrap_callback(
    pending: Arc<PendingSpan>,
    captured: CapturedContext,
    user: QueryCallback,
) -> QueryCallback {
    Box::new(move |result| {
        pending.finish(result.as_ref().err());
        captured.scope(move || user(result));
    })
}

/// Emitter handed back to the caller in place of the client's own
///
/// Terminal hooks feeding the span finisher are armed on the inner emitter
/// before the caller can observe it, and they stay armed indefinitely - some
/// client versions are known to delay completion until an unrelated reconnect,
/// and timing that out is not this layer's job. Listener registrations are
/// forwarded to the inner emitter with the listener body wrapped so it runs in
/// the issue-time context.
pub struct InstrumentedEmitter<E> {
    inner: E,
    captured: CapturedContext,
}

impl<E: QueryEmitter> InstrumentedEmitter<E> {
    pub(crate) fn new(mut inner: E, pending: Arc<PendingSpan>, captured: CapturedContext) -> Self {
        let on_success = Arc::clone(&pending);
        inner.on_rows(Box::new(move |_rows| on_success.finish(None)));
        inner.on_error(Box::new(move |error| pending.finish(Some(error))));
        Self { inner, captured }
    }

    /// Wrapper that intercepts nothing, used when no tracer is configured
    pub(crate) fn passthrough(inner: E) -> Self {
        Self {
            inner,
            captured: CapturedContext::empty(),
        }
    }

    /// Register a listener for non-terminal row events
    pub fn on_row(&mut self, mut listener: RowListener) {
        let captured = self.captured.clone();
        self.inner
            .on_row(Box::new(move |row| captured.scope(|| listener(row))));
    }

    /// Register a listener for the terminal success event
    pub fn on_rows(&mut self, listener: RowsListener) {
        let captured = self.captured.clone();
        self.inner
            .on_rows(Box::new(move |rows| captured.scope(move || listener(rows))));
    }

    /// Register a listener for the terminal error event
    pub fn on_error(&mut self, listener: ErrorListener) {
        let captured = self.captured.clone();
        self.inner.on_error(Box::new(move |error| {
            captured.scope(move || listener(error));
        }));
    }

    /// Get a reference to the inner emitter
    #[must_use]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Get a mutable reference to the inner emitter
    ///
    /// Listeners registered directly on the inner emitter bypass context
    /// re-establishment.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }

    /// Consume self and return the inner emitter
    #[must_use]
    pub fn into_inner(self) -> E {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Row;
    use crate::error::QueryError;
    use opentelemetry::global::BoxedTracer;
    use opentelemetry::trace::noop::NoopTracer;
    use opentelemetry::trace::Tracer;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingEmitter {
        row: Vec<RowListener>,
        rows: Vec<RowsListener>,
        error: Vec<ErrorListener>,
    }

    impl QueryEmitter for RecordingEmitter {
        fn on_row(&mut self, listener: RowListener) {
            self.row.push(listener);
        }
        fn on_rows(&mut self, listener: RowsListener) {
            self.rows.push(listener);
        }
        fn on_error(&mut self, listener: ErrorListener) {
            self.error.push(listener);
        }
    }

    fn pending() -> Arc<PendingSpan> {
        let tracer = BoxedTracer::new(Box::new(NoopTracer::new()));
        Arc::new(PendingSpan::new(tracer.start("test")))
    }

    #[test]
    fn test_terminal_hooks_armed_before_user_listeners() {
        let mut emitter =
            InstrumentedEmitter::new(RecordingEmitter::default(), pending(), CapturedContext::empty());
        assert_eq!(emitter.inner().rows.len(), 1);
        assert_eq!(emitter.inner().error.len(), 1);

        emitter.on_rows(Box::new(|_| {}));
        assert_eq!(emitter.inner().rows.len(), 2);
    }

    #[test]
    fn test_listener_receives_identical_payload() {
        let mut emitter =
            InstrumentedEmitter::new(RecordingEmitter::default(), pending(), CapturedContext::empty());

        let seen: Arc<Mutex<Vec<Row>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        emitter.on_rows(Box::new(move |rows| {
            sink.lock().unwrap().extend_from_slice(rows);
        }));

        let delivered = vec![serde_json::json!({"answer": 2})];
        for listener in emitter.into_inner().rows {
            listener(&delivered);
        }
        assert_eq!(*seen.lock().unwrap(), delivered);
    }

    #[test]
    fn test_wrapped_callback_forwards_error_unchanged() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let wrapped = wrap_callback(
            pending(),
            CapturedContext::empty(),
            Box::new(move |result| {
                *sink.lock().unwrap() = Some(result);
            }),
        );

        wrapped(Err(QueryError::with_code(59, "timeout")));
        assert_eq!(
            *seen.lock().unwrap(),
            Some(Err(QueryError::with_code(59, "timeout")))
        );
    }
}

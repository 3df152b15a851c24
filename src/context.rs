//! Active-context capture and scoped re-activation
//!
//! The wrapped client completes operations through callbacks and event emitters,
//! so by the time a completion fires, whatever context is ambient belongs to an
//! unrelated part of the program. Each dispatched operation therefore captures
//! the current [`Context`] by value at issue time and re-attaches it around the
//! caller's own completion handler. Captures are independent snapshots, never a
//! shared mutable slot, so concurrently pending operations cannot clobber one
//! another.

use opentelemetry::Context;

/// Capture/activate policy for the ambient trace context
///
/// With propagation disabled the carrier captures nothing and every scoped
/// activation is a pure no-op: completion handlers then observe whatever
/// context the runtime itself left ambient.
#[derive(Clone, Copy, Debug)]
pub struct ContextCarrier {
    enabled: bool,
}

impl ContextCarrier {
    /// Create a carrier with the given propagation policy
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether context propagation is enabled
    #[must_use]
    pub fn enabled(self) -> bool {
        self.enabled
    }

    /// Snapshot the currently active context
    #[must_use]
    pub fn capture(self) -> CapturedContext {
        CapturedContext {
            context: self.enabled.then(Context::current),
        }
    }

    /// The currently active context
    #[must_use]
    pub fn active(self) -> Context {
        Context::current()
    }
}

impl Default for ContextCarrier {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A context snapshot taken when an operation was issued
///
/// Held by the completion adapter for as long as the operation is pending and
/// re-established at every resumption point inside the caller's callbacks and
/// event listeners.
#[derive(Clone, Debug)]
pub struct CapturedContext {
    context: Option<Context>,
}

impl CapturedContext {
    /// A capture that activates nothing
    pub(crate) fn empty() -> Self {
        Self { context: None }
    }

    /// The captured context, when one was taken
    #[must_use]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Run `f` with the captured context attached, restoring the prior context
    /// once `f` returns. Pass-through when nothing was captured.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.context {
            Some(context) => {
                let _guard = context.clone().attach();
                f()
            }
            None => f(),
        }
    }
}

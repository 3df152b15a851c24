//! Error surface of the wrapped Couchbase client

use std::fmt;

/// Error delivered by the wrapped client for a failed operation
///
/// Mirrors the shape of libcouchbase-style errors: a numeric status code when the
/// client supplies one plus a human-readable message. The instrumentation layer
/// records it on the span and forwards it to the caller untouched - it never
/// intercepts, rewrites, or swallows an operation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    code: Option<u32>,
    message: String,
}

impl QueryError {
    /// Create a new error from a message alone
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create a new error carrying the client's numeric status code
    #[must_use]
    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// The client's numeric status code, if one was supplied
    #[must_use]
    pub fn code(&self) -> Option<u32> {
        self.code
    }

    /// The error message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "couchbase error (code {code}): {}", self.message),
            None => write!(f, "couchbase error: {}", self.message),
        }
    }
}

impl std::error::Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_code() {
        let err = QueryError::new("bucket not found");
        assert_eq!(err.to_string(), "couchbase error: bucket not found");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_display_with_code() {
        let err = QueryError::with_code(59, "query timed out");
        assert_eq!(err.to_string(), "couchbase error (code 59): query timed out");
        assert_eq!(err.code(), Some(59));
        assert_eq!(err.message(), "query timed out");
    }
}

//! Query descriptors and span tag derivation
//!
//! The wrapped client accepts several structurally different query objects. This
//! module represents them as one tagged variant and derives the span metadata
//! (query kind, resource text, design document) from it. Shapes the extractor
//! does not recognize yield no kind or resource tag rather than a guessed one.

use std::fmt;

/// The query classes the instrumentation can classify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// N1QL statement query
    N1ql,
    /// Map/reduce view query
    View,
    /// Full-text search query
    Search,
    /// Analytics (CBAS) statement query
    Cbas,
}

impl QueryKind {
    /// The wire value carried in the `query.type` span tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::N1ql => "n1ql",
            QueryKind::View => "view",
            QueryKind::Search => "search",
            QueryKind::Cbas => "cbas",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query as handed to the wrapped client's dispatch method
#[derive(Debug, Clone, PartialEq)]
pub enum QueryDescriptor {
    /// N1QL statement, e.g. `SELECT 1+1`
    N1ql {
        /// Raw statement text
        statement: String,
    },
    /// View lookup addressed by view name, scoped to a design document when known
    View {
        /// Design document name, when the client resolved one
        ddoc: Option<String>,
        /// View name
        name: String,
    },
    /// Full-text search against a named index
    Search {
        /// Search index name
        index: String,
    },
    /// Analytics statement
    Cbas {
        /// Raw statement text
        statement: String,
    },
    /// A payload the extractor does not recognize; still traced, without kind
    /// or resource tags
    Other(serde_json::Value),
}

impl QueryDescriptor {
    /// N1QL query from raw statement text
    #[must_use]
    pub fn n1ql(statement: impl Into<String>) -> Self {
        QueryDescriptor::N1ql {
            statement: statement.into(),
        }
    }

    /// View query addressed by design document and view name
    #[must_use]
    pub fn view(ddoc: impl Into<String>, name: impl Into<String>) -> Self {
        QueryDescriptor::View {
            ddoc: Some(ddoc.into()),
            name: name.into(),
        }
    }

    /// Search query against a named index
    #[must_use]
    pub fn search(index: impl Into<String>) -> Self {
        QueryDescriptor::Search {
            index: index.into(),
        }
    }

    /// Analytics query from raw statement text
    #[must_use]
    pub fn cbas(statement: impl Into<String>) -> Self {
        QueryDescriptor::Cbas {
            statement: statement.into(),
        }
    }

    /// An unclassified query payload
    #[must_use]
    pub fn other(payload: serde_json::Value) -> Self {
        QueryDescriptor::Other(payload)
    }

    /// The query kind, or `None` for unrecognized payloads
    #[must_use]
    pub fn kind(&self) -> Option<QueryKind> {
        match self {
            QueryDescriptor::N1ql { .. } => Some(QueryKind::N1ql),
            QueryDescriptor::View { .. } => Some(QueryKind::View),
            QueryDescriptor::Search { .. } => Some(QueryKind::Search),
            QueryDescriptor::Cbas { .. } => Some(QueryKind::Cbas),
            QueryDescriptor::Other(_) => None,
        }
    }

    /// The span resource: statement text for n1ql/cbas, index name for search,
    /// view name for view queries
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            QueryDescriptor::N1ql { statement } | QueryDescriptor::Cbas { statement } => {
                Some(statement)
            }
            QueryDescriptor::View { name, .. } => Some(name),
            QueryDescriptor::Search { index } => Some(index),
            QueryDescriptor::Other(_) => None,
        }
    }

    /// Raw statement text for the statement-carrying kinds
    #[must_use]
    pub fn statement(&self) -> Option<&str> {
        match self {
            QueryDescriptor::N1ql { statement } | QueryDescriptor::Cbas { statement } => {
                Some(statement)
            }
            _ => None,
        }
    }

    /// Design document name for view queries, when resolved
    #[must_use]
    pub fn ddoc(&self) -> Option<&str> {
        match self {
            QueryDescriptor::View { ddoc, .. } => ddoc.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n1ql_tags() {
        let query = QueryDescriptor::n1ql("SELECT 1+1");
        assert_eq!(query.kind(), Some(QueryKind::N1ql));
        assert_eq!(query.resource(), Some("SELECT 1+1"));
        assert_eq!(query.statement(), Some("SELECT 1+1"));
        assert_eq!(query.ddoc(), None);
    }

    #[test]
    fn test_view_tags() {
        let query = QueryDescriptor::view("datadoc", "by_name");
        assert_eq!(query.kind(), Some(QueryKind::View));
        assert_eq!(query.resource(), Some("by_name"));
        assert_eq!(query.ddoc(), Some("datadoc"));
        assert_eq!(query.statement(), None);
    }

    #[test]
    fn test_view_without_ddoc() {
        let query = QueryDescriptor::View {
            ddoc: None,
            name: "by_name".to_string(),
        };
        assert_eq!(query.resource(), Some("by_name"));
        assert_eq!(query.ddoc(), None);
    }

    #[test]
    fn test_search_tags() {
        let query = QueryDescriptor::search("test");
        assert_eq!(query.kind(), Some(QueryKind::Search));
        assert_eq!(query.resource(), Some("test"));
    }

    #[test]
    fn test_cbas_tags() {
        let query = QueryDescriptor::cbas("SELECT * FROM datatest");
        assert_eq!(query.kind(), Some(QueryKind::Cbas));
        assert_eq!(query.resource(), Some("SELECT * FROM datatest"));
        assert_eq!(query.statement(), Some("SELECT * FROM datatest"));
    }

    #[test]
    fn test_unrecognized_yields_no_tags() {
        let query = QueryDescriptor::other(serde_json::json!({"statement": "SELECT 1"}));
        assert_eq!(query.kind(), None);
        assert_eq!(query.resource(), None);
        assert_eq!(query.statement(), None);
    }

    #[test]
    fn test_kind_wire_values() {
        assert_eq!(QueryKind::N1ql.as_str(), "n1ql");
        assert_eq!(QueryKind::View.as_str(), "view");
        assert_eq!(QueryKind::Search.as_str(), "search");
        assert_eq!(QueryKind::Cbas.as_str(), "cbas");
    }
}

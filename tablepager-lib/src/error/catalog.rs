//! Catalog endpoint error types

/// Errors raised while running the catalog endpoint.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to bind the listening socket.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to load or encode catalog data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A malformed catalog query. Answered with `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A numeric parameter could not be parsed.
    #[error("invalid {param}: {value}")]
    InvalidNumber {
        /// Parameter name.
        param: &'static str,
        /// Raw value.
        value: String,
    },

    /// `limit` is outside the allowed page sizes.
    #[error("limit must be 5, 10 or 20, got {0}")]
    InvalidLimit(u32),

    /// `filterBy` is not a valid filter set.
    #[error("invalid filterBy: {0}")]
    InvalidFilter(String),
}

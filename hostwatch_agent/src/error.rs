//! Error types for the agent. None of these are fatal to the process.

use thiserror::Error;

/// A sensor query failed; the tick it belonged to is skipped.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("{query} query failed: {reason}")]
    Query { query: &'static str, reason: String },
    #[error("sensor task panicked during {0}")]
    Panicked(&'static str),
}

impl SensorError {
    pub fn query(query: &'static str, reason: impl Into<String>) -> Self {
        SensorError::Query {
            query,
            reason: reason.into(),
        }
    }
}

/// The viewer's push channel went away.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("viewer channel closed")]
    Closed,
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

//! Store abstraction consumed by the lookup service.
//!
//! A `RangeStore` hands out one `RangeConnection` per request. The
//! connection is released when `close()` is called or when it is dropped,
//! whichever comes first, so cancelled requests never leak a connection.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::CameraRange;

/// Errors raised by the range store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached, refused credentials, or the pool
    /// timed out handing out a connection.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The query reached the backend and failed there.
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
}

/// Source of connections to the camera range table.
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Acquire a connection. Does not retry.
    async fn connect(&self) -> Result<Box<dyn RangeConnection>, StoreError>;
}

/// A single acquired connection to the range table.
#[async_trait]
pub trait RangeConnection: Send {
    /// All ranges ordered by `id` ascending.
    async fn query_all(&mut self) -> Result<Vec<CameraRange>, StoreError>;

    /// The range with the given primary key, if any.
    async fn query_by_id(&mut self, id: i32) -> Result<Option<CameraRange>, StoreError>;

    /// Release the connection. Calling it more than once is a no-op.
    async fn close(&mut self) -> Result<(), StoreError>;
}

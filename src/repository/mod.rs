//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM. Supports both SQLite and
//! PostgreSQL backends, chosen from the database URL at runtime.

pub mod diesel_camera_range;
pub mod diesel_context;
pub mod diesel_models;
pub mod diesel_range_import;
#[cfg(feature = "postgres")]
mod pg_tls;
pub mod pool;
pub mod store;
pub mod util;

pub use diesel_camera_range::DieselRangeStore;
pub use diesel_context::DbContext;
pub use diesel_range_import::{DieselRangeImporter, ImportError, ImportReport};
pub use pool::{DbPool, PoolOptions};
pub use store::{RangeConnection, RangeStore, StoreError};

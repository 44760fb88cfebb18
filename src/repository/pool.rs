//! Unified database connection pool supporting SQLite and PostgreSQL.
//!
//! The backend is chosen at runtime from the database URL. PostgreSQL
//! connections come from a bounded deadpool pool; SQLite connections are
//! lightweight and opened per acquisition.

use std::path::Path;
use std::time::Duration;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

#[cfg(feature = "postgres")]
use diesel_async::pooled_connection::deadpool::Pool as DeadPool;
#[cfg(feature = "postgres")]
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
#[cfg(feature = "postgres")]
use diesel_async::AsyncPgConnection;

use super::store::StoreError;
use super::util::{is_postgres_url, sqlite_path};

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Async PostgreSQL connection type.
#[cfg(feature = "postgres")]
pub type PgConn = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Sizing and connection options for the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Connections opened eagerly by `warm_up`.
    pub min_size: usize,
    /// Upper bound on open connections.
    pub max_size: usize,
    /// How long to wait for a free (or new) connection.
    pub acquire_timeout: Duration,
    /// Require TLS for PostgreSQL connections.
    pub tls: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_size: 2,
            max_size: 10,
            acquire_timeout: Duration::from_millis(60_000),
            tls: false,
        }
    }
}

/// SQLite connection source (creates connections on demand).
#[derive(Clone)]
pub struct SqlitePool {
    database_url: String,
}

impl SqlitePool {
    /// Create a new SQLite pool.
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: sqlite_path(database_url).to_string(),
        }
    }

    /// Create pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.display().to_string())
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, StoreError> {
        SqliteConn::establish(&self.database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

/// PostgreSQL connection pool.
#[cfg(feature = "postgres")]
#[derive(Clone)]
pub struct PgPool {
    pool: DeadPool<AsyncPgConnection>,
    min_size: usize,
}

#[cfg(feature = "postgres")]
impl PgPool {
    /// Create a new PostgreSQL pool. No connection is opened yet.
    pub fn new(database_url: &str, options: &PoolOptions) -> Result<Self, StoreError> {
        let manager = if options.tls {
            let mut config = ManagerConfig::default();
            config.custom_setup = Box::new(super::pg_tls::establish_tls_connection);
            AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
                database_url,
                config,
            )
        } else {
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
        };

        let max_size = options.max_size.max(1);
        let pool = DeadPool::builder(manager)
            .max_size(max_size)
            .wait_timeout(Some(options.acquire_timeout))
            .create_timeout(Some(options.acquire_timeout))
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            min_size: options.min_size.min(max_size),
        })
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<PgConn, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    /// Open `min_size` connections and return them to the pool idle.
    pub async fn warm_up(&self) -> Result<usize, StoreError> {
        let mut held = Vec::with_capacity(self.min_size);
        for _ in 0..self.min_size {
            held.push(self.get().await?);
        }
        Ok(held.len())
    }
}

/// Unified database pool that supports both SQLite and PostgreSQL.
#[derive(Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

/// A connection checked out of a `DbPool`.
///
/// Dropping it closes the SQLite connection or returns the PostgreSQL one to
/// its pool.
pub enum DbConn {
    Sqlite(SqliteConn),
    #[cfg(feature = "postgres")]
    Postgres(PgConn),
}

impl DbPool {
    /// Create a pool from a database URL.
    ///
    /// Detects the backend from the URL:
    /// - `postgres://` or `postgresql://` → PostgreSQL
    /// - Everything else → SQLite
    pub fn from_url(url: &str, options: &PoolOptions) -> Result<Self, StoreError> {
        if is_postgres_url(url) {
            #[cfg(feature = "postgres")]
            {
                return Ok(DbPool::Postgres(PgPool::new(url, options)?));
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = options;
                return Err(StoreError::Connection(
                    "PostgreSQL support not compiled. Use --features postgres".to_string(),
                ));
            }
        }

        Ok(DbPool::Sqlite(SqlitePool::new(url)))
    }

    /// Create a SQLite pool from a file path.
    pub fn sqlite_from_path(path: &Path) -> Self {
        DbPool::Sqlite(SqlitePool::from_path(path))
    }

    /// Check if this is a SQLite backend.
    pub fn is_sqlite(&self) -> bool {
        matches!(self, DbPool::Sqlite(_))
    }

    /// Check if this is a PostgreSQL backend.
    #[cfg(feature = "postgres")]
    pub fn is_postgres(&self) -> bool {
        matches!(self, DbPool::Postgres(_))
    }

    /// Check out a connection from whichever backend is configured.
    pub async fn get(&self) -> Result<DbConn, StoreError> {
        match self {
            DbPool::Sqlite(pool) => Ok(DbConn::Sqlite(pool.get().await?)),
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => Ok(DbConn::Postgres(pool.get().await?)),
        }
    }

    /// Pre-open the configured minimum number of connections.
    ///
    /// SQLite has nothing to warm up and reports zero.
    pub async fn warm_up(&self) -> Result<usize, StoreError> {
        match self {
            DbPool::Sqlite(_) => Ok(0),
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => pool.warm_up().await,
        }
    }
}

/// Macro for running database operations on either backend.
///
/// This macro handles the connection dispatch, allowing the same Diesel DSL
/// code to run on both SQLite and PostgreSQL.
///
/// # Example
/// ```ignore
/// with_conn!(self.pool, conn => {
///     rolleiflex_cameras::table.load::<CameraRangeRecord>(&mut conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($pool:expr, $conn:ident => $body:expr) => {{
        match &$pool {
            $crate::repository::pool::DbPool::Sqlite(pool) => {
                let mut $conn = pool.get().await?;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::pool::DbPool::Postgres(pool) => {
                let mut $conn = pool.get().await?;
                $body
            }
        }
    }};
}

/// Macro for running database operations that need different SQL per backend.
///
/// # Example
/// ```ignore
/// with_conn_split!(self.pool,
///     sqlite: conn => {
///         diesel::replace_into(table).values(...).execute(&mut conn).await
///     },
///     postgres: conn => {
///         diesel::insert_into(table).values(...).on_conflict(...).execute(&mut conn).await
///     }
/// )
/// ```
#[macro_export]
macro_rules! with_conn_split {
    ($pool:expr, sqlite: $sqlite_conn:ident => $sqlite_body:expr, postgres: $pg_conn:ident => $pg_body:expr) => {{
        match &$pool {
            $crate::repository::pool::DbPool::Sqlite(pool) => {
                let mut $sqlite_conn = pool.get().await?;
                $sqlite_body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::pool::DbPool::Postgres(pool) => {
                let mut $pg_conn = pool.get().await?;
                $pg_body
            }
        }
    }};
}

/// Macro for running the same Diesel DSL on an already checked-out `DbConn`.
///
/// `$conn` is bound to `&mut` the concrete async connection in each arm.
#[macro_export]
macro_rules! on_db_conn {
    ($db_conn:expr, $conn:ident => $body:expr) => {{
        match $db_conn {
            $crate::repository::pool::DbConn::Sqlite(inner) => {
                let $conn = inner;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::pool::DbConn::Postgres(inner) => {
                let $conn = &mut **inner;
                $body
            }
        }
    }};
}

//! Diesel-backed camera range store.
//!
//! Read-only: the only statements issued here are SELECTs against
//! `rolleiflex_cameras`. Provisioning lives in `diesel_range_import`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::CameraRangeRecord;
use super::pool::{DbConn, DbPool};
use super::store::{RangeConnection, RangeStore, StoreError};
use crate::models::CameraRange;
use crate::on_db_conn;
use crate::schema::rolleiflex_cameras;

/// Range store over the configured database pool.
#[derive(Clone)]
pub struct DieselRangeStore {
    pool: DbPool,
}

impl DieselRangeStore {
    /// Create a new store with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RangeStore for DieselRangeStore {
    async fn connect(&self) -> Result<Box<dyn RangeConnection>, StoreError> {
        let conn = self.pool.get().await?;
        Ok(Box::new(DieselRangeConnection { conn: Some(conn) }))
    }
}

/// One checked-out connection. Releasing it is `close()` or drop.
pub struct DieselRangeConnection {
    conn: Option<DbConn>,
}

impl DieselRangeConnection {
    fn conn(&mut self) -> Result<&mut DbConn, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))
    }
}

#[async_trait]
impl RangeConnection for DieselRangeConnection {
    async fn query_all(&mut self) -> Result<Vec<CameraRange>, StoreError> {
        let records = on_db_conn!(self.conn()?, conn => {
            rolleiflex_cameras::table
                .order(rolleiflex_cameras::id.asc())
                .select(CameraRangeRecord::as_select())
                .load::<CameraRangeRecord>(conn)
                .await
        })?;

        Ok(records.into_iter().map(CameraRange::from).collect())
    }

    async fn query_by_id(&mut self, id: i32) -> Result<Option<CameraRange>, StoreError> {
        let record = on_db_conn!(self.conn()?, conn => {
            rolleiflex_cameras::table
                .find(id)
                .select(CameraRangeRecord::as_select())
                .first::<CameraRangeRecord>(conn)
                .await
                .optional()
        })?;

        Ok(record.map(CameraRange::from))
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        drop(self.conn.take());
        Ok(())
    }
}

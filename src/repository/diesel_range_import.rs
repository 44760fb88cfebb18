//! Out-of-band provisioning of the camera range table.
//!
//! This is the only code path that writes to `rolleiflex_cameras`. It is
//! driven by the `db import` CLI command and is not reachable from the
//! lookup service or the HTTP server.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{info, warn};

use super::diesel_models::NewCameraRange;
use super::pool::DbPool;
use super::store::StoreError;
use crate::models::{CameraRange, RangeValidationError};
use crate::schema::rolleiflex_cameras;
use crate::with_conn_split;

/// Errors raised while importing ranges.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Invalid(#[from] RangeValidationError),
    #[error("duplicate id {0} in import set")]
    DuplicateId(i32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of an import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows written (inserted or replaced).
    pub written: usize,
    /// Pairs of ids from different models whose serial ranges overlap.
    pub overlaps: Vec<(i32, i32)>,
}

/// Writes camera ranges, upserting by primary key.
#[derive(Clone)]
pub struct DieselRangeImporter {
    pool: DbPool,
}

impl DieselRangeImporter {
    /// Create a new importer with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a single range.
    pub async fn upsert(&self, range: &CameraRange) -> Result<(), StoreError> {
        self.upsert_all(std::slice::from_ref(range)).await
    }

    /// Insert or replace every range in one transaction.
    ///
    /// Either all rows are written or, on any failure, none are.
    async fn upsert_all(&self, ranges: &[CameraRange]) -> Result<(), StoreError> {
        let rows: Vec<NewCameraRange<'_>> = ranges.iter().map(NewCameraRange::from).collect();

        with_conn_split!(self.pool,
            sqlite: conn => {
                conn.transaction(|conn| {
                    Box::pin(async move {
                        for row in &rows {
                            diesel::replace_into(rolleiflex_cameras::table)
                                .values(row)
                                .execute(conn)
                                .await?;
                        }
                        Ok::<_, diesel::result::Error>(())
                    })
                })
                .await?;
            },
            postgres: conn => {
                conn.transaction(|conn| {
                    Box::pin(async move {
                        for row in &rows {
                            diesel::insert_into(rolleiflex_cameras::table)
                                .values(row)
                                .on_conflict(rolleiflex_cameras::id)
                                .do_update()
                                .set(row)
                                .execute(conn)
                                .await?;
                        }
                        Ok::<_, diesel::result::Error>(())
                    })
                })
                .await?;
            }
        );

        Ok(())
    }

    /// Validate and write a full set of ranges.
    ///
    /// Every row is validated before anything is written and the writes
    /// share one transaction, so a bad file or a failed write leaves the
    /// table untouched. Overlaps between different model lines are
    /// reported but do not block the import.
    pub async fn import(&self, ranges: &[CameraRange]) -> Result<ImportReport, ImportError> {
        let mut seen = std::collections::HashSet::new();
        for range in ranges {
            range.validate()?;
            if !seen.insert(range.id) {
                return Err(ImportError::DuplicateId(range.id));
            }
        }

        let overlaps = find_cross_model_overlaps(ranges);
        for (a, b) in &overlaps {
            warn!("Ranges {} and {} overlap across different models", a, b);
        }

        self.upsert_all(ranges).await?;
        info!("Imported {} camera ranges", ranges.len());

        Ok(ImportReport {
            written: ranges.len(),
            overlaps,
        })
    }
}

/// Id pairs `(lower, higher)` of overlapping ranges with different model names.
pub fn find_cross_model_overlaps(ranges: &[CameraRange]) -> Vec<(i32, i32)> {
    let mut sorted: Vec<&CameraRange> = ranges.iter().collect();
    sorted.sort_by_key(|r| (r.serial_start, r.id));

    let mut overlaps = Vec::new();
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            // Sorted by start, so the first miss ends the run.
            if !a.overlaps(b) {
                break;
            }
            if a.model_name != b.model_name {
                overlaps.push((a.id.min(b.id), a.id.max(b.id)));
            }
        }
    }
    overlaps.sort_unstable();
    overlaps
}

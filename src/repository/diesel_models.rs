//! Diesel ORM models for the camera range table.

use diesel::prelude::*;

use crate::models::CameraRange;
use crate::schema;

/// Camera range record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::rolleiflex_cameras)]
pub struct CameraRangeRecord {
    pub id: i32,
    pub serial_start: i32,
    pub serial_end: i32,
    pub model_name: String,
    pub year_produced: Option<i32>,
    pub taking_lens: Option<String>,
    pub looking_lens: Option<String>,
    pub description: Option<String>,
}

impl From<CameraRangeRecord> for CameraRange {
    fn from(record: CameraRangeRecord) -> Self {
        CameraRange {
            id: record.id,
            serial_start: record.serial_start,
            serial_end: record.serial_end,
            model_name: record.model_name,
            year_produced: record.year_produced,
            taking_lens: record.taking_lens,
            looking_lens: record.looking_lens,
            description: record.description,
        }
    }
}

/// Camera range row for provisioning (insert or upsert).
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::rolleiflex_cameras)]
#[diesel(treat_none_as_null = true)]
pub struct NewCameraRange<'a> {
    pub id: i32,
    pub serial_start: i32,
    pub serial_end: i32,
    pub model_name: &'a str,
    pub year_produced: Option<i32>,
    pub taking_lens: Option<&'a str>,
    pub looking_lens: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> From<&'a CameraRange> for NewCameraRange<'a> {
    fn from(range: &'a CameraRange) -> Self {
        NewCameraRange {
            id: range.id,
            serial_start: range.serial_start,
            serial_end: range.serial_end,
            model_name: &range.model_name,
            year_produced: range.year_produced,
            taking_lens: range.taking_lens.as_deref(),
            looking_lens: range.looking_lens.as_deref(),
            description: range.description.as_deref(),
        }
    }
}

//! Camera range models.
//!
//! Each row of the range table describes one manufacturing batch: a closed
//! interval of serial numbers and the production metadata shared by every
//! camera stamped within it.

use serde::{Deserialize, Serialize};

/// A contiguous block of serial numbers assigned to one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRange {
    /// Stable primary key.
    pub id: i32,
    /// First serial number in the batch (inclusive).
    pub serial_start: i32,
    /// Last serial number in the batch (inclusive).
    pub serial_end: i32,
    /// Model name, e.g. "Rolleiflex 2.8F".
    pub model_name: String,
    /// Production year, when known.
    #[serde(default)]
    pub year_produced: Option<i32>,
    /// Taking lens designation.
    #[serde(default)]
    pub taking_lens: Option<String>,
    /// Viewing lens designation.
    #[serde(default)]
    pub looking_lens: Option<String>,
    /// Free-form notes about the batch.
    #[serde(default)]
    pub description: Option<String>,
}

/// Reasons a range row is rejected at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeValidationError {
    #[error("range {id}: serial_start {start} is greater than serial_end {end}")]
    InvertedBounds { id: i32, start: i32, end: i32 },
    #[error("range {id}: model_name is empty")]
    EmptyModelName { id: i32 },
}

impl CameraRange {
    /// Create a range with only the required fields set.
    pub fn new(id: i32, serial_start: i32, serial_end: i32, model_name: impl Into<String>) -> Self {
        Self {
            id,
            serial_start,
            serial_end,
            model_name: model_name.into(),
            year_produced: None,
            taking_lens: None,
            looking_lens: None,
            description: None,
        }
    }

    /// Whether `serial` falls inside this batch (both ends inclusive).
    pub fn contains(&self, serial: i32) -> bool {
        self.serial_start <= serial && serial <= self.serial_end
    }

    /// Whether two ranges share at least one serial number.
    pub fn overlaps(&self, other: &CameraRange) -> bool {
        self.serial_start <= other.serial_end && other.serial_start <= self.serial_end
    }

    /// Check the row-level invariants.
    pub fn validate(&self) -> Result<(), RangeValidationError> {
        if self.serial_start > self.serial_end {
            return Err(RangeValidationError::InvertedBounds {
                id: self.id,
                start: self.serial_start,
                end: self.serial_end,
            });
        }
        if self.model_name.trim().is_empty() {
            return Err(RangeValidationError::EmptyModelName { id: self.id });
        }
        Ok(())
    }
}

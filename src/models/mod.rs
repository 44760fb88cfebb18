//! Data models for rolleilookup.

mod camera_range;

pub use camera_range::{CameraRange, RangeValidationError};

//! Serial number range containment search.

use crate::models::CameraRange;

/// Ranges sorted by `(serial_start, id)` for binary search.
#[derive(Debug, Clone, Default)]
pub struct RangeIndex {
    ranges: Vec<CameraRange>,
}

impl RangeIndex {
    pub fn new(mut ranges: Vec<CameraRange>) -> Self {
        ranges.sort_by_key(|r| (r.serial_start, r.id));
        Self { ranges }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range containing `serial`, if any.
    ///
    /// Only ranges sharing the greatest `serial_start <= serial` are
    /// candidates; among those the lowest `id` that contains the serial
    /// wins. A serial swallowed by an earlier, longer range that overlaps
    /// a later start is not found.
    pub fn find(&self, serial: i64) -> Option<&CameraRange> {
        // Nothing stored can reach beyond the column width.
        let serial = i32::try_from(serial).ok()?;

        let upper = self.ranges.partition_point(|r| r.serial_start <= serial);
        let candidate_start = self.ranges.get(upper.checked_sub(1)?)?.serial_start;
        let lower = self
            .ranges
            .partition_point(|r| r.serial_start < candidate_start);

        self.ranges[lower..upper].iter().find(|r| r.contains(serial))
    }
}

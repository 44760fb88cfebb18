//! Response envelope returned by the lookup service.
//!
//! Serializes to the shape API clients already consume:
//! `{"data": [...], "meta": {"pagination": {...}}}` for lists and
//! `{"data": {...}, "meta": {}}` for single records.

use serde::{Deserialize, Serialize};

use crate::models::CameraRange;

/// `data` plus `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub data: LookupData,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LookupData {
    Many(Vec<RangeEntry>),
    One(RangeEntry),
}

/// One record: the primary key plus everything else under `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub id: i32,
    pub attributes: RangeAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAttributes {
    pub serial_start: i32,
    pub serial_end: i32,
    pub model_name: String,
    #[serde(default)]
    pub year_produced: Option<i32>,
    #[serde(default)]
    pub taking_lens: Option<String>,
    #[serde(default)]
    pub looking_lens: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
}

impl Pagination {
    /// Everything on one page.
    pub fn single_page(total: usize) -> Self {
        Self {
            page: 1,
            page_size: total,
            page_count: 1,
            total,
        }
    }
}

impl From<CameraRange> for RangeEntry {
    fn from(range: CameraRange) -> Self {
        RangeEntry {
            id: range.id,
            attributes: RangeAttributes {
                serial_start: range.serial_start,
                serial_end: range.serial_end,
                model_name: range.model_name,
                year_produced: range.year_produced,
                taking_lens: range.taking_lens,
                looking_lens: range.looking_lens,
                description: range.description,
            },
        }
    }
}

impl From<RangeEntry> for CameraRange {
    fn from(entry: RangeEntry) -> Self {
        let attrs = entry.attributes;
        CameraRange {
            id: entry.id,
            serial_start: attrs.serial_start,
            serial_end: attrs.serial_end,
            model_name: attrs.model_name,
            year_produced: attrs.year_produced,
            taking_lens: attrs.taking_lens,
            looking_lens: attrs.looking_lens,
            description: attrs.description,
        }
    }
}

impl LookupResult {
    /// List form with single-page pagination.
    pub fn many(ranges: Vec<CameraRange>) -> Self {
        let entries: Vec<RangeEntry> = ranges.into_iter().map(RangeEntry::from).collect();
        let pagination = Pagination::single_page(entries.len());
        Self {
            data: LookupData::Many(entries),
            meta: Meta {
                pagination: Some(pagination),
            },
        }
    }

    /// Point form with empty metadata.
    pub fn one(range: CameraRange) -> Self {
        Self {
            data: LookupData::One(RangeEntry::from(range)),
            meta: Meta::default(),
        }
    }

    /// Entries in the result, one for the point form.
    pub fn entries(&self) -> &[RangeEntry] {
        match &self.data {
            LookupData::Many(entries) => entries,
            LookupData::One(entry) => std::slice::from_ref(entry),
        }
    }

    /// Consume the result into domain records.
    pub fn into_ranges(self) -> Vec<CameraRange> {
        match self.data {
            LookupData::Many(entries) => entries.into_iter().map(CameraRange::from).collect(),
            LookupData::One(entry) => vec![CameraRange::from(entry)],
        }
    }
}

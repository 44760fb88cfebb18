//! Lookup service: the read-only API contract over the range store.

mod error;
mod lookup;
mod range_index;
mod result;

pub use error::{LookupError, Mutation};
pub use lookup::LookupService;
pub use range_index::RangeIndex;
pub use result::{LookupData, LookupResult, Meta, Pagination, RangeAttributes, RangeEntry};

//! Recipient aggregation.
//!
//! Raw sources flow through:
//! 1. `loader` — one delimited file → recipients with a source label
//! 2. `merge` — dedup by normalized email, tag union, field backfill
//! 3. `filter` — target-tag predicate over the merged set

pub mod columns;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;

pub use filter::{MatchMode, filter_by_tags};
pub use loader::{load_all, load_source};
pub use merge::{RecipientMerger, merge_sources};
pub use model::{RawRecord, Recipient, TagSet, normalize_email};

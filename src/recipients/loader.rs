//! Source loader — reads one delimited recipient file into recipients.
//!
//! A missing or unreadable source is logged and contributes nothing; it never
//! aborts loading of the other sources.

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::SourceSpec;
use crate::error::SourceError;

use super::columns::{EMAIL_COLUMNS, TAG_COLUMNS, canonical_field, find_column, normalize_column};
use super::model::{RawRecord, Recipient, TagSet};

/// Load one source. Returns an empty list if the source is absent or unreadable.
pub fn load_source(path: &Path, label: &str) -> Vec<Recipient> {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(SourceError::NotFound(path)) => {
            warn!(source = label, path = %path.display(), "Recipient source not found");
            return Vec::new();
        }
        Err(e) => {
            warn!(source = label, path = %path.display(), error = %e, "Failed to load recipient source");
            return Vec::new();
        }
    };

    let total = records.len();
    let recipients: Vec<Recipient> = records
        .iter()
        .filter_map(|record| to_recipient(record, label))
        .collect();

    info!(
        source = label,
        path = %path.display(),
        loaded = recipients.len(),
        dropped = total - recipients.len(),
        "Loaded recipient source"
    );
    recipients
}

/// Load every source in order. The result keeps one entry per source.
pub fn load_all(specs: &[SourceSpec]) -> Vec<Vec<Recipient>> {
    specs
        .iter()
        .map(|spec| load_source(&spec.path, &spec.label))
        .collect()
}

/// Read all rows of a source file.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    parse_records(file)
}

/// Parse delimited text with a header row. Short rows simply lack trailing columns.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(RawRecord::from_pairs(
            headers.iter().zip(row.iter()).map(|(h, v)| (h, v)),
        ));
    }
    Ok(records)
}

/// Convert a raw row into a recipient tagged with `source`.
///
/// Rows without a resolvable email are dropped (returns `None`).
pub fn to_recipient(record: &RawRecord, source: &str) -> Option<Recipient> {
    let Some(email) = find_column(record, EMAIL_COLUMNS) else {
        debug!(source, "Dropping row without an email address");
        return None;
    };
    let tags = find_column(record, TAG_COLUMNS);

    let mut recipient = Recipient::new(email.value, source);
    if let Some(hit) = tags {
        recipient.tags = TagSet::parse(hit.value);
    }

    for (index, (column, value)) in record.iter().enumerate() {
        if index == email.index || tags.is_some_and(|hit| hit.index == index) {
            continue;
        }
        let normalized = normalize_column(column);
        if normalized.is_empty() || TAG_COLUMNS.iter().any(|p| p.matches(&normalized)) {
            continue;
        }
        let key = canonical_field(&normalized);
        // First non-empty value wins when two columns fold onto one field.
        let slot = recipient.fields.entry(key).or_default();
        if slot.trim().is_empty() {
            *slot = value.to_string();
        }
    }

    Some(recipient)
}

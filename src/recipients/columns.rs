//! Column-name heuristics for heterogeneous recipient sources.
//!
//! Each lookup is an ordered table of predicates evaluated in priority order;
//! the first predicate with a non-empty hit wins. Nothing here touches files.

use super::model::{FIELD_COMPANY, FIELD_INDUSTRY, FIELD_NAME, FIELD_POSITION_TYPE, RawRecord};

/// A test applied to a normalized column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPredicate {
    /// Column name equals this string.
    Exact(&'static str),
    /// Column name contains this substring.
    Contains(&'static str),
}

impl ColumnPredicate {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            ColumnPredicate::Exact(name) => normalized == *name,
            ColumnPredicate::Contains(part) => normalized.contains(part),
        }
    }
}

/// Email column lookup: `email` / `e-mail` first, then any column mentioning email.
pub const EMAIL_COLUMNS: &[ColumnPredicate] = &[
    ColumnPredicate::Exact("email"),
    ColumnPredicate::Exact("e_mail"),
    ColumnPredicate::Contains("email"),
];

/// Tag column lookup, first present wins.
pub const TAG_COLUMNS: &[ColumnPredicate] = &[
    ColumnPredicate::Exact("tags"),
    ColumnPredicate::Exact("tag"),
    ColumnPredicate::Exact("labels"),
    ColumnPredicate::Exact("categories"),
];

/// Aliases folded onto the semantic recipient fields.
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    (FIELD_NAME, &["name", "full_name", "contact_name", "recipient_name"]),
    (
        FIELD_COMPANY,
        &["company", "company_name", "organization", "organisation", "employer"],
    ),
    (FIELD_POSITION_TYPE, &["position_type", "position", "role"]),
    (FIELD_INDUSTRY, &["industry", "sector"]),
];

/// Normalize a header: strip BOM, trim, lower-case, and turn spaces/hyphens into `_`.
pub fn normalize_column(name: &str) -> String {
    let cleaned = name.trim_start_matches('\u{feff}').trim().to_lowercase();
    let mut out = String::with_capacity(cleaned.len());
    let mut last_sep = false;
    for ch in cleaned.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_sep {
                out.push('_');
            }
            last_sep = true;
        } else {
            out.push(ch);
            last_sep = false;
        }
    }
    out
}

/// Semantic field name for a normalized column, or the column itself.
pub fn canonical_field(normalized: &str) -> String {
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized))
        .map(|(field, _)| field.to_string())
        .unwrap_or_else(|| normalized.to_string())
}

/// A column selected by a predicate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHit<'a> {
    /// Index of the column in the record.
    pub index: usize,
    pub value: &'a str,
}

/// First non-empty column matching `predicates`, in priority then header order.
pub fn find_column<'a>(record: &'a RawRecord, predicates: &[ColumnPredicate]) -> Option<ColumnHit<'a>> {
    for predicate in predicates {
        for (index, (column, value)) in record.iter().enumerate() {
            let value = value.trim();
            if !value.is_empty() && predicate.matches(&normalize_column(column)) {
                return Some(ColumnHit { index, value });
            }
        }
    }
    None
}

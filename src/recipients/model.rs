//! Recipient data model — raw source rows, canonical recipients and tag sets.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic field holding the recipient's display name.
pub const FIELD_NAME: &str = "name";
/// Semantic field holding the recipient's company.
pub const FIELD_COMPANY: &str = "company";
/// Semantic field holding the kind of position being discussed.
pub const FIELD_POSITION_TYPE: &str = "position_type";
/// Semantic field holding the recipient's industry.
pub const FIELD_INDUSTRY: &str = "industry";

/// One row as read from a tabular source, in header order.
///
/// Column names are kept as written; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    columns: Vec<(String, String)>,
}

impl RawRecord {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of the first column whose name equals `column`, ignoring case.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Case-insensitive set of tags that keeps the first-seen casing for display.
///
/// Entries are kept sorted by their lower-cased form, so `Display` yields the
/// sorted, comma-joined representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a free-text tag cell. Tags are separated by `,` or `;`.
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::new();
        for tag in raw.split([',', ';']) {
            set.insert(tag);
        }
        set
    }

    /// Insert a tag. Returns `false` if it was blank or already present (in any case).
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        let key = tag.to_lowercase();
        match self.0.binary_search_by(|t| t.to_lowercase().cmp(&key)) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, tag.to_string());
                true
            }
        }
    }

    /// Fold every tag of `other` into this set.
    pub fn union_with(&mut self, other: &TagSet) {
        for tag in &other.0 {
            self.insert(tag);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        let key = tag.trim().to_lowercase();
        self.0.iter().any(|t| t.to_lowercase() == key)
    }

    /// Lower-cased tags, for matching.
    pub fn normalized(&self) -> HashSet<String> {
        self.0.iter().map(|t| t.to_lowercase()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Canonical, deduplicated contact keyed by normalized email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Lower-cased, trimmed address. Unique across a merged set.
    pub email: String,
    /// Semantic and pass-through fields keyed by normalized column name.
    pub fields: BTreeMap<String, String>,
    pub tags: TagSet,
    /// Label of the first source that produced this email.
    pub source: String,
}

impl Recipient {
    pub fn new(email: &str, source: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            fields: BTreeMap::new(),
            tags: TagSet::new(),
            source: source.into(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, raw: &str) -> Self {
        self.tags = TagSet::parse(raw);
        self
    }

    /// Non-empty value of a field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.field(FIELD_NAME)
    }

    pub fn company(&self) -> Option<&str> {
        self.field(FIELD_COMPANY)
    }

    pub fn position_type(&self) -> Option<&str> {
        self.field(FIELD_POSITION_TYPE)
    }

    pub fn industry(&self) -> Option<&str> {
        self.field(FIELD_INDUSTRY)
    }

    /// Name if known, otherwise the email address.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(&self.email)
    }

    /// Template variables: every field plus `email` and `tags`.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.fields.clone();
        vars.insert("email".into(), self.email.clone());
        vars.insert("tags".into(), self.tags.to_string());
        vars
    }
}

/// Merge key for an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

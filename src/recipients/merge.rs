//! Recipient merger — dedup across sources by normalized email.
//!
//! Sources are folded in priority order. Tags are unioned; other fields are
//! backfilled only where the existing recipient has nothing. Output order is
//! unspecified.

use std::collections::HashMap;

use tracing::debug;

use super::model::{Recipient, normalize_email};

/// Accumulates recipients from successive sources.
#[derive(Debug, Default)]
pub struct RecipientMerger {
    by_email: HashMap<String, Recipient>,
}

impl RecipientMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one source's records into the merged set.
    pub fn fold<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Recipient>,
    {
        for mut incoming in records {
            let key = normalize_email(&incoming.email);
            if key.is_empty() {
                continue;
            }
            match self.by_email.get_mut(&key) {
                None => {
                    incoming.email = key.clone();
                    self.by_email.insert(key, incoming);
                }
                Some(existing) => {
                    debug!(email = %key, source = %incoming.source, "Merging duplicate recipient");
                    merge_into(existing, incoming);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    /// The canonical set, one recipient per email.
    pub fn finish(self) -> Vec<Recipient> {
        self.by_email.into_values().collect()
    }
}

/// Merge sources given in priority order (primary first).
pub fn merge_sources<I>(sources: I) -> Vec<Recipient>
where
    I: IntoIterator<Item = Vec<Recipient>>,
{
    let mut merger = RecipientMerger::new();
    for source in sources {
        merger.fold(source);
    }
    merger.finish()
}

fn merge_into(existing: &mut Recipient, incoming: Recipient) {
    existing.tags.union_with(&incoming.tags);

    for (key, value) in incoming.fields {
        if value.trim().is_empty() {
            continue;
        }
        let slot = existing.fields.entry(key).or_default();
        if slot.trim().is_empty() {
            *slot = value;
        }
    }

    if existing.source.trim().is_empty() {
        existing.source = incoming.source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(set: &'a [Recipient], email: &str) -> &'a Recipient {
        set.iter().find(|r| r.email == email).unwrap()
    }

    #[test]
    fn emails_differing_only_in_case_merge_to_one() {
        let primary = vec![Recipient::new("Jane@Example.com", "primary")];
        let secondary = vec![Recipient::new("jane@example.COM ", "secondary")];
        let merged = merge_sources([primary, secondary]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].email, "jane@example.com");
        assert_eq!(merged[0].source, "primary");
    }

    #[test]
    fn tags_are_unioned_sorted() {
        let primary = vec![Recipient::new("a@x.io", "primary").with_tags("startup")];
        let secondary = vec![Recipient::new("A@x.io", "secondary").with_tags("Remote,STARTUP")];
        let merged = merge_sources([primary.clone(), secondary.clone()]);
        let r = find(&merged, "a@x.io");
        assert_eq!(r.tags.to_string(), "Remote,startup");
        assert!(r.tags.normalized().is_superset(&primary[0].tags.normalized()));
        assert!(r.tags.normalized().is_superset(&secondary[0].tags.normalized()));
    }

    #[test]
    fn later_sources_only_backfill_missing_fields() {
        let primary = vec![
            Recipient::new("a@x.io", "primary")
                .with_field("name", "Ann")
                .with_field("company", ""),
        ];
        let secondary = vec![
            Recipient::new("a@x.io", "secondary")
                .with_field("name", "Annabel")
                .with_field("company", "Acme")
                .with_field("industry", "Fintech"),
        ];
        let merged = merge_sources([primary, secondary]);
        let r = find(&merged, "a@x.io");
        assert_eq!(r.name(), Some("Ann"));
        assert_eq!(r.company(), Some("Acme"));
        assert_eq!(r.industry(), Some("Fintech"));
    }

    #[test]
    fn empty_incoming_values_do_not_clear_existing() {
        let primary = vec![Recipient::new("a@x.io", "primary").with_field("company", "Acme")];
        let secondary = vec![Recipient::new("a@x.io", "extra").with_field("company", "")];
        let merged = merge_sources([primary, secondary]);
        assert_eq!(find(&merged, "a@x.io").company(), Some("Acme"));
    }

    #[test]
    fn distinct_emails_are_all_kept() {
        let merged = merge_sources([
            vec![Recipient::new("a@x.io", "primary"), Recipient::new("b@x.io", "primary")],
            vec![Recipient::new("c@x.io", "extra"), Recipient::new("B@X.IO", "extra")],
        ]);
        assert_eq!(merged.len(), 3);
        assert_eq!(find(&merged, "c@x.io").source, "extra");
        assert_eq!(find(&merged, "b@x.io").source, "primary");
    }

    #[test]
    fn duplicates_within_one_source_collapse() {
        let merged = merge_sources([vec![
            Recipient::new("a@x.io", "primary").with_tags("one"),
            Recipient::new("a@x.io", "primary").with_tags("two"),
        ]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].tags.len(), 2);
    }
}

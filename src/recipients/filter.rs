//! Tag filter — selects the merged recipients a campaign targets.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::model::Recipient;

/// How target tags are compared against a recipient's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Any shared tag matches.
    #[default]
    Any,
    /// Every target tag must be present.
    All,
    /// Targeting is keyword-driven elsewhere; the tag filter is bypassed.
    Keywords,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Any => "any",
            MatchMode::All => "all",
            MatchMode::Keywords => "keywords",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(MatchMode::Any),
            "all" => Ok(MatchMode::All),
            "keywords" => Ok(MatchMode::Keywords),
            other => Err(format!(
                "unknown tag match mode '{other}' (expected any, all or keywords)"
            )),
        }
    }
}

/// Does a single recipient satisfy the target tags?
///
/// `targets` must already be lower-cased and non-empty.
fn matches(recipient: &Recipient, targets: &HashSet<String>, mode: MatchMode) -> bool {
    if recipient.tags.is_empty() {
        return false;
    }
    let tags = recipient.tags.normalized();
    match mode {
        MatchMode::Any => !tags.is_disjoint(targets),
        MatchMode::All => tags.is_superset(targets),
        MatchMode::Keywords => true,
    }
}

/// Keep the recipients matching `target_tags` under `mode`.
///
/// An empty target list or `keywords` mode returns the input unchanged.
pub fn filter_by_tags(
    recipients: Vec<Recipient>,
    target_tags: &[String],
    mode: MatchMode,
) -> Vec<Recipient> {
    let targets: HashSet<String> = target_tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if mode == MatchMode::Keywords || targets.is_empty() {
        return recipients;
    }

    let before = recipients.len();
    let kept: Vec<Recipient> = recipients
        .into_iter()
        .filter(|r| matches(r, &targets, mode))
        .collect();

    info!(
        mode = %mode,
        targets = targets.len(),
        kept = kept.len(),
        excluded = before - kept.len(),
        "Applied tag filter"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(email: &str, tags: &str) -> Recipient {
        Recipient::new(email, "primary").with_tags(tags)
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_mode_requires_every_target() {
        let input = vec![
            recipient("a@x.io", "startup"),
            recipient("b@x.io", "Startup,Remote,fintech"),
        ];
        let kept = filter_by_tags(input, &tags(&["startup", "remote"]), MatchMode::All);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].email, "b@x.io");
    }

    #[test]
    fn any_mode_matches_case_insensitively() {
        let input = vec![recipient("a@x.io", "REMOTE"), recipient("b@x.io", "onsite")];
        let kept = filter_by_tags(input, &tags(&["remote", "startup"]), MatchMode::Any);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].email, "a@x.io");
        // Display casing survives filtering.
        assert_eq!(kept[0].tags.to_string(), "REMOTE");
    }

    #[test]
    fn empty_targets_are_identity() {
        let input = vec![recipient("a@x.io", ""), recipient("b@x.io", "x")];
        let kept = filter_by_tags(input.clone(), &[], MatchMode::Any);
        assert_eq!(kept, input);
        let blank = filter_by_tags(input.clone(), &tags(&["  "]), MatchMode::All);
        assert_eq!(blank, input);
    }

    #[test]
    fn keywords_mode_bypasses_filter() {
        let input = vec![recipient("a@x.io", ""), recipient("b@x.io", "other")];
        let kept = filter_by_tags(input.clone(), &tags(&["startup"]), MatchMode::Keywords);
        assert_eq!(kept, input);
    }

    #[test]
    fn untagged_recipients_never_match_targets() {
        let input = vec![recipient("a@x.io", "")];
        assert!(filter_by_tags(input.clone(), &tags(&["startup"]), MatchMode::Any).is_empty());
        assert!(filter_by_tags(input, &tags(&["startup"]), MatchMode::All).is_empty());
    }

    #[test]
    fn parses_match_modes() {
        assert_eq!("ANY".parse::<MatchMode>().unwrap(), MatchMode::Any);
        assert_eq!("".parse::<MatchMode>().unwrap(), MatchMode::Any);
        assert_eq!(" all ".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert_eq!("keywords".parse::<MatchMode>().unwrap(), MatchMode::Keywords);
        assert!("some".parse::<MatchMode>().is_err());
    }
}

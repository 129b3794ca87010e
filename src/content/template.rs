//! Literal template substitution.
//!
//! Placeholders are `{key}` or `{{key}}`; keys are matched case-insensitively
//! against recipient fields and sender `my_*` fields. Unknown placeholders are
//! left untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::SenderProfile;
use crate::recipients::Recipient;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{?\s*([A-Za-z][A-Za-z0-9_]*)\s*\}?\}").unwrap());

/// Fallbacks for semantic fields a source may not provide.
const FIELD_DEFAULTS: &[(&str, &str)] = &[
    ("name", "Hiring Manager"),
    ("company", "your company"),
    ("position_type", "software engineering"),
    ("my_title", "software developer"),
];

/// Recipient and sender variables, without defaults.
pub fn variables(recipient: &Recipient, profile: &SenderProfile) -> BTreeMap<String, String> {
    let mut vars: BTreeMap<String, String> = recipient
        .variables()
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();
    vars.extend(profile.variables());
    vars
}

/// Variables with documented fallbacks filled in for blank semantic fields.
pub fn with_defaults(recipient: &Recipient, profile: &SenderProfile) -> BTreeMap<String, String> {
    let mut vars = variables(recipient, profile);
    for (key, fallback) in FIELD_DEFAULTS {
        let slot = vars.entry(key.to_string()).or_default();
        if slot.trim().is_empty() {
            *slot = fallback.to_string();
        }
    }
    vars
}

/// Trimmed value of a variable, empty when absent.
pub fn lookup<'a>(vars: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    vars.get(key).map(|v| v.trim()).unwrap_or_default()
}

/// Substitute `{key}` placeholders.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = caps[1].to_lowercase();
            match vars.get(&key) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Subject used when none is configured, derived from the company name.
pub fn default_subject(recipient: &Recipient) -> String {
    match recipient.company() {
        Some(company) => format!("Exploring opportunities at {company}"),
        None => "Exploring opportunities with your team".to_string(),
    }
}

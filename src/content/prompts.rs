//! Prompt construction and response parsing for generated outreach.

use std::collections::BTreeMap;

use crate::config::SenderProfile;
use crate::recipients::Recipient;

use super::template::{lookup, with_defaults};
use super::types::ContentCandidate;

pub const COLD_EMAIL_SYSTEM: &str = "You are an expert at writing professional cold emails for job seeking. \
Write compelling, personalized emails that get responses. Be concise and action-oriented.";

pub const PERSONALIZE_SYSTEM: &str = "You are helping personalize message templates. \
Fill in the template naturally and ensure it flows well. Output only the final message.";

/// Prompt asking for a cold email in `SUBJECT:` / `BODY:` form.
pub fn cold_email_prompt(recipient: &Recipient, profile: &SenderProfile) -> String {
    let vars = with_defaults(recipient, profile);
    let get = |key| lookup(&vars, key);

    let mut prompt = format!(
        "Generate a cold email for job opportunities:\n\n\
         Recipient: {name}\n\
         Company: {company}\n\
         Position Type: {position}\n",
        name = get("name"),
        company = get("company"),
        position = get("position_type"),
    );
    if let Some(industry) = recipient.industry() {
        prompt.push_str(&format!("Industry: {industry}\n"));
    }
    prompt.push_str(&format!(
        "\nMy Name: {my_name}\n\
         My Skills: {skills}\n\
         My Experience: {experience}\n\n\
         Generate:\n\
         1. Subject line (under 60 characters)\n\
         2. Email body (under 300 words)\n\n\
         Format as:\n\
         SUBJECT: [subject line]\n\
         BODY:\n\
         [email body]",
        my_name = get("my_name"),
        skills = get("my_skills"),
        experience = get("my_experience"),
    ));
    prompt
}

/// Prompt asking the model to fill a template with the given variables.
pub fn personalize_prompt(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut listed = String::new();
    for (key, value) in variables {
        if !value.trim().is_empty() {
            listed.push_str(&format!("{key}: {value}\n"));
        }
    }
    format!(
        "Personalize this template with the following information:\n\n\
         Template:\n{template}\n\n\
         Variables:\n{listed}\n\
         Generate the final personalized message."
    )
}

/// Split a `SUBJECT: ... BODY: ...` response into a candidate.
///
/// Without a `BODY:` marker the whole text is the body and the subject is
/// left empty. Returns `None` when nothing usable remains.
pub fn parse_candidate(text: &str, model_label: &str) -> Option<ContentCandidate> {
    let text = text.trim();
    let (subject, body) = match text.split_once("BODY:") {
        Some((head, body)) => (head.replace("SUBJECT:", ""), body.to_string()),
        None => (String::new(), text.to_string()),
    };

    let candidate = ContentCandidate::new(subject.trim(), body.trim(), model_label);
    (!candidate.is_empty()).then_some(candidate)
}

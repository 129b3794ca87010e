//! Candidate scoring and best-candidate selection.
//!
//! Scoring is a pure function of the candidate text and the recipient
//! profile. Selection keeps the first candidate among equal top scores.

use crate::recipients::Recipient;

use super::types::ContentCandidate;

/// Body word count that earns the length bonus (inclusive).
pub const BODY_WORDS_MIN: usize = 40;
pub const BODY_WORDS_MAX: usize = 320;

/// Substrings that mark placeholder or boilerplate output.
pub const PLACEHOLDER_MARKERS: &[&str] = &["unknown", "lorem", "subject:"];

/// A candidate together with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: ContentCandidate,
    pub score: i32,
}

/// Score a candidate against a recipient.
pub fn score_candidate(candidate: &ContentCandidate, recipient: &Recipient) -> i32 {
    let subject = candidate.subject.trim();
    let body = candidate.body.trim();
    let text = format!("{subject}\n{body}").to_lowercase();

    let mentions = |value: Option<&str>| {
        value
            .map(|v| v.trim().to_lowercase())
            .is_some_and(|v| !v.is_empty() && text.contains(&v))
    };

    let mut score = 0;
    if !subject.is_empty() {
        score += 2;
    }
    if !body.is_empty() {
        score += 2;
    }
    if mentions(recipient.company()) {
        score += 2;
    }
    if mentions(recipient.name()) {
        score += 1;
    }
    if mentions(recipient.position_type()) {
        score += 1;
    }
    let words = body.split_whitespace().count();
    if (BODY_WORDS_MIN..=BODY_WORDS_MAX).contains(&words) {
        score += 1;
    }
    if PLACEHOLDER_MARKERS.iter().any(|m| text.contains(m)) {
        score -= 2;
    }
    score
}

/// Highest-scoring candidate under `score`, first one wins on ties.
///
/// Empty candidates are discarded before scoring.
pub fn select_best_by<F>(candidates: Vec<ContentCandidate>, mut score: F) -> Option<ScoredCandidate>
where
    F: FnMut(&ContentCandidate) -> i32,
{
    let mut best: Option<ScoredCandidate> = None;
    for candidate in candidates.into_iter().filter(|c| !c.is_empty()) {
        let value = score(&candidate);
        if best.as_ref().is_none_or(|b| value > b.score) {
            best = Some(ScoredCandidate {
                candidate,
                score: value,
            });
        }
    }
    best
}

/// Best candidate for a recipient.
pub fn select_best(candidates: Vec<ContentCandidate>, recipient: &Recipient) -> Option<ScoredCandidate> {
    select_best_by(candidates, |c| score_candidate(c, recipient))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> Recipient {
        Recipient::new("ann@acme.io", "primary")
            .with_field("name", "Ann")
            .with_field("company", "Acme")
            .with_field("position_type", "Backend")
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn full_marks_for_targeted_candidate() {
        let body = format!("Hi Ann, I'd love to join Acme as a Backend engineer. {}", words(40));
        let c = ContentCandidate::new("Backend at Acme", body, "m");
        assert_eq!(score_candidate(&c, &ann()), 2 + 2 + 2 + 1 + 1 + 1);
    }

    #[test]
    fn word_count_bounds_are_inclusive() {
        let r = Recipient::new("x@y.io", "primary");
        let at_min = ContentCandidate::new("", words(40), "m");
        let at_max = ContentCandidate::new("", words(320), "m");
        let over = ContentCandidate::new("", words(321), "m");
        let under = ContentCandidate::new("", words(39), "m");
        assert_eq!(score_candidate(&at_min, &r), 3);
        assert_eq!(score_candidate(&at_max, &r), 3);
        assert_eq!(score_candidate(&over, &r), 2);
        assert_eq!(score_candidate(&under, &r), 2);
    }

    #[test]
    fn placeholder_text_is_penalized_once() {
        let r = Recipient::new("x@y.io", "primary");
        let c = ContentCandidate::new("Subject: Lorem", "Unknown company lorem ipsum", "m");
        assert_eq!(score_candidate(&c, &r), 2 + 2 - 2);
    }

    #[test]
    fn scoring_is_deterministic() {
        let c = ContentCandidate::new("Hello Acme", "Hi Ann", "m");
        let first = score_candidate(&c, &ann());
        for _ in 0..10 {
            assert_eq!(score_candidate(&c, &ann()), first);
        }
    }

    #[test]
    fn ties_keep_first_encountered() {
        let candidates = vec![
            ContentCandidate::new("", "Generic hello", "a"),
            ContentCandidate::new("Hello Ann", "Quick note.", "b"),
            ContentCandidate::new("Hi", "Ann, a quick note", "c"),
        ];
        let scores: Vec<i32> = candidates.iter().map(|c| score_candidate(c, &ann())).collect();
        assert_eq!(scores, vec![2, 5, 5]);

        let best = select_best(candidates, &ann()).unwrap();
        assert_eq!(best.candidate.model_label, "b");
        assert_eq!(best.score, 5);
    }

    #[test]
    fn empty_candidates_are_discarded_before_scoring() {
        let mut calls = 0;
        let best = select_best_by(
            vec![
                ContentCandidate::new(" ", "", "empty"),
                ContentCandidate::new("s", "", "real"),
            ],
            |_| {
                calls += 1;
                0
            },
        );
        assert_eq!(calls, 1);
        assert_eq!(best.unwrap().candidate.model_label, "real");
    }

    #[test]
    fn no_candidates_means_no_selection() {
        assert!(select_best(Vec::new(), &ann()).is_none());
        assert!(select_best(vec![ContentCandidate::new("", "", "m")], &ann()).is_none());
    }
}

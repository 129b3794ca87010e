//! Message content: templates, AI generation, candidate scoring, HTML rendering.

pub mod html;
pub mod prompts;
pub mod scoring;
pub mod selector;
pub mod template;
pub mod types;

pub use scoring::{ScoredCandidate, score_candidate, select_best};
pub use selector::{AiAvailability, ContentSelector, SelectorConfig};
pub use types::{ContentCandidate, ContentOrigin, MessageContent};

//! Outreach Campaign — tag-targeted, rate-limited email outreach.

pub mod attachments;
pub mod campaign;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod recipients;
pub mod transport;

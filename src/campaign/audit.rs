//! Append-only audit log of successful sends.
//!
//! One CSV row per send: timestamp (RFC 3339), recipient email, recipient
//! name, subject, company. The header is written once, when the file is
//! created.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CampaignError;
use crate::recipients::{Recipient, normalize_email};

/// One successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub company: String,
}

impl AuditRecord {
    pub fn new(recipient: &Recipient, subject: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            recipient_email: recipient.email.clone(),
            recipient_name: recipient.name().unwrap_or_default().to_string(),
            subject: subject.to_string(),
            company: recipient.company().unwrap_or_default().to_string(),
        }
    }
}

/// Single-writer handle on the audit file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file (and its header) if needed.
    pub fn append(&self, record: &AuditRecord) -> Result<(), CampaignError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record).map_err(|e| self.error(e))?;
        writer.flush().map_err(|e| self.error(e))?;
        Ok(())
    }

    /// Every record in the log. A missing file reads as empty.
    pub fn read_records(&self) -> Result<Vec<AuditRecord>, CampaignError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.error(e))?;
        reader
            .deserialize::<AuditRecord>()
            .map(|row| row.map_err(|e| self.error(e)))
            .collect()
    }

    /// Normalized addresses already contacted.
    pub fn contacted_emails(&self) -> Result<HashSet<String>, CampaignError> {
        Ok(self
            .read_records()?
            .into_iter()
            .map(|r| normalize_email(&r.recipient_email))
            .collect())
    }

    fn error(&self, e: impl ToString) -> CampaignError {
        CampaignError::Audit {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::Result, utils::time};

/// One line of the ledger's change log: who did what, with a free-form detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(user: impl Into<String>, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            action: action.into(),
            details: details.into(),
            timestamp: time::now(),
        }
    }
}

/// Append-only collection of audit entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    pub entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: AuditEntry) {
        tracing::info!("📝 [{}] {} - {}", entry.action, entry.user, entry.details);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for a given action, oldest first.
    pub fn by_action<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a AuditEntry> + 'a {
        self.entries.iter().filter(move |e| e.action == action)
    }
}

/// Saves the audit log to a JSON file in pretty format.
pub fn save_audit<P: AsRef<Path>>(path: P, log: &AuditLog) -> Result<()> {
    let json = serde_json::to_string_pretty(log)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads an audit log previously written by [`save_audit`].
pub fn load_audit<P: AsRef<Path>>(path: P) -> Result<AuditLog> {
    let json = fs::read_to_string(path)?;
    let log: AuditLog = serde_json::from_str(&json)?;
    Ok(log)
}

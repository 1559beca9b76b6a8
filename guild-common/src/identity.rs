//! identity.rs
//!
//! Member identifiers and the caller identity passed into every mutating
//! ledger operation.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Separator of the persisted `"payer_receiver"` matrix keys. Member names may not contain it.
pub const KEY_SEPARATOR: char = '_';

/// Stable identifier of a guild member.
///
/// `MemberId` wraps the member's display name, which doubles as the key of the
/// debt matrix and of sale participant lists. The engine treats it as opaque.
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rejects names that are blank or would not survive a matrix key round trip.
    pub fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(LedgerError::InvalidInput("member name is required".to_string()));
        }
        if self.0.contains(KEY_SEPARATOR) {
            return Err(LedgerError::InvalidInput(format!(
                "member name may not contain '{}': {}",
                KEY_SEPARATOR, self.0
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        MemberId(s.to_string())
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        MemberId(s)
    }
}

/// Member role in the directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Member,
}

/// Who is calling.
///
/// A guest may browse everything and change nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Identity {
    Guest,
    Member(MemberId),
}

impl Identity {
    pub fn member(name: &str) -> Self {
        Identity::Member(MemberId::from(name))
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    pub fn member_id(&self) -> Option<&MemberId> {
        match self {
            Identity::Guest => None,
            Identity::Member(id) => Some(id),
        }
    }

    /// Name used in audit records and notices.
    pub fn display_name(&self) -> &str {
        match self {
            Identity::Guest => "guest",
            Identity::Member(id) => id.as_str(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

use chrono::{DateTime, Utc};
use guild_common::{utils::time, MemberId, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: MemberId,
    /// Plaintext. Empty means the account is open.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "time::now")]
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: impl Into<MemberId>, password: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            role,
            joined_at: time::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

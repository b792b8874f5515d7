//! Session credentials
//!
//! Opaque identifiers issued by the credential service. They are immutable
//! once resolved and required before any session operation.

use serde::{Deserialize, Serialize};

/// The `{apiKey, sessionId, token}` triple needed to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub session_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        session_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            session_id: session_id.into(),
            token: token.into(),
        }
    }

    /// Build credentials from optional parts, returning `None` unless all three
    /// are present and non-empty.
    pub fn from_parts(
        api_key: Option<&str>,
        session_id: Option<&str>,
        token: Option<&str>,
    ) -> Option<Self> {
        match (api_key, session_id, token) {
            (Some(a), Some(s), Some(t)) if !a.is_empty() && !s.is_empty() && !t.is_empty() => {
                Some(Self::new(a, s, t))
            }
            _ => None,
        }
    }

    /// Whether every field carries a value.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.session_id.is_empty() && !self.token.is_empty()
    }
}

// src/domain/email.rs
// Input record (§3 Email)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Importance {
    Low,
    Normal,
    High,
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Normal
    }
}

/// A raw email, immutable within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub received_at: DateTime<Utc>,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub importance: Importance,
}

impl Email {
    /// Concatenation of subject and body, used as the extraction/classification input (§4.A, §4.B).
    pub fn text(&self) -> String {
        format!("{}\n{}", self.subject, self.body)
    }
}

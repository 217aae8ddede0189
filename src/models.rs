//! Payload types served by the pub/sub backend.

use serde::{Deserialize, Serialize};

/// Free-form JSON object.
pub type Json = serde_json::Map<String, serde_json::Value>;

/// A message published from one user to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
    pub publisher_id: String,
    pub subscriber_id: String,
    pub content: Json,
}

impl Topic {
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

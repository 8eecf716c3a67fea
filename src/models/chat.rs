use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Entity;

/// Promotion channel message. Stored alongside the workflow entities but
/// never driven by them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub promotion: String,
    pub content: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for ChatMessage {
    const KIND: &'static str = "chat_message";

    fn id(&self) -> Uuid {
        self.id
    }
}

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::store::Record;

pub const DEFAULT_SUBJECT: &str = "General Inquiry";
pub const MAX_SUBJECT_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub subject: String,
    pub content: String,
    pub sender_id: u64,
    pub recipient_id: u64,
    pub confirmation_number: String,
    pub response: Option<String>,
    pub responded_by: Option<u64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for Message {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Eight uppercase hex characters.
pub fn generate_confirmation_number() -> String {
    let bytes: [u8; 4] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Newest first.
pub fn sort_newest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

//! In-memory lead session store.
//!
//! Maps a Telegram chat id to at most one live [`Lead`] for the lifetime of
//! the process. `/analyze` overwrites any prior record for the chat
//! (last-write-wins, no merge). Nothing is persisted across restarts and
//! entries are never evicted — both are accepted limitations.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// A captured lead awaiting report generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    /// Subject username with any leading `@` already stripped.
    pub username: String,
    /// Free-text bio block pasted by the operator after `/analyze`.
    ///
    /// Stored verbatim and never parsed; the report step does not read it.
    pub bio: Option<String>,
}

/// Process-lifetime map from chat id to the chat's current lead.
///
/// Concurrent writes to the same key resolve last-write-wins under the
/// mutex; there is no per-key locking or merge policy.
#[derive(Debug, Default)]
pub struct LeadStore {
    leads: Mutex<HashMap<i64, Lead>>,
}

impl LeadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the lead record for `chat_id`.
    ///
    /// A repeated capture replaces the whole record, including any
    /// previously pasted bio.
    pub async fn put(&self, chat_id: i64, username: String) {
        let mut leads = self.leads.lock().await;
        leads.insert(
            chat_id,
            Lead {
                username,
                bio: None,
            },
        );
    }

    /// Return a copy of the current lead for `chat_id`, if any.
    pub async fn get(&self, chat_id: i64) -> Option<Lead> {
        let leads = self.leads.lock().await;
        leads.get(&chat_id).cloned()
    }

    /// Attach a pasted bio block to the chat's current lead.
    ///
    /// Returns `false` when the chat has no active lead; the text is
    /// dropped in that case.
    pub async fn set_bio(&self, chat_id: i64, text: String) -> bool {
        let mut leads = self.leads.lock().await;
        match leads.get_mut(&chat_id) {
            Some(lead) => {
                lead.bio = Some(text);
                true
            }
            None => false,
        }
    }

    /// Number of live lead records (for status logging).
    pub async fn len(&self) -> usize {
        self.leads.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.leads.lock().await.is_empty()
    }
}

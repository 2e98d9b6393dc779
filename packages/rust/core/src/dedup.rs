//! Duplicate collapsing and chronological ordering of extracted messages.
//!
//! Overlapping exports of the same conversation repeat messages. A message
//! with a source identifier is keyed by it; one without gets a synthesized
//! key from its timestamp, role, and a content prefix. The synthesized key is
//! best-effort: two distinct messages sharing all three collapse into one.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use convarchive_shared::Message;

/// Key a message is deduplicated under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Identity(String),
    Composite(String),
}

fn dedup_key(message: &Message, prefix_chars: usize) -> DedupKey {
    if let Some(identity) = &message.identity {
        return DedupKey::Identity(identity.clone());
    }

    let prefix: String = message.content.chars().take(prefix_chars).collect();

    let mut hasher = Sha256::new();
    hasher.update(message.timestamp.timestamp_millis().to_le_bytes());
    hasher.update(b"\x1f");
    hasher.update(message.role.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(prefix.as_bytes());

    DedupKey::Composite(format!("{:x}", hasher.finalize()))
}

/// Collapse duplicates, last occurrence wins.
///
/// A surviving message keeps the position of its key's first occurrence, so
/// extraction order is otherwise preserved for the stable sort that follows.
#[instrument(skip_all, fields(input = messages.len()))]
pub fn dedup_messages(messages: Vec<Message>, prefix_chars: usize) -> Vec<Message> {
    let mut positions: HashMap<DedupKey, usize> = HashMap::with_capacity(messages.len());
    let mut unique: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        let key = dedup_key(&message, prefix_chars);
        match positions.get(&key) {
            Some(&slot) => unique[slot] = message,
            None => {
                positions.insert(key, unique.len());
                unique.push(message);
            }
        }
    }

    debug!(unique = unique.len(), "deduplicated messages");
    unique
}

/// Order messages by timestamp ascending. Ties keep their relative order.
pub fn sort_chronologically(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by_key(|m| m.timestamp);
    messages
}

//! Conversation history rows and the message-viewer card list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::lead::{normalize_remote_id, LeadRecord};
use crate::legacy::parse_timestamp;
use crate::types::{DbId, Timestamp};

/// Placeholder for a stored message with no text in any known field.
pub const NO_CONTENT: &str = "(no content)";

/// Who sent a message. The stored set is open, so unknown roles are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
            MessageRole::Tool => "tool",
            MessageRole::Other(s) => s,
        }
    }
}

impl From<String> for MessageRole {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "user" | "human" => MessageRole::User,
            "assistant" | "ai" | "bot" => MessageRole::Assistant,
            "system" => MessageRole::System,
            "tool" | "function" => MessageRole::Tool,
            _ => MessageRole::Other(value),
        }
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        role.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: DbId,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Option<Timestamp>,
}

impl ConversationMessage {
    /// Map one chat-history row (`id`, `session_id`, `message`, optional
    /// `created_at`). The `message` column may hold an object or a JSON
    /// string encoding one.
    pub fn from_history_row(row: &Value) -> Result<Self, CoreError> {
        let id = row
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| CoreError::Malformed("History row has no id".into()))?;

        let message = match row.get("message") {
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| serde_json::json!({ "content": raw })),
            Some(other) => other.clone(),
            None => Value::Null,
        };

        let timestamp = message
            .get("timestamp")
            .into_iter()
            .chain(["created_at", "timestamp"].iter().filter_map(|k| row.get(*k)))
            .filter_map(Value::as_str)
            .find_map(parse_timestamp);

        Ok(Self {
            id,
            role: role_of(&message),
            content: content_of(&message),
            timestamp,
        })
    }
}

fn role_of(message: &Value) -> MessageRole {
    let field = |key: &str| message.get(key).and_then(Value::as_str);
    match field("type") {
        Some("ai") => return MessageRole::Assistant,
        Some("human") => return MessageRole::User,
        _ => {}
    }
    if let Some(role) = field("role").filter(|r| !r.trim().is_empty()) {
        return MessageRole::from(role.to_string());
    }
    let says = |who: &str| field("from") == Some(who) || field("sender") == Some(who) || field("type") == Some(who);
    if says("bot") {
        MessageRole::Assistant
    } else {
        MessageRole::User
    }
}

fn content_of(message: &Value) -> String {
    ["content", "text", "message"]
        .iter()
        .filter_map(|k| message.get(*k))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .unwrap_or(NO_CONTENT)
        .to_string()
}

/// Full message list for one conversation, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationHistory {
    pub session_id: String,
    pub messages: Vec<ConversationMessage>,
}

impl ConversationHistory {
    /// Build from raw rows; unreadable rows are dropped and counted.
    pub fn from_rows(session_id: impl Into<String>, rows: &[Value]) -> (Self, usize) {
        let mut skipped = 0;
        let mut messages: Vec<ConversationMessage> = rows
            .iter()
            .filter_map(|row| match ConversationMessage::from_history_row(row) {
                Ok(m) => Some(m),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        messages.sort_by_key(|m| m.id);
        (
            Self {
                session_id: session_id.into(),
                messages,
            },
            skipped,
        )
    }
}

/// One card per remote id, showing that conversation's most recent record.
///
/// Order follows first appearance in `records`. A later record replaces the
/// kept one only when both have a last activity and the later one is newer.
pub fn latest_per_conversation(records: &[LeadRecord]) -> Vec<&LeadRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<&LeadRecord> = Vec::new();

    for record in records {
        let Some(jid) = record.remote_jid.as_deref() else {
            continue;
        };
        let key = normalize_remote_id(jid);
        match index.get(&key) {
            None => {
                index.insert(key, latest.len());
                latest.push(record);
            }
            Some(&slot) => {
                if let (Some(new), Some(old)) = (record.last_activity_at, latest[slot].last_activity_at) {
                    if new > old {
                        latest[slot] = record;
                    }
                }
            }
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn role_resolution_order() {
        assert_eq!(role_of(&json!({ "type": "ai", "role": "user" })), MessageRole::Assistant);
        assert_eq!(role_of(&json!({ "type": "human" })), MessageRole::User);
        assert_eq!(role_of(&json!({ "role": "system" })), MessageRole::System);
        assert_eq!(role_of(&json!({ "sender": "bot" })), MessageRole::Assistant);
        assert_eq!(role_of(&json!({})), MessageRole::User);
        assert_eq!(
            role_of(&json!({ "role": "moderator" })),
            MessageRole::Other("moderator".into())
        );
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let value = serde_json::to_value(MessageRole::Other("moderator".into())).unwrap();
        assert_eq!(value, json!("moderator"));
        assert_eq!(serde_json::to_value(MessageRole::Assistant).unwrap(), json!("assistant"));
    }

    #[test]
    fn parses_history_row_with_string_payload() {
        let row = json!({
            "id": 7,
            "session_id": "5511@s.whatsapp.net",
            "message": "{\"type\":\"ai\",\"content\":\"Olá!\"}",
            "created_at": "2024-03-01T10:00:00Z"
        });
        let msg = ConversationMessage::from_history_row(&row).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "Olá!");
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn message_timestamp_wins_over_row_timestamp() {
        let row = json!({
            "id": 2,
            "message": { "type": "human", "content": "Oi", "timestamp": "2024-03-01T09:00:00Z" },
            "created_at": "2024-03-01T10:00:00Z"
        });
        let msg = ConversationMessage::from_history_row(&row).unwrap();
        assert_eq!(msg.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single());
    }

    #[test]
    fn missing_content_uses_placeholder() {
        let row = json!({ "id": 1, "message": { "type": "human" } });
        let msg = ConversationMessage::from_history_row(&row).unwrap();
        assert_eq!(msg.content, NO_CONTENT);
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn history_sorted_by_id_and_counts_bad_rows() {
        let rows = vec![
            json!({ "id": 3, "message": { "content": "c" } }),
            json!({ "message": { "content": "no id" } }),
            json!({ "id": 1, "message": { "content": "a" } }),
        ];
        let (history, skipped) = ConversationHistory::from_rows("abc", &rows);
        assert_eq!(skipped, 1);
        let ids: Vec<_> = history.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn latest_card_per_remote_id() {
        let t = |d| Some(Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap());
        let records = vec![
            LeadRecord { remote_jid: Some("a".into()), last_activity_at: t(1), ..LeadRecord::new(1) },
            LeadRecord { remote_jid: Some("b".into()), last_activity_at: t(2), ..LeadRecord::new(2) },
            LeadRecord { remote_jid: Some("A".into()), last_activity_at: t(5), ..LeadRecord::new(3) },
            LeadRecord { remote_jid: None, ..LeadRecord::new(4) },
            LeadRecord { remote_jid: Some("b".into()), last_activity_at: None, ..LeadRecord::new(5) },
        ];
        let cards = latest_per_conversation(&records);
        let ids: Vec<_> = cards.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}

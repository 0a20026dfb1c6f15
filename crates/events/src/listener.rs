//! Postgres `LISTEN` loop for table-change notifications.
//!
//! The hosted database publishes a notification on a configured channel
//! whenever a watched table changes, typically from a trigger such as
//!
//! ```sql
//! PERFORM pg_notify('dashboard_changes',
//!     json_build_object('table', TG_TABLE_NAME, 'operation', TG_OP)::text);
//! ```
//!
//! [`ChangeListener`] turns each notification into a [`ChangeEvent`] on the
//! [`EventBus`]. A bare table name is accepted as a payload too.

use std::sync::Arc;
use std::time::Duration;

use leadboard_db::DbPool;
use serde_json::Value;
use sqlx::postgres::PgListener;
use tokio_util::sync::CancellationToken;

use crate::bus::{ChangeEvent, ChangeOperation, EventBus};

/// Pause before retrying after the connection drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unreadable notification payload: {0}")]
    Payload(String),
}

/// Turn a notification payload into a [`ChangeEvent`].
///
/// Accepts `{"table": .., "operation": ..}` (also `type`/`eventType` for the
/// operation) or a plain table name.
pub fn parse_payload(payload: &str) -> Result<ChangeEvent, ListenerError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(ListenerError::Payload("empty payload".into()));
    }

    if !trimmed.starts_with('{') {
        return Ok(ChangeEvent::new(trimmed, ChangeOperation::Unknown));
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ListenerError::Payload(e.to_string()))?;
    let table = value
        .get("table")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ListenerError::Payload("missing 'table'".into()))?;
    let operation = ["operation", "type", "eventType"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(ChangeOperation::from_str_value)
        .unwrap_or(ChangeOperation::Unknown);

    Ok(ChangeEvent::new(table, operation))
}

/// Long-lived task forwarding notifications to the bus.
pub struct ChangeListener {
    pool: DbPool,
    channel: String,
    bus: Arc<EventBus>,
}

impl ChangeListener {
    pub fn new(pool: DbPool, channel: impl Into<String>, bus: Arc<EventBus>) -> Self {
        Self {
            pool,
            channel: channel.into(),
            bus,
        }
    }

    /// Run until `cancel` fires. Connection failures are logged and retried
    /// after a fixed delay.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(channel = %self.channel, "Change listener started");

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.listen(&cancel) => r,
            };

            match result {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(
                        channel = %self.channel,
                        error = %e,
                        retry_in_secs = RECONNECT_DELAY.as_secs(),
                        "Change listener connection lost",
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }

        tracing::info!(channel = %self.channel, "Change listener shutting down");
    }

    /// One connection's worth of listening. Returns `Ok` only on cancel.
    async fn listen(&self, cancel: &CancellationToken) -> Result<(), ListenerError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                notification = listener.recv() => {
                    let notification = notification?;
                    match parse_payload(notification.payload()) {
                        Ok(event) => {
                            tracing::debug!(
                                table = %event.table,
                                operation = ?event.operation,
                                "Table change received",
                            );
                            self.bus.publish(event);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring change notification");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_trigger_payload() {
        let event = parse_payload(r#"{"table":"chats","operation":"INSERT"}"#).unwrap();
        assert_eq!(event.table, "chats");
        assert_eq!(event.operation, ChangeOperation::Insert);
    }

    #[test]
    fn accepts_event_type_alias() {
        let event = parse_payload(r#"{"table":"numeros","eventType":"DELETE"}"#).unwrap();
        assert_eq!(event.operation, ChangeOperation::Delete);
    }

    #[test]
    fn bare_table_name() {
        let event = parse_payload(" chat_names ").unwrap();
        assert_eq!(event.table, "chat_names");
        assert_eq!(event.operation, ChangeOperation::Unknown);
    }

    #[test]
    fn rejects_unusable_payloads() {
        assert_matches!(parse_payload(""), Err(ListenerError::Payload(_)));
        assert_matches!(parse_payload("{not json"), Err(ListenerError::Payload(_)));
        assert_matches!(parse_payload(r#"{"operation":"INSERT"}"#), Err(ListenerError::Payload(_)));
    }
}

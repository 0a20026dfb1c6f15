//! Mapping from the hosted tables' mixed-language, mixed-case columns into
//! the canonical record types.
//!
//! Rows arrive as JSON objects (`to_jsonb(t)` on the Postgres side), so every
//! column spelling the tables have used over time can be accepted here and
//! nowhere else.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::blocked::BlockedNumber;
use crate::error::CoreError;
use crate::lead::{DisplayName, LeadRecord};
use crate::types::{DbId, Timestamp};

const REMOTE_ID_KEYS: &[&str] = &["remotejID", "remotejid", "remoteJid", "remote_jid", "session_id"];
const LAST_ACTIVITY_KEYS: &[&str] = &["ultimaAtividade", "ultima_atividade", "last_activity_at"];
const LAST_MESSAGE_KEYS: &[&str] = &["ultimaMensagem", "ultima_mensagem", "last_message"];
const CLOSED_KEYS: &[&str] = &["encerrado", "closed"];
const FOLLOWUP1_KEYS: &[&str] = &["followup1", "follow_up_1"];
const FOLLOWUP2_KEYS: &[&str] = &["followup2", "follow_up_2"];
const NAME_KEYS: &[&str] = &["name", "nome", "display_name", "pushName", "push_name"];
const PHONE_KEYS: &[&str] = &["numero", "number", "telefone", "numero_telefone"];

// ---------------------------------------------------------------------------
// Row adapters
// ---------------------------------------------------------------------------

/// Map one lead-table row. A row without a usable `id` is malformed.
pub fn lead_from_row(row: &Value) -> Result<LeadRecord, CoreError> {
    let obj = as_object(row)?;
    let id = row_id(obj)?;

    let mut record = LeadRecord {
        id,
        remote_jid: first_string(obj, REMOTE_ID_KEYS),
        created_at: obj.get("created_at").and_then(parse_timestamp_value),
        last_activity_at: first_present(obj, LAST_ACTIVITY_KEYS).and_then(parse_timestamp_value),
        last_message: first_string(obj, LAST_MESSAGE_KEYS),
        closed: first_present(obj, CLOSED_KEYS).and_then(parse_tri_state),
        followup1: first_present(obj, FOLLOWUP1_KEYS).and_then(parse_tri_state),
        followup2: first_present(obj, FOLLOWUP2_KEYS).and_then(parse_tri_state),
    };

    // Some layouts carry a single `status` text column instead of flags.
    if let Some(status) = obj.get("status").and_then(Value::as_str) {
        apply_status_text(&mut record, status);
    }

    Ok(record)
}

/// Map every row, skipping malformed ones. Returns the records and the
/// number of skipped rows.
pub fn leads_from_rows(rows: &[Value]) -> (Vec<LeadRecord>, usize) {
    let mut skipped = 0;
    let records = rows
        .iter()
        .filter_map(|row| match lead_from_row(row) {
            Ok(record) => Some(record),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    (records, skipped)
}

/// Map one display-name row. Rows without both a remote id and a name are
/// ignored.
pub fn display_name_from_row(row: &Value) -> Option<DisplayName> {
    let obj = row.as_object()?;
    let remote_jid = first_string(obj, REMOTE_ID_KEYS)?;
    let name = first_string(obj, NAME_KEYS)?;
    if remote_jid.trim().is_empty() || name.trim().is_empty() {
        return None;
    }
    Some(DisplayName { remote_jid, name })
}

/// Map one blocked-number row; the number column has had several names.
pub fn blocked_number_from_row(row: &Value) -> Result<BlockedNumber, CoreError> {
    let obj = as_object(row)?;
    let id = row_id(obj)?;
    let number = first_string(obj, PHONE_KEYS).ok_or_else(|| {
        CoreError::Malformed(format!("Blocked number row {id} has no number column"))
    })?;
    Ok(BlockedNumber {
        id,
        number,
        created_at: obj.get("created_at").and_then(parse_timestamp_value),
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn as_object(row: &Value) -> Result<&Map<String, Value>, CoreError> {
    row.as_object()
        .ok_or_else(|| CoreError::Malformed("Row is not a JSON object".into()))
}

pub(crate) fn row_id(obj: &Map<String, Value>) -> Result<DbId, CoreError> {
    match obj.get("id") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| CoreError::Malformed(format!("Row id {n} is not an integer"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| CoreError::Malformed(format!("Row id '{s}' is not an integer"))),
        _ => Err(CoreError::Malformed("Row has no id".into())),
    }
}

/// First key that is present and not null.
pub(crate) fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// First key holding a non-empty string (numbers are stringified).
pub(crate) fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn apply_status_text(record: &mut LeadRecord, status: &str) {
    match status.trim().to_lowercase().as_str() {
        "encerrado" | "closed" | "fechado" => record.closed = Some(true),
        "followup1" | "follow-up 1" | "follow_up_1" => {
            record.followup1 = Some(true);
            record.closed.get_or_insert(false);
        }
        "followup2" | "follow-up 2" | "follow_up_2" => {
            record.followup2 = Some(true);
            record.closed.get_or_insert(false);
        }
        "andamento" | "active" | "open" | "em andamento" => record.closed = Some(false),
        _ => {}
    }
}

/// Interpret a loosely-typed flag. Anything unrecognised is unknown.
pub fn parse_tri_state(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "sim" | "yes" => Some(true),
            "false" | "f" | "0" | "não" | "nao" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_timestamp_value(value: &Value) -> Option<Timestamp> {
    value.as_str().and_then(parse_timestamp)
}

/// Parse the timestamp shapes the hosted store hands back.
///
/// Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output: `2024-03-01 10:15:00.123+00` / `+00:00`.
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use crate::lead::LeadStatus;

    #[test]
    fn maps_portuguese_chat_row() {
        let row = json!({
            "id": 12,
            "created_at": "2024-03-01T09:00:00+00:00",
            "remotejID": "5511988887777@s.whatsapp.net",
            "ultimaMensagem": "Olá",
            "ultimaAtividade": "2024-03-02 14:30:00+00",
            "encerrado": null,
            "followup1": true,
            "followup2": false
        });
        let record = lead_from_row(&row).unwrap();
        assert_eq!(record.id, 12);
        assert_eq!(record.remote_jid.as_deref(), Some("5511988887777@s.whatsapp.net"));
        assert_eq!(record.last_message.as_deref(), Some("Olá"));
        assert_eq!(record.closed, None);
        assert_eq!(record.status(), LeadStatus::FollowUp1);
        let activity = record.last_activity_at.unwrap();
        assert_eq!((activity.day(), activity.hour(), activity.minute()), (2, 14, 30));
    }

    #[test]
    fn maps_status_text_column() {
        let row = json!({ "id": "4", "remote_jid": "x", "status": "Encerrado" });
        let record = lead_from_row(&row).unwrap();
        assert_eq!(record.id, 4);
        assert_eq!(record.status(), LeadStatus::Closed);
    }

    #[test]
    fn unparseable_timestamp_keeps_record() {
        let row = json!({ "id": 1, "created_at": "yesterday-ish" });
        let record = lead_from_row(&row).unwrap();
        assert!(record.created_at.is_none());
    }

    #[test]
    fn row_without_id_is_malformed() {
        assert_matches!(
            lead_from_row(&json!({ "remotejID": "x" })),
            Err(CoreError::Malformed(_))
        );
        assert_matches!(lead_from_row(&json!([1, 2])), Err(CoreError::Malformed(_)));
    }

    #[test]
    fn batch_mapping_counts_skipped_rows() {
        let rows = vec![json!({ "id": 1 }), json!({ "nope": true }), json!({ "id": 2 })];
        let (records, skipped) = leads_from_rows(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn tri_state_accepts_loose_values() {
        assert_eq!(parse_tri_state(&json!(1)), Some(true));
        assert_eq!(parse_tri_state(&json!("sim")), Some(true));
        assert_eq!(parse_tri_state(&json!("false")), Some(false));
        assert_eq!(parse_tri_state(&json!(null)), None);
        assert_eq!(parse_tri_state(&json!("maybe")), None);
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let ts = parse_timestamp("2024-05-10T08:05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-10T08:05:00+00:00");
        let date_only = parse_timestamp("2024-05-10").unwrap();
        assert_eq!(date_only.hour(), 0);
    }

    #[test]
    fn display_name_requires_both_fields() {
        let ok = json!({ "remotejID": "abc", "nome": "Carla" });
        assert_eq!(display_name_from_row(&ok).unwrap().name, "Carla");
        assert!(display_name_from_row(&json!({ "remotejID": "abc" })).is_none());
    }

    #[test]
    fn blocked_number_accepts_alternate_columns() {
        let row = json!({ "id": 3, "telefone": "5511912345678" });
        let blocked = blocked_number_from_row(&row).unwrap();
        assert_eq!(blocked.number, "5511912345678");
    }
}

//! Conversation insights: response time, message volume, peak hours and
//! follow-up effectiveness.
//!
//! Insights are either read back from the cached analysis table or computed
//! from the lead snapshot plus the full chat history.

use std::collections::{BTreeMap, HashMap};

use chrono::{FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::aggregate::percentage;
use crate::conversation::{ConversationHistory, ConversationMessage, MessageRole};
use crate::error::CoreError;
use crate::lead::{normalize_remote_id, LeadRecord};
use crate::legacy::parse_timestamp;
use crate::types::Timestamp;

/// Remote id under which the global analysis row is stored.
pub const GLOBAL_ANALYSIS_KEY: &str = "global_analysis";

/// Response gaps at or above this many minutes are ignored.
const MAX_RESPONSE_MINUTES: f64 = 24.0 * 60.0;

const PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowupEffectiveness {
    pub followup1: f64,
    pub followup2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightsSource {
    Cached,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationInsights {
    pub source: InsightsSource,
    pub avg_response_minutes: f64,
    pub conversion_rate: f64,
    pub avg_messages_per_lead: f64,
    pub peak_activity_hours: Vec<u32>,
    pub followup_effectiveness: FollowupEffectiveness,
    pub total_conversations: u64,
    pub updated_at: Option<Timestamp>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// History grouping
// ---------------------------------------------------------------------------

/// Group raw history rows by `session_id`, each conversation sorted by id.
/// Rows without a session or id are skipped.
pub fn group_histories(rows: &[Value]) -> Vec<ConversationHistory> {
    let mut sessions: BTreeMap<String, Vec<ConversationMessage>> = BTreeMap::new();
    for row in rows {
        let Some(session) = row.get("session_id").and_then(Value::as_str) else {
            continue;
        };
        if let Ok(message) = ConversationMessage::from_history_row(row) {
            sessions.entry(session.to_string()).or_default().push(message);
        }
    }
    sessions
        .into_iter()
        .map(|(session_id, mut messages)| {
            messages.sort_by_key(|m| m.id);
            ConversationHistory { session_id, messages }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Individual measures
// ---------------------------------------------------------------------------

/// Mean minutes between a user message and the assistant reply that
/// immediately follows it. `None` when no pair qualifies.
pub fn average_response_minutes(histories: &[ConversationHistory]) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0u64;
    for history in histories {
        for pair in history.messages.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if prev.role != MessageRole::User || curr.role != MessageRole::Assistant {
                continue;
            }
            let (Some(asked), Some(answered)) = (prev.timestamp, curr.timestamp) else {
                continue;
            };
            let minutes = (answered - asked).num_seconds() as f64 / 60.0;
            if minutes > 0.0 && minutes < MAX_RESPONSE_MINUTES {
                total += minutes;
                count += 1;
            }
        }
    }
    (count > 0).then(|| round1(total / count as f64))
}

/// Mean minutes from creation to last activity, over all records.
/// Records missing either timestamp contribute zero.
pub fn estimated_response_minutes(records: &[LeadRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: f64 = records
        .iter()
        .filter_map(|r| Some((r.last_activity_at? - r.created_at?).num_seconds() as f64 / 60.0))
        .sum();
    round1(total / records.len() as f64)
}

pub fn average_messages_per_session(histories: &[ConversationHistory]) -> f64 {
    if histories.is_empty() {
        return 0.0;
    }
    let total: usize = histories.iter().map(|h| h.messages.len()).sum();
    round1(total as f64 / histories.len() as f64)
}

/// The busiest hours of day, most active first. Ties go to the earlier hour.
pub fn peak_hours<I>(timestamps: I, offset: FixedOffset) -> Vec<u32>
where
    I: IntoIterator<Item = Timestamp>,
{
    let mut counts = [0u64; 24];
    for ts in timestamps {
        counts[ts.with_timezone(&offset).hour() as usize] += 1;
    }
    let mut hours: Vec<(u32, u64)> = counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .map(|(h, c)| (h as u32, *c))
        .collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours.into_iter().take(PEAK_HOURS).map(|(h, _)| h).collect()
}

/// FU1: share of follow-up-1-only leads that closed. FU2: share of
/// follow-up-2 leads whose conversation has at least two messages.
pub fn followup_effectiveness(
    records: &[LeadRecord],
    histories: &[ConversationHistory],
) -> FollowupEffectiveness {
    let fu1_only: Vec<_> = records
        .iter()
        .filter(|r| r.has_followup1() && !r.has_followup2())
        .collect();
    let fu1_closed = fu1_only.iter().filter(|r| r.is_closed()).count() as u64;

    let sizes: HashMap<String, usize> = histories
        .iter()
        .map(|h| (normalize_remote_id(&h.session_id), h.messages.len()))
        .collect();
    let fu2: Vec<_> = records.iter().filter(|r| r.has_followup2()).collect();
    let fu2_engaged = fu2
        .iter()
        .filter(|r| {
            r.remote_jid
                .as_deref()
                .and_then(|jid| sizes.get(&normalize_remote_id(jid)))
                .map(|n| *n >= 2)
                .unwrap_or(false)
        })
        .count() as u64;

    FollowupEffectiveness {
        followup1: percentage(fu1_closed, fu1_only.len() as u64),
        followup2: percentage(fu2_engaged, fu2.len() as u64),
    }
}

// ---------------------------------------------------------------------------
// Full computation
// ---------------------------------------------------------------------------

pub fn compute(
    records: &[LeadRecord],
    histories: &[ConversationHistory],
    offset: FixedOffset,
    now: Timestamp,
) -> ConversationInsights {
    let closed = records.iter().filter(|r| r.is_closed()).count() as u64;
    let timestamps = histories
        .iter()
        .flat_map(|h| h.messages.iter().filter_map(|m| m.timestamp));

    ConversationInsights {
        source: InsightsSource::Computed,
        avg_response_minutes: average_response_minutes(histories)
            .unwrap_or_else(|| estimated_response_minutes(records)),
        conversion_rate: percentage(closed, records.len() as u64),
        avg_messages_per_lead: average_messages_per_session(histories),
        peak_activity_hours: peak_hours(timestamps, offset),
        followup_effectiveness: followup_effectiveness(records, histories),
        total_conversations: records.len() as u64,
        updated_at: Some(now),
    }
}

// ---------------------------------------------------------------------------
// Cached analysis rows
// ---------------------------------------------------------------------------

/// Read a cached analysis row. Response time is stored in hours.
pub fn from_analysis_row(row: &Value) -> Result<ConversationInsights, CoreError> {
    let obj = row
        .as_object()
        .ok_or_else(|| CoreError::Malformed("Analysis row is not a JSON object".into()))?;
    let num = |key: &str| obj.get(key).and_then(Value::as_f64).unwrap_or(0.0);

    let peak_activity_hours = obj
        .get("peak_activity_hours")
        .and_then(Value::as_array)
        .map(|hours| {
            hours
                .iter()
                .filter_map(Value::as_u64)
                .filter(|h| *h < 24)
                .map(|h| h as u32)
                .collect()
        })
        .unwrap_or_default();

    let followup_effectiveness = match obj.get("followup_effectiveness") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone()).map_err(|e| {
            CoreError::Malformed(format!("followup_effectiveness: {e}"))
        })?,
        _ => FollowupEffectiveness::default(),
    };

    let updated_at = ["updated_at", "created_at"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .find_map(parse_timestamp);

    Ok(ConversationInsights {
        source: InsightsSource::Cached,
        avg_response_minutes: round1(num("avg_response_time_hours") * 60.0),
        conversion_rate: round1(num("conversion_rate")),
        avg_messages_per_lead: round1(num("avg_messages_per_lead")),
        peak_activity_hours,
        followup_effectiveness,
        total_conversations: obj
            .get("total_conversations")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        updated_at,
    })
}

/// Column values for storing insights as the global analysis row.
pub fn to_analysis_row(insights: &ConversationInsights) -> Value {
    json!({
        "remotejID": GLOBAL_ANALYSIS_KEY,
        "avg_response_time_hours": insights.avg_response_minutes / 60.0,
        "conversion_rate": insights.conversion_rate,
        "avg_messages_per_lead": insights.avg_messages_per_lead,
        "peak_activity_hours": insights.peak_activity_hours,
        "top_keywords": [],
        "sentiment_analysis": { "positive": 0, "neutral": 0, "negative": 0 },
        "followup_effectiveness": insights.followup_effectiveness,
        "total_conversations": insights.total_conversations,
    })
}

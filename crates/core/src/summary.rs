//! Process summaries produced by the document automation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::legacy::{first_string, row_id};
use crate::types::DbId;

/// Date part (and optional time) as written, without any timezone shift.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2}))?").expect("valid regex")
});

const KEY_POINT_COLUMNS: [&str; 5] = ["Issue1", "Issue2", "Issue3", "Issue4", "Issue5"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub id: DbId,
    pub subject: Option<String>,
    /// The stored date string, untouched.
    pub date: Option<String>,
    /// `dd/MM/yyyy`, or `-` when no date can be read.
    pub date_label: String,
    /// `dd/MM/yyyy HH:mm` when the stored value carries a time.
    pub date_time_label: Option<String>,
    pub deadline: Option<String>,
    pub summary: Option<String>,
    pub key_points: Vec<String>,
}

impl ProcessSummary {
    pub fn from_row(row: &Value) -> Result<Self, CoreError> {
        let obj = row
            .as_object()
            .ok_or_else(|| CoreError::Malformed("Summary row is not a JSON object".into()))?;
        let id = row_id(obj)?;

        let date = first_string(obj, &["Date", "date"]);
        let (date_label, date_time_label) = match date.as_deref().and_then(date_labels) {
            Some((day, time)) => (day, time),
            None => ("-".to_string(), None),
        };

        Ok(Self {
            id,
            subject: first_string(obj, &["Subject", "subject"]),
            date,
            date_label,
            date_time_label,
            deadline: first_string(obj, &["prazo", "deadline"]),
            summary: first_string(obj, &["sumario", "summary"]),
            key_points: KEY_POINT_COLUMNS
                .iter()
                .filter_map(|k| first_string(obj, &[*k]))
                .collect(),
        })
    }
}

/// Day label and, when the value has a time, a day-and-time label.
pub fn date_labels(raw: &str) -> Option<(String, Option<String>)> {
    let caps = DATE_RE.captures(raw)?;
    let day = format!("{}/{}/{}", &caps[3], &caps[2], &caps[1]);
    let with_time = match (caps.get(4), caps.get(5)) {
        (Some(h), Some(m)) => Some(format!("{day} {}:{}", h.as_str(), m.as_str())),
        _ => None,
    };
    Some((day, with_time))
}

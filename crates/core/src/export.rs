//! Lead export: filtering plus CSV and plain-text report rendering.
//!
//! The formatter never touches storage. Callers pass the current snapshot,
//! the display-name directory and the clock; an empty filtered set is an
//! error rather than an empty file.

use chrono::{Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lead::{LeadGroup, LeadRecord, NameDirectory};
use crate::phone;
use crate::types::Timestamp;

/// Byte-order mark so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &str = "\u{FEFF}";

/// Longest custom window, about ten years.
pub const MAX_EXPORT_DAYS: u32 = 3660;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Time window applied to a record's last activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportRange {
    #[default]
    AllTime,
    LastDays(u32),
}

impl ExportRange {
    /// Parse `all`, `7d`/`30d`/`90d`, or `custom` with an explicit day count.
    pub fn from_parts(range: Option<&str>, days: Option<u32>) -> Result<Self, CoreError> {
        let range = range.map(|r| r.trim().to_lowercase());
        match range.as_deref() {
            None | Some("") | Some("all") => match days {
                Some(n) => Self::custom(n),
                None => Ok(ExportRange::AllTime),
            },
            Some("7d") | Some("7") => Ok(ExportRange::LastDays(7)),
            Some("30d") | Some("30") => Ok(ExportRange::LastDays(30)),
            Some("90d") | Some("90") => Ok(ExportRange::LastDays(90)),
            Some("custom") => match days {
                Some(n) => Self::custom(n),
                None => Err(CoreError::Validation(
                    "A custom range needs a 'days' value".into(),
                )),
            },
            Some(other) => Err(CoreError::Validation(format!(
                "Unknown export range '{other}'"
            ))),
        }
    }

    fn custom(days: u32) -> Result<Self, CoreError> {
        if !(1..=MAX_EXPORT_DAYS).contains(&days) {
            return Err(CoreError::Validation(format!(
                "'days' must be between 1 and {MAX_EXPORT_DAYS}"
            )));
        }
        Ok(ExportRange::LastDays(days))
    }

    /// Records without a last-activity timestamp only pass `AllTime`.
    pub fn contains(self, ts: Option<Timestamp>, now: Timestamp) -> bool {
        match self {
            ExportRange::AllTime => true,
            ExportRange::LastDays(days) => {
                let Some(ts) = ts else {
                    return false;
                };
                // A cutoff before the earliest representable instant admits everything.
                now.checked_sub_signed(Duration::days(i64::from(days)))
                    .map_or(true, |cutoff| ts >= cutoff)
            }
        }
    }

    pub fn label(self) -> String {
        match self {
            ExportRange::AllTime => "All time".to_string(),
            ExportRange::LastDays(n) => format!("Last {n} days"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportColumn {
    Id,
    Name,
    Phone,
    LastActivity,
    LastMessage,
    Status,
    Closed,
}

impl ExportColumn {
    pub const DEFAULT: [ExportColumn; 5] = [
        ExportColumn::Id,
        ExportColumn::Name,
        ExportColumn::LastActivity,
        ExportColumn::Status,
        ExportColumn::Closed,
    ];

    pub fn from_str_value(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().as_str() {
            "id" => Ok(ExportColumn::Id),
            "name" => Ok(ExportColumn::Name),
            "phone" => Ok(ExportColumn::Phone),
            "last_activity" => Ok(ExportColumn::LastActivity),
            "last_message" => Ok(ExportColumn::LastMessage),
            "status" => Ok(ExportColumn::Status),
            "closed" => Ok(ExportColumn::Closed),
            other => Err(CoreError::Validation(format!(
                "Unknown export column '{other}'"
            ))),
        }
    }

    /// Comma-separated column list; blank input selects the default set.
    pub fn parse_list(value: Option<&str>) -> Result<Vec<Self>, CoreError> {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(Self::DEFAULT.to_vec());
        };
        let mut columns = Vec::new();
        for part in value.split(',').filter(|p| !p.trim().is_empty()) {
            let column = Self::from_str_value(part)?;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        Ok(columns)
    }

    pub fn header(self) -> &'static str {
        match self {
            ExportColumn::Id => "ID",
            ExportColumn::Name => "Name",
            ExportColumn::Phone => "Phone",
            ExportColumn::LastActivity => "Last Activity",
            ExportColumn::LastMessage => "Last Message",
            ExportColumn::Status => "Status",
            ExportColumn::Closed => "Closed",
        }
    }
}

/// Which records an export includes.
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub range: ExportRange,
    pub group: LeadGroup,
    pub search: Option<String>,
}

impl ExportFilter {
    pub fn matches(&self, record: &LeadRecord, names: &NameDirectory, now: Timestamp) -> bool {
        let name = names.lookup(record.remote_jid.as_deref());
        self.range.contains(record.last_activity_at, now)
            && self.group.matches(record)
            && self
                .search
                .as_deref()
                .map(|s| record.matches_search(s, name))
                .unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub filter: ExportFilter,
    pub columns: Vec<ExportColumn>,
    pub format: ExportFormat,
    /// Only honoured for callers allowed to see raw numbers.
    pub reveal_phone: bool,
}

/// Environment the rows are rendered in.
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub names: &'a NameDirectory,
    pub offset: FixedOffset,
    pub now: Timestamp,
}

/// A rendered download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
    pub row_count: usize,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn filter_records<'a>(
    records: &'a [LeadRecord],
    filter: &ExportFilter,
    names: &NameDirectory,
    now: Timestamp,
) -> Vec<&'a LeadRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r, names, now))
        .collect()
}

/// Filter and render. Fails with [`CoreError::Empty`] when nothing matches.
pub fn render(
    records: &[LeadRecord],
    request: &ExportRequest,
    ctx: ExportContext<'_>,
) -> Result<ExportArtifact, CoreError> {
    if request.columns.is_empty() {
        return Err(CoreError::Validation("Select at least one column".into()));
    }

    let rows = filter_records(records, &request.filter, ctx.names, ctx.now);
    if rows.is_empty() {
        return Err(CoreError::Empty(
            "No records match the selected filters".into(),
        ));
    }

    let body = match request.format {
        ExportFormat::Csv => build_csv(&rows, request, ctx),
        ExportFormat::Txt => build_report(&rows, request, ctx),
    };

    Ok(ExportArtifact {
        file_name: file_name(request.format, ctx.now.with_timezone(&ctx.offset).date_naive()),
        content_type: request.format.content_type(),
        body,
        row_count: rows.len(),
    })
}

pub fn file_name(format: ExportFormat, date: chrono::NaiveDate) -> String {
    format!("leads-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Quote values containing a separator, quote or line break; inner quotes
/// are doubled.
pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn cell(record: &LeadRecord, column: ExportColumn, request: &ExportRequest, ctx: ExportContext<'_>) -> String {
    match column {
        ExportColumn::Id => record.id.to_string(),
        ExportColumn::Name => ctx
            .names
            .lookup(record.remote_jid.as_deref())
            .map(str::to_string)
            .or_else(|| record.remote_jid.clone())
            .unwrap_or_else(|| phone::MISSING.to_string()),
        ExportColumn::Phone => phone::display_phone(record.remote_jid.as_deref(), request.reveal_phone),
        ExportColumn::LastActivity => record
            .last_activity_at
            .map(|t| t.with_timezone(&ctx.offset).format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|| phone::MISSING.to_string()),
        ExportColumn::LastMessage => record.last_message.clone().unwrap_or_default(),
        ExportColumn::Status => record.status().label().to_string(),
        ExportColumn::Closed => if record.is_closed() { "Yes" } else { "No" }.to_string(),
    }
}

fn build_csv(rows: &[&LeadRecord], request: &ExportRequest, ctx: ExportContext<'_>) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        request
            .columns
            .iter()
            .map(|c| csv_escape(c.header()))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in rows {
        let parts: Vec<String> = request
            .columns
            .iter()
            .map(|&c| csv_escape(&cell(record, c, request, ctx)))
            .collect();
        lines.push(parts.join(","));
    }
    format!("{UTF8_BOM}{}\n", lines.join("\n"))
}

fn build_report(rows: &[&LeadRecord], request: &ExportRequest, ctx: ExportContext<'_>) -> String {
    let filter = &request.filter;
    let mut out = String::new();
    out.push_str("LEADS REPORT\n");
    out.push_str(&format!(
        "Generated: {}\n",
        ctx.now.with_timezone(&ctx.offset).format("%d/%m/%Y %H:%M (UTC%:z)")
    ));
    out.push_str(&format!("Total records: {}\n", rows.len()));
    out.push_str(&format!("Range: {}\n", filter.range.label()));
    out.push_str(&format!("Group: {}\n", filter.group.label()));
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("Search: {}\n", search.trim()));
    }
    out.push_str(&"=".repeat(40));
    out.push('\n');

    for (index, record) in rows.iter().enumerate() {
        out.push_str(&format!("\n#{}\n", index + 1));
        for &column in &request.columns {
            let value = cell(record, column, request, ctx).replace('\n', " ");
            out.push_str(&format!("  {}: {}\n", column.header(), value));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

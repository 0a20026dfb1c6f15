//! Configurable names of the hosted tables.
//!
//! Table names end up inside SQL text, so each one is checked against a
//! plain identifier pattern before use and always emitted double-quoted.

use std::sync::LazyLock;

use regex::Regex;

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]{0,62}\.)?[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .expect("valid regex")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid table name for {role}: '{value}'")]
pub struct TableNameError {
    pub role: &'static str,
    pub value: String,
}

/// A validated, optionally schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn parse(role: &'static str, value: &str) -> Result<Self, TableNameError> {
        let value = value.trim();
        if IDENT_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(TableNameError {
                role,
                value: value.to_string(),
            })
        }
    }

    /// Raw name as configured.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"schema"."table"` form for interpolation into SQL.
    pub fn quoted(&self) -> String {
        self.0
            .split('.')
            .map(|part| format!("\"{part}\""))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Unqualified table name, as reported by change notifications.
    pub fn bare(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

/// Every table the dashboard reads or writes.
#[derive(Debug, Clone)]
pub struct TableNames {
    pub leads: TableName,
    pub names: TableName,
    pub blocked: TableName,
    pub messages: TableName,
    pub analysis: TableName,
    pub summaries: TableName,
}

impl TableNames {
    pub const DEFAULT_LEADS: &'static str = "chats";
    pub const DEFAULT_NAMES: &'static str = "chat_names";
    pub const DEFAULT_BLOCKED: &'static str = "numeros";
    pub const DEFAULT_MESSAGES: &'static str = "n8n_chat_histories";
    pub const DEFAULT_ANALYSIS: &'static str = "conversation_analysis";
    pub const DEFAULT_SUMMARIES: &'static str = "sumario";

    pub fn new(
        leads: &str,
        names: &str,
        blocked: &str,
        messages: &str,
        analysis: &str,
        summaries: &str,
    ) -> Result<Self, TableNameError> {
        Ok(Self {
            leads: TableName::parse("leads", leads)?,
            names: TableName::parse("names", names)?,
            blocked: TableName::parse("blocked", blocked)?,
            messages: TableName::parse("messages", messages)?,
            analysis: TableName::parse("analysis", analysis)?,
            summaries: TableName::parse("summaries", summaries)?,
        })
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_LEADS,
            Self::DEFAULT_NAMES,
            Self::DEFAULT_BLOCKED,
            Self::DEFAULT_MESSAGES,
            Self::DEFAULT_ANALYSIS,
            Self::DEFAULT_SUMMARIES,
        )
        .expect("default table names are valid identifiers")
    }
}

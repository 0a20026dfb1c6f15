//! Canonical lead/conversation record, derived status, and display names.
//!
//! Every row read from the hosted lead table is mapped into [`LeadRecord`]
//! by [`crate::legacy`] before anything else looks at it. The rest of the
//! crate only ever sees this shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One tracked contact's follow-up state.
///
/// The three flags are tri-state: `None` means the store holds no value.
/// For status purposes an unknown flag counts as not set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: DbId,
    /// Messaging-channel address, e.g. `5511999999999@s.whatsapp.net`.
    pub remote_jid: Option<String>,
    pub created_at: Option<Timestamp>,
    pub last_activity_at: Option<Timestamp>,
    pub last_message: Option<String>,
    pub closed: Option<bool>,
    pub followup1: Option<bool>,
    pub followup2: Option<bool>,
}

impl LeadRecord {
    /// An empty record with only the id set. Handy for builders and tests.
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            remote_jid: None,
            created_at: None,
            last_activity_at: None,
            last_message: None,
            closed: None,
            followup1: None,
            followup2: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed == Some(true)
    }

    pub fn has_followup1(&self) -> bool {
        self.followup1 == Some(true)
    }

    pub fn has_followup2(&self) -> bool {
        self.followup2 == Some(true)
    }

    /// The single derived status for this record.
    pub fn status(&self) -> LeadStatus {
        LeadStatus::derive(self.closed, self.followup1, self.followup2)
    }

    /// Case-insensitive substring search over the remote id and, when
    /// known, the display name. An empty needle matches everything.
    pub fn matches_search(&self, needle: &str, display_name: Option<&str>) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let hit = |value: Option<&str>| {
            value
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        hit(self.remote_jid.as_deref()) || hit(display_name)
    }
}

// ---------------------------------------------------------------------------
// Derived status
// ---------------------------------------------------------------------------

/// UI-facing classification computed from the tri-state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Closed,
    #[serde(rename = "follow_up_2")]
    FollowUp2,
    #[serde(rename = "follow_up_1")]
    FollowUp1,
    InProgress,
}

impl LeadStatus {
    /// All statuses in priority order.
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::Closed,
        LeadStatus::FollowUp2,
        LeadStatus::FollowUp1,
        LeadStatus::InProgress,
    ];

    /// Closed wins over both follow-ups, follow-up 2 over follow-up 1.
    pub fn derive(closed: Option<bool>, followup1: Option<bool>, followup2: Option<bool>) -> Self {
        if closed == Some(true) {
            LeadStatus::Closed
        } else if followup2 == Some(true) {
            LeadStatus::FollowUp2
        } else if followup1 == Some(true) {
            LeadStatus::FollowUp1
        } else {
            LeadStatus::InProgress
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::Closed => "Closed",
            LeadStatus::FollowUp2 => "Follow-up 2",
            LeadStatus::FollowUp1 => "Follow-up 1",
            LeadStatus::InProgress => "In Progress",
        }
    }
}

// ---------------------------------------------------------------------------
// Record-group selector
// ---------------------------------------------------------------------------

/// Filter used by the leads table and the export formatter.
///
/// Unlike [`LeadStatus`] these groups overlap: a closed record that also has
/// a follow-up flag only shows under `Closed`, but an open record with both
/// follow-up flags shows under both follow-up groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadGroup {
    #[default]
    All,
    Closed,
    Active,
    FollowUp1,
    FollowUp2,
}

impl LeadGroup {
    pub fn matches(self, record: &LeadRecord) -> bool {
        match self {
            LeadGroup::All => true,
            LeadGroup::Closed => record.is_closed(),
            LeadGroup::Active => !record.is_closed(),
            LeadGroup::FollowUp1 => record.has_followup1() && !record.is_closed(),
            LeadGroup::FollowUp2 => record.has_followup2() && !record.is_closed(),
        }
    }

    /// Parse a group name, accepting the legacy aliases.
    pub fn from_str_value(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().as_str() {
            "" | "all" => Ok(LeadGroup::All),
            "closed" | "encerrado" => Ok(LeadGroup::Closed),
            "active" | "andamento" | "in_progress" => Ok(LeadGroup::Active),
            "follow_up_1" | "followup1" => Ok(LeadGroup::FollowUp1),
            "follow_up_2" | "followup2" => Ok(LeadGroup::FollowUp2),
            other => Err(CoreError::Validation(format!(
                "Unknown lead group '{other}'"
            ))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadGroup::All => "All",
            LeadGroup::Closed => "Closed",
            LeadGroup::Active => "Active",
            LeadGroup::FollowUp1 => "Follow-up 1 only",
            LeadGroup::FollowUp2 => "Follow-up 2 only",
        }
    }
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// A row from the auxiliary display-name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    pub remote_jid: String,
    pub name: String,
}

/// Normalise a remote id for name matching: trimmed and lowercased.
pub fn normalize_remote_id(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lookup table from normalised remote id to display name.
///
/// When the source table holds duplicates the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    names: HashMap<String, String>,
}

impl NameDirectory {
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a DisplayName>,
    {
        let mut map = HashMap::new();
        for entry in names {
            let key = normalize_remote_id(&entry.remote_jid);
            let name = entry.name.trim();
            if key.is_empty() || name.is_empty() {
                continue;
            }
            map.entry(key).or_insert_with(|| name.to_string());
        }
        Self { names: map }
    }

    pub fn lookup(&self, remote_jid: Option<&str>) -> Option<&str> {
        let key = normalize_remote_id(remote_jid?);
        self.names.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Blocked-number validation and batch bookkeeping.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Shortest accepted number (area code + subscriber).
pub const MIN_DIGITS: usize = 8;
/// E.164 maximum.
pub const MAX_DIGITS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedNumber {
    pub id: DbId,
    pub number: String,
    pub created_at: Option<Timestamp>,
}

/// Strip the usual separators and a leading `+`; what remains must be
/// 8 to 15 digits.
pub fn normalize_number(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Phone number is empty".into()));
    }
    let stripped: String = trimmed
        .trim_start_matches('+')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if !stripped.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "'{trimmed}' contains characters other than digits"
        )));
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&stripped.len()) {
        return Err(CoreError::Validation(format!(
            "'{trimmed}' must have between {MIN_DIGITS} and {MAX_DIGITS} digits including country and area code"
        )));
    }
    Ok(stripped)
}

/// Validate a submitted batch: non-empty, every entry valid, no entry
/// repeated once normalised.
pub fn prepare_batch(raw: &[String]) -> Result<Vec<String>, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::Validation(
            "Add at least one number before submitting".into(),
        ));
    }
    let mut seen = HashSet::new();
    let mut numbers = Vec::with_capacity(raw.len());
    for entry in raw {
        let number = normalize_number(entry)?;
        if !seen.insert(number.clone()) {
            return Err(CoreError::Validation(format!(
                "Number {number} appears more than once"
            )));
        }
        numbers.push(number);
    }
    Ok(numbers)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNumber {
    pub number: String,
    pub reason: String,
}

/// Result of inserting a batch one number at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub added: Vec<String>,
    /// Already in the table; counted as success.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedNumber>,
}

impl BatchOutcome {
    pub fn record_added(&mut self, number: String) {
        self.added.push(number);
    }

    pub fn record_skipped(&mut self, number: String) {
        self.skipped.push(number);
    }

    pub fn record_failed(&mut self, number: String, reason: impl Into<String>) {
        self.failed.push(FailedNumber {
            number,
            reason: reason.into(),
        });
    }

    pub fn succeeded(&self) -> usize {
        self.added.len() + self.skipped.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && self.succeeded() > 0
    }

    pub fn all_failed(&self) -> bool {
        !self.failed.is_empty() && self.succeeded() == 0
    }

    /// True when the table actually changed.
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("{} number(s) saved", self.succeeded())
        } else {
            format!(
                "{} number(s) saved, {} failed",
                self.succeeded(),
                self.failed.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn normalizes_common_formats() {
        assert_eq!(normalize_number(" +55 (11) 99999-0000 ").unwrap(), "5511999990000");
        assert_eq!(normalize_number("5511.9999.0000").unwrap(), "551199990000");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert_matches!(normalize_number("   "), Err(CoreError::Validation(_)));
        assert_matches!(normalize_number("55119999abcd"), Err(CoreError::Validation(_)));
        assert_matches!(normalize_number("12345"), Err(CoreError::Validation(_)));
        assert_matches!(normalize_number("1234567890123456"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn batch_rejects_empty_and_duplicates() {
        assert_matches!(prepare_batch(&[]), Err(CoreError::Validation(_)));
        let dup = vec!["5511999990000".to_string(), "+55 11 99999-0000".to_string()];
        assert_matches!(prepare_batch(&dup), Err(CoreError::Validation(_)));

        let ok = vec!["5511999990000".to_string(), "5511999990001".to_string()];
        assert_eq!(prepare_batch(&ok).unwrap().len(), 2);
    }

    #[test]
    fn outcome_summary() {
        let mut outcome = BatchOutcome::default();
        outcome.record_added("1".into());
        outcome.record_skipped("2".into());
        assert_eq!(outcome.summary(), "2 number(s) saved");
        assert!(outcome.changed());

        outcome.record_failed("3".into(), "timeout");
        assert!(outcome.is_partial());
        assert!(!outcome.all_failed());
        assert_eq!(outcome.summary(), "2 number(s) saved, 1 failed");
    }
}

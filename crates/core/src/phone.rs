//! Phone number masking for lead listings and exports.

use crate::session::ADMIN_ROLE;

/// Shown when no number is known.
pub const MISSING: &str = "-";

/// Digits only.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// The phone part of a messaging address: `5511999990000@s.whatsapp.net`
/// and `5511999990000:12@s.whatsapp.net` both yield `5511999990000`.
pub fn phone_from_remote_id(remote_jid: &str) -> Option<String> {
    let local = remote_jid.split('@').next().unwrap_or_default();
    let local = local.split(':').next().unwrap_or_default();
    let clean = digits(local);
    (!clean.is_empty()).then_some(clean)
}

/// Keep the first 4 and last 2 digits, star out the rest.
///
/// Numbers with fewer than 6 digits are returned as digits unmasked.
pub fn mask_phone_number(phone: Option<&str>) -> String {
    let Some(phone) = phone.filter(|p| !p.is_empty()) else {
        return MISSING.to_string();
    };
    let clean = digits(phone);
    if clean.len() < 6 {
        return clean;
    }
    let middle = clean.len() - 6;
    format!("{}{}{}", &clean[..4], "*".repeat(middle), &clean[clean.len() - 2..])
}

/// Masked number laid out as `+CC (AA) XXXXX-XXXX` when long enough to
/// carry country and area codes.
pub fn format_masked_phone(phone: Option<&str>) -> String {
    let masked = mask_phone_number(phone);
    if masked.len() >= 13 {
        format!(
            "+{} ({}) {}-{}",
            &masked[..2],
            &masked[2..4],
            &masked[4..9],
            &masked[9..]
        )
    } else {
        masked
    }
}

/// Only administrators see raw numbers.
pub fn can_view_unmasked(role: &str) -> bool {
    role == ADMIN_ROLE
}

/// Phone column value for a record, masked unless `reveal` is set.
pub fn display_phone(remote_jid: Option<&str>, reveal: bool) -> String {
    let phone = remote_jid.and_then(phone_from_remote_id);
    match (phone, reveal) {
        (Some(p), true) => p,
        (phone, false) => format_masked_phone(phone.as_deref()),
        (None, true) => MISSING.to_string(),
    }
}

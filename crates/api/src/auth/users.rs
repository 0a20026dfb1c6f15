//! Dashboard accounts from `DASHBOARD_USERS`.
//!
//! Format: `username:role:phc-hash` entries separated by `;`. The PHC hash
//! itself contains `$` and `,` but never `:` or `;`.

use crate::auth::password::is_valid_hash;

#[derive(Clone)]
pub struct DashboardUser {
    pub username: String,
    pub role: String,
    pub password_hash: String,
}

impl std::fmt::Debug for DashboardUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardUser")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub fn parse_users(raw: &str) -> Result<Vec<DashboardUser>, String> {
    let mut users: Vec<DashboardUser> = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(3, ':');
        let (Some(username), Some(role), Some(hash)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("entry '{entry}' must be username:role:hash"));
        };
        let username = username.trim();
        let role = role.trim();
        let hash = hash.trim();
        if username.is_empty() || role.is_empty() {
            return Err(format!("entry '{entry}' has an empty username or role"));
        }
        if !is_valid_hash(hash) {
            return Err(format!("password hash for '{username}' is not a PHC string"));
        }
        if users.iter().any(|u| u.username == username) {
            return Err(format!("user '{username}' is listed twice"));
        }
        users.push(DashboardUser {
            username: username.to_string(),
            role: role.to_string(),
            password_hash: hash.to_string(),
        });
    }
    Ok(users)
}

/// Find an account by username (exact match).
pub fn find_user<'a>(users: &'a [DashboardUser], username: &str) -> Option<&'a DashboardUser> {
    users.iter().find(|u| u.username == username.trim())
}

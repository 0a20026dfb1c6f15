use chrono::FixedOffset;
use leadboard_db::tables::TableNames;

use crate::auth::jwt::JwtConfig;
use crate::auth::users::{parse_users, DashboardUser};

/// Outbound webhook settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// `None` disables forwarding and the blocked-number notifications.
    pub base_url: Option<String>,
    pub submit_path: String,
    pub delete_path: String,
    pub timeout_secs: u64,
}

/// Server configuration loaded from environment variables.
///
/// Every field has a development default except `JWT_SECRET`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Accounts allowed to sign in.
    pub users: Vec<DashboardUser>,
    /// Offset used for day/hour buckets and export dates.
    pub utc_offset: FixedOffset,
    pub leads_poll_secs: u64,
    pub names_poll_secs: u64,
    pub tables: TableNames,
    /// `LISTEN` channel for change notifications; `None` disables realtime.
    pub realtime_channel: Option<String>,
    pub webhook: WebhookConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                    |
    /// |------------------------------|----------------------------|
    /// | `HOST`                       | `0.0.0.0`                  |
    /// | `PORT`                       | `3000`                     |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                       |
    /// | `DASHBOARD_USERS`            | (none)                     |
    /// | `DASHBOARD_UTC_OFFSET_HOURS` | `0`                        |
    /// | `LEADS_POLL_SECS`            | `300`                      |
    /// | `NAMES_POLL_SECS`            | `600`                      |
    /// | `*_TABLE`                    | see [`TableNames`]         |
    /// | `REALTIME_CHANNEL`           | (disabled)                 |
    /// | `WEBHOOK_BASE_URL`           | (disabled)                 |
    /// | `WEBHOOK_SUBMIT_PATH`        | `/webhook/numeros`         |
    /// | `WEBHOOK_DELETE_PATH`        | `/webhook-test/deletanum`  |
    /// | `WEBHOOK_TIMEOUT_SECS`       | `10`                       |
    ///
    /// # Panics
    ///
    /// Panics on any unparseable value so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs = env_u64("SHUTDOWN_TIMEOUT_SECS", 30);

        let users = parse_users(&env_or("DASHBOARD_USERS", ""))
            .unwrap_or_else(|e| panic!("DASHBOARD_USERS is invalid: {e}"));
        if users.is_empty() {
            tracing::warn!("DASHBOARD_USERS is empty; nobody can sign in");
        }

        let offset_hours: i32 = env_or("DASHBOARD_UTC_OFFSET_HOURS", "0")
            .parse()
            .expect("DASHBOARD_UTC_OFFSET_HOURS must be a whole number of hours");
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .expect("DASHBOARD_UTC_OFFSET_HOURS must be between -23 and 23");

        let tables = TableNames::new(
            &env_or("LEADS_TABLE", TableNames::DEFAULT_LEADS),
            &env_or("NAMES_TABLE", TableNames::DEFAULT_NAMES),
            &env_or("BLOCKED_TABLE", TableNames::DEFAULT_BLOCKED),
            &env_or("MESSAGES_TABLE", TableNames::DEFAULT_MESSAGES),
            &env_or("ANALYSIS_TABLE", TableNames::DEFAULT_ANALYSIS),
            &env_or("SUMMARIES_TABLE", TableNames::DEFAULT_SUMMARIES),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let webhook = WebhookConfig {
            base_url: env_opt("WEBHOOK_BASE_URL"),
            submit_path: env_or("WEBHOOK_SUBMIT_PATH", "/webhook/numeros"),
            delete_path: env_or("WEBHOOK_DELETE_PATH", "/webhook-test/deletanum"),
            timeout_secs: env_u64("WEBHOOK_TIMEOUT_SECS", 10),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            users,
            utc_offset,
            leads_poll_secs: env_u64("LEADS_POLL_SECS", 300),
            names_poll_secs: env_u64("NAMES_POLL_SECS", 600),
            tables,
            realtime_channel: env_opt("REALTIME_CHANNEL"),
            webhook,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid u64")),
        Err(_) => default,
    }
}

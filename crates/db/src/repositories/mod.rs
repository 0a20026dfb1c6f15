//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` and the configured [`TableName`](crate::tables::TableName).
//! Reads return whole rows as `jsonb` values.

pub mod analysis_repo;
pub mod blocked_number_repo;
pub mod chat_history_repo;
pub mod lead_repo;
pub mod name_repo;
pub mod summary_repo;

pub use analysis_repo::AnalysisRepo;
pub use blocked_number_repo::BlockedNumberRepo;
pub use chat_history_repo::ChatHistoryRepo;
pub use lead_repo::LeadRepo;
pub use name_repo::NameRepo;
pub use summary_repo::SummaryRepo;

pub mod auth;
pub mod blocked_numbers;
pub mod conversations;
pub mod dashboard;
pub mod export;
pub mod insights;
pub mod leads;
pub mod summaries;
pub mod webhook;

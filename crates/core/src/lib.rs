//! Leadboard domain logic.
//!
//! Everything here is pure computation over already-fetched data: the
//! canonical lead schema and its legacy adapter, chart aggregation, report
//! export, phone masking, conversation parsing, insights, blocked-number
//! validation and the session gate. No database or HTTP dependencies.

pub mod aggregate;
pub mod blocked;
pub mod conversation;
pub mod error;
pub mod export;
pub mod insights;
pub mod lead;
pub mod legacy;
pub mod phone;
pub mod session;
pub mod summary;
pub mod types;

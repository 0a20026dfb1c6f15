//! HTTP server for the lead dashboard.
//!
//! Snapshots of the hosted lead and display-name tables are kept in memory
//! and refreshed on timers, on demand, and on database change notifications.
//! Handlers aggregate and render from those snapshots.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod ws;

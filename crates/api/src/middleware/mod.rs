//! Session extractors.
//!
//! - [`auth::CurrentSession`] -- the resolved session state, never rejects.
//! - [`auth::AuthUser`] -- requires an authenticated session.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.

pub mod auth;
pub mod rbac;

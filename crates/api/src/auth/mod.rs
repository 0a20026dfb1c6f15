//! Sign-in primitives.
//!
//! - [`password`] -- Argon2id verification of configured credentials.
//! - [`jwt`] -- session markers carried as signed tokens.
//! - [`users`] -- the static account list read from configuration.

pub mod jwt;
pub mod password;
pub mod users;

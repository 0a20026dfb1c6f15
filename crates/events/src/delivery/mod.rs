//! Outbound delivery to the external automation.

pub mod webhook;

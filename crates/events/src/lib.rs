//! Change notification plumbing for the dashboard.
//!
//! - [`EventBus`]: in-process fan-out of [`ChangeEvent`]s backed by
//!   `tokio::sync::broadcast`.
//! - [`ChangeListener`]: Postgres `LISTEN` loop that turns table-change
//!   notifications into bus events.
//! - [`delivery`]: outbound forwarding to the automation webhooks.

pub mod bus;
pub mod delivery;
pub mod listener;

pub use bus::{ChangeEvent, ChangeOperation, EventBus};
pub use delivery::webhook::{ForwardedResponse, WebhookError, WebhookForwarder, WebhookTarget};
pub use listener::{ChangeListener, ListenerError};

//! WebSocket push channel.
//!
//! Browsers connect to `/api/v1/ws` and receive a small JSON notice
//! whenever a snapshot is replaced, so they know to re-fetch.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;

//! Long-running tasks that keep the snapshots current.
//!
//! - [`poller::SnapshotPoller`] -- re-fetches one snapshot on a fixed interval.
//! - [`realtime::RealtimeRefresher`] -- re-fetches on database change events.
//!
//! Both stop when their `CancellationToken` fires.

pub mod poller;
pub mod realtime;

pub use poller::SnapshotPoller;
pub use realtime::RealtimeRefresher;

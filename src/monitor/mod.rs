//! Monitoring subsystem.
//!
//! [`ZoneMonitor`] drives per-frame evaluation over a [`ZoneRegistry`].
//! Other threads steer it through a [`ControlHandle`] and observe it through
//! [`EventStream`]s; both are bounded channels so neither side can stall the
//! frame loop.

/// Control commands, replies and the cross-thread handle.
pub mod control;
/// Per-frame orchestration.
pub mod orchestrator;
/// Ordered zone collection.
pub mod registry;
/// Subscriber stream handle.
pub mod stream;

pub use control::{
    ControlCommand, ControlHandle, ControlReply, PendingReply, ZoneStatsReport, COMMAND_NAMES,
};
pub use orchestrator::{SessionId, ZoneMonitor};
pub use registry::ZoneRegistry;
pub use stream::{EventStream, SubscriptionId};

//! Control plane: typed commands, replies and the cross-thread handle.
//!
//! Commands are queued on a bounded channel and applied by the monitor
//! between frames. Each request carries its own reply channel, the same
//! request/ack shape the monitor uses internally for registration.

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::counter::ZoneStats;
use crate::detection::ClassId;
use crate::error::{ControlError, ZoneError, ZoneResult};
use crate::zone::{ZoneId, ZoneInfo, ZoneSpec};

/// Every command name accepted by [`ControlCommand::parse`].
pub const COMMAND_NAMES: [&str; 9] = [
    "add_zone",
    "remove_zone",
    "enable_zone",
    "disable_zone",
    "reset_zone",
    "update_zone",
    "list_zones",
    "get_zone",
    "get_stats",
];

/// A zone-management command.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Register a new zone.
    AddZone(ZoneSpec),
    /// Drop a zone with its counter and crossing state.
    RemoveZone { zone_id: ZoneId },
    EnableZone { zone_id: ZoneId },
    DisableZone { zone_id: ZoneId },
    /// Zero statistics; crossing state is kept.
    ResetZone { zone_id: ZoneId },
    /// Replace geometry of an existing zone of the same kind.
    UpdateZone(ZoneSpec),
    ListZones,
    GetZone { zone_id: ZoneId },
    /// Statistics for one zone, or every zone when `zone_id` is omitted.
    GetStats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zone_id: Option<ZoneId>,
    },
}

impl ControlCommand {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddZone(_) => "add_zone",
            Self::RemoveZone { .. } => "remove_zone",
            Self::EnableZone { .. } => "enable_zone",
            Self::DisableZone { .. } => "disable_zone",
            Self::ResetZone { .. } => "reset_zone",
            Self::UpdateZone(_) => "update_zone",
            Self::ListZones => "list_zones",
            Self::GetZone { .. } => "get_zone",
            Self::GetStats { .. } => "get_stats",
        }
    }

    /// Decodes a JSON command, naming the available commands when the
    /// requested one is unknown.
    pub fn parse(json: &str) -> Result<Self, ControlError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ControlError::MalformedCommand {
                reason: e.to_string(),
            })?;
        let Some(name) = value.get("command").and_then(serde_json::Value::as_str) else {
            return Err(ControlError::MalformedCommand {
                reason: "missing string field 'command'".to_string(),
            });
        };
        if !COMMAND_NAMES.contains(&name) {
            return Err(ControlError::CommandNotAvailable {
                command: name.to_string(),
                available: COMMAND_NAMES.join(", "),
            });
        }
        serde_json::from_value(value).map_err(|e| ControlError::MalformedCommand {
            reason: e.to_string(),
        })
    }
}

/// Per-zone statistics entry in a [`ControlReply::Stats`] reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStatsReport {
    /// Zone the statistics belong to.
    pub zone_id: ZoneId,
    /// Snapshot at the time the command was applied.
    pub stats: ZoneStats,
    /// `stats.count_per_class` keyed by class display name.
    pub count_per_label: BTreeMap<String, u64>,
}

impl ZoneStatsReport {
    /// Pairs a snapshot with its labelled per-class counts.
    #[must_use]
    pub fn new(
        zone_id: ZoneId,
        stats: ZoneStats,
        class_names: &BTreeMap<ClassId, String>,
    ) -> Self {
        let count_per_label = stats.count_per_label(class_names);
        Self {
            zone_id,
            stats,
            count_per_label,
        }
    }
}

/// Successful outcome of a command.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "data", rename_all = "snake_case")]
pub enum ControlReply {
    ZoneAdded(ZoneInfo),
    ZoneRemoved(ZoneInfo),
    /// `changed` is false when the zone was already enabled.
    ZoneEnabled { zone_id: ZoneId, changed: bool },
    /// `changed` is false when the zone was already disabled.
    ZoneDisabled { zone_id: ZoneId, changed: bool },
    ZoneReset { zone_id: ZoneId },
    ZoneUpdated(ZoneInfo),
    Zones(Vec<ZoneInfo>),
    Zone(ZoneInfo),
    Stats(Vec<ZoneStatsReport>),
}

/// A queued command with its reply path.
#[derive(Debug)]
pub(crate) struct ControlRequest {
    pub request_id: Uuid,
    pub command: ControlCommand,
    pub reply: Sender<ZoneResult<ControlReply>>,
}

/// Cloneable handle for submitting commands from any thread.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ControlRequest>,
    capacity: usize,
}

impl ControlHandle {
    pub(crate) const fn new(tx: Sender<ControlRequest>, capacity: usize) -> Self {
        Self { tx, capacity }
    }

    /// Queues a command without blocking.
    ///
    /// The command is applied at the next frame boundary (or explicit
    /// `apply_pending`) on the monitor's thread.
    pub fn submit(&self, command: ControlCommand) -> ZoneResult<PendingReply> {
        let request_id = Uuid::new_v4();
        let (reply_tx, reply_rx) = bounded(1);
        let request = ControlRequest {
            request_id,
            command,
            reply: reply_tx,
        };
        self.tx.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => ControlError::QueueFull {
                path: "monitor_control".to_string(),
                capacity: self.capacity,
            },
            TrySendError::Disconnected(_) => ControlError::Disconnected {
                path: "monitor_control".to_string(),
            },
        })?;
        Ok(PendingReply {
            request_id,
            rx: reply_rx,
        })
    }

    /// Parses a JSON command and queues it.
    pub fn submit_json(&self, json: &str) -> ZoneResult<PendingReply> {
        self.submit(ControlCommand::parse(json)?)
    }

    /// Number of requests waiting to be applied.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

/// Reply slot for a submitted command.
#[derive(Debug)]
pub struct PendingReply {
    request_id: Uuid,
    rx: Receiver<ZoneResult<ControlReply>>,
}

impl PendingReply {
    /// Identifier assigned at submission.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Blocks until the command has been applied.
    pub fn wait(self) -> ZoneResult<ControlReply> {
        self.rx.recv().map_err(|_| {
            ZoneError::Control(ControlError::Disconnected {
                path: "control_reply".to_string(),
            })
        })?
    }

    /// Like [`wait`](Self::wait) with an upper bound.
    pub fn wait_timeout(&self, timeout: Duration) -> ZoneResult<ControlReply> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ZoneError::Control(ControlError::Timeout {
                path: "control_reply".to_string(),
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => ZoneError::Control(ControlError::Disconnected {
                path: "control_reply".to_string(),
            }),
        })?
    }

    /// Returns the reply if it has already arrived.
    pub fn try_get(&self) -> Option<ZoneResult<ControlReply>> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(ZoneError::Control(ControlError::Disconnected {
                    path: "control_reply".to_string(),
                })))
            }
        }
    }
}

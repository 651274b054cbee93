//! Per-frame driver.
//!
//! A [`ZoneMonitor`] owns one session's zones, counters, crossing state,
//! control queue and subscribers. Frames are processed strictly in call
//! order on the caller's thread; control commands queued from elsewhere are
//! applied at the start of the next frame.

use std::collections::BTreeMap;
use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::counter::{self, ZoneStats};
use crate::detection::{AnchorPolicy, ClassId, DetectionFrame};
use crate::error::{ZoneError, ZoneResult};
use crate::frame::FrameResult;
use crate::geometry::{FrameResolution, Point};
use crate::schema::ZoneEventMessage;
use crate::zone::{ZoneId, ZoneInfo};

use super::control::{
    ControlCommand, ControlHandle, ControlReply, ControlRequest, ZoneStatsReport,
};
use super::registry::ZoneRegistry;
use super::stream::{EventStream, SubscriptionId};

/// Unique identifier for a monitor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    tx: Sender<ZoneEventMessage>,
}

/// Zone monitoring orchestrator for one video source.
#[derive(Debug)]
pub struct ZoneMonitor {
    session_id: SessionId,
    source_id: u32,
    anchor: AnchorPolicy,
    class_names: BTreeMap<ClassId, String>,
    stream_capacity: usize,
    control_capacity: usize,
    registry: ZoneRegistry,
    control_tx: Sender<ControlRequest>,
    control_rx: Receiver<ControlRequest>,
    subscribers: Vec<Subscriber>,
    anchors: Vec<Point>,
    frames_processed: u64,
    rejected_frames: u64,
    dropped_messages: u64,
}

impl ZoneMonitor {
    /// Validates the config and starts a session with its zones registered.
    pub fn new(config: MonitorConfig) -> ZoneResult<Self> {
        let zones = config.build_zones()?;
        let registry =
            ZoneRegistry::with_zones(zones, config.frame_resolution, config.crossing_eviction);
        let (control_tx, control_rx) = bounded(config.control_queue_capacity);
        let session_id = SessionId::new();
        info!(
            session_id = %session_id,
            source_id = config.source_id,
            frame = %config.frame_resolution,
            zones = registry.len(),
            "zone monitor started"
        );
        Ok(Self {
            session_id,
            source_id: config.source_id,
            anchor: config.anchor,
            class_names: config.class_names,
            stream_capacity: config.stream_capacity,
            control_capacity: config.control_queue_capacity,
            registry,
            control_tx,
            control_rx,
            subscribers: Vec::new(),
            anchors: Vec::new(),
            frames_processed: 0,
            rejected_frames: 0,
            dropped_messages: 0,
        })
    }

    /// Random id assigned at construction.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Stream id stamped into every message.
    #[must_use]
    pub const fn source_id(&self) -> u32 {
        self.source_id
    }

    /// Anchor policy fixed for this session.
    #[must_use]
    pub const fn anchor_policy(&self) -> AnchorPolicy {
        self.anchor
    }

    /// Configured class display names.
    #[must_use]
    pub const fn class_names(&self) -> &BTreeMap<ClassId, String> {
        &self.class_names
    }

    /// Display name for a class, `class_<id>` when none is configured.
    #[must_use]
    pub fn class_label(&self, class_id: ClassId) -> String {
        counter::class_label(class_id, &self.class_names)
    }

    /// Frame space detections and zones must use.
    #[must_use]
    pub const fn frame_resolution(&self) -> FrameResolution {
        self.registry.frame()
    }

    /// Read access to the registered zones.
    #[must_use]
    pub const fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// A handle other threads can use to queue control commands.
    #[must_use]
    pub fn control_handle(&self) -> ControlHandle {
        ControlHandle::new(self.control_tx.clone(), self.control_capacity)
    }

    /// Opens a new event stream receiving one message per processed frame.
    pub fn subscribe(&mut self) -> EventStream {
        let id = SubscriptionId::new();
        let (tx, rx) = bounded(self.stream_capacity);
        self.subscribers.push(Subscriber { id, tx });
        debug!(subscription_id = %id, "event stream opened");
        EventStream::new(id, rx)
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Applies a command immediately.
    pub fn apply(&mut self, command: ControlCommand) -> ZoneResult<ControlReply> {
        let reg = &mut self.registry;
        let names = &self.class_names;
        let reply = match command {
            ControlCommand::AddZone(spec) => ControlReply::ZoneAdded(reg.add(&spec)?),
            ControlCommand::RemoveZone { zone_id } => {
                ControlReply::ZoneRemoved(reg.remove(&zone_id)?)
            }
            ControlCommand::EnableZone { zone_id } => {
                let changed = reg.set_enabled(&zone_id, true)?;
                ControlReply::ZoneEnabled { zone_id, changed }
            }
            ControlCommand::DisableZone { zone_id } => {
                let changed = reg.set_enabled(&zone_id, false)?;
                ControlReply::ZoneDisabled { zone_id, changed }
            }
            ControlCommand::ResetZone { zone_id } => {
                reg.reset(&zone_id)?;
                ControlReply::ZoneReset { zone_id }
            }
            ControlCommand::UpdateZone(spec) => ControlReply::ZoneUpdated(reg.update(&spec)?),
            ControlCommand::ListZones => ControlReply::Zones(reg.list()),
            ControlCommand::GetZone { zone_id } => ControlReply::Zone(reg.info(&zone_id)?),
            ControlCommand::GetStats { zone_id: Some(zone_id) } => {
                let stats = reg.stats(&zone_id)?;
                ControlReply::Stats(vec![ZoneStatsReport::new(zone_id, stats, names)])
            }
            ControlCommand::GetStats { zone_id: None } => ControlReply::Stats(
                reg.all_stats()
                    .into_iter()
                    .map(|(zone_id, stats)| ZoneStatsReport::new(zone_id, stats, names))
                    .collect(),
            ),
        };
        Ok(reply)
    }

    /// Drains the control queue, answering every request. Returns how many
    /// requests were applied.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(request) = self.control_rx.try_recv() {
            let name = request.command.name();
            let result = self.apply(request.command);
            if let Err(err) = &result {
                debug!(
                    request_id = %request.request_id,
                    command = name,
                    error = %err,
                    "control command failed"
                );
            }
            // A caller that stopped waiting is not an error.
            let _ = request.reply.send(result);
            applied += 1;
        }
        applied
    }

    /// Processes one frame.
    ///
    /// Pending control commands are applied first. An invalid frame is
    /// rejected before any zone state changes.
    pub fn process_frame(&mut self, frame: &DetectionFrame) -> ZoneResult<FrameResult> {
        self.apply_pending();

        if let Err(err) = frame.validate() {
            self.rejected_frames += 1;
            warn!(frame_id = frame.frame_id, error = %err, "rejected detection frame");
            return Err(err.into());
        }

        self.anchors.clear();
        self.anchors
            .extend(frame.detections.iter().map(|d| d.bbox.anchor(self.anchor)));

        let anchors = &self.anchors;
        let zones = self
            .registry
            .zones_mut()
            .filter_map(|zone| zone.process(&frame.detections, anchors))
            .collect();

        let result = FrameResult {
            frame_id: frame.frame_id,
            timestamp: frame.timestamp,
            zones,
        };
        self.frames_processed += 1;
        debug!(
            frame_id = result.frame_id,
            detections = frame.detections.len(),
            zones = result.zones.len(),
            crossings = result.crossing_count(),
            "frame processed"
        );

        self.publish(&result);
        Ok(result)
    }

    fn publish(&mut self, result: &FrameResult) {
        if self.subscribers.is_empty() {
            return;
        }
        let message = ZoneEventMessage::from_frame(result, self.source_id);
        if message.is_empty() {
            return;
        }

        let mut dropped = 0u64;
        self.subscribers.retain(|sub| match sub.tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(subscription_id = %sub.id, "event stream closed");
                false
            }
        });
        if dropped > 0 {
            self.dropped_messages += dropped;
            warn!(
                frame_id = result.frame_id,
                dropped,
                total_dropped = self.dropped_messages,
                "event stream full, message dropped"
            );
        }
    }

    /// Statistics for one zone.
    pub fn zone_stats(&self, zone_id: &str) -> ZoneResult<ZoneStats> {
        let zone_id = ZoneId::new(zone_id)?;
        Ok(self.registry.stats(&zone_id)?)
    }

    /// Description of one zone.
    pub fn zone_info(&self, zone_id: &str) -> ZoneResult<ZoneInfo> {
        let zone_id = ZoneId::new(zone_id)?;
        self.registry.info(&zone_id).map_err(ZoneError::from)
    }

    /// Every zone, in evaluation order.
    #[must_use]
    pub fn zones(&self) -> Vec<ZoneInfo> {
        self.registry.list()
    }

    /// Frames successfully processed this session.
    #[must_use]
    pub const fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames rejected by validation this session.
    #[must_use]
    pub const fn rejected_frames(&self) -> u64 {
        self.rejected_frames
    }

    /// Messages dropped because a subscriber's buffer was full.
    #[must_use]
    pub const fn dropped_messages(&self) -> u64 {
        self.dropped_messages
    }
}

//! Per-frame evaluation results.
//!
//! These values are ephemeral: they describe what happened in a single frame
//! and are handed back to the caller by value.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counter::ZoneStats;
use crate::detection::{ClassId, TrackerId};
use crate::zone::{ZoneId, ZoneKind};

/// Direction of a boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingDirection {
    /// Counted towards `total_in`.
    In,
    /// Counted towards `total_out`.
    Out,
}

impl fmt::Display for CrossingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// An identity currently inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Tracked identity.
    pub tracker_id: TrackerId,
    /// Detector class.
    pub class_id: ClassId,
}

/// A single crossing completed during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    /// Tracked identity.
    pub tracker_id: TrackerId,
    /// Detector class.
    pub class_id: ClassId,
    /// Mapped crossing direction.
    pub direction: CrossingDirection,
}

/// What one zone observed in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneEvaluation {
    /// Region occupancy, in detection order.
    Region {
        /// Identities whose anchor is inside.
        inside: Vec<Occupant>,
    },
    /// Boundary crossings completed this frame, in detection order.
    Boundary {
        /// Completed crossings.
        crossings: Vec<CrossingEvent>,
    },
}

impl ZoneEvaluation {
    /// Shape that produced this evaluation.
    #[must_use]
    pub const fn kind(&self) -> ZoneKind {
        match self {
            Self::Region { .. } => ZoneKind::Region,
            Self::Boundary { .. } => ZoneKind::Boundary,
        }
    }

    /// Occupants for a region evaluation; empty for boundaries.
    #[must_use]
    pub fn inside(&self) -> &[Occupant] {
        match self {
            Self::Region { inside } => inside,
            Self::Boundary { .. } => &[],
        }
    }

    /// Crossings for a boundary evaluation; empty for regions.
    #[must_use]
    pub fn crossings(&self) -> &[CrossingEvent] {
        match self {
            Self::Region { .. } => &[],
            Self::Boundary { crossings } => crossings,
        }
    }

    /// Tracker ids that crossed in the given direction.
    #[must_use]
    pub fn crossed(&self, direction: CrossingDirection) -> Vec<TrackerId> {
        self.crossings()
            .iter()
            .filter(|c| c.direction == direction)
            .map(|c| c.tracker_id)
            .collect()
    }

    /// Every tracker id that triggered this zone this frame.
    #[must_use]
    pub fn triggered_by(&self) -> Vec<TrackerId> {
        match self {
            Self::Region { inside } => inside.iter().map(|o| o.tracker_id).collect(),
            Self::Boundary { crossings } => crossings.iter().map(|c| c.tracker_id).collect(),
        }
    }
}

/// One zone's contribution to a frame result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneFrameResult {
    /// Evaluated zone.
    pub zone_id: ZoneId,
    /// What the zone saw this frame.
    pub evaluation: ZoneEvaluation,
    /// Counter snapshot taken right after this frame's update.
    pub stats: ZoneStats,
}

/// Combined result of processing one frame, enabled zones in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Source frame id.
    pub frame_id: u64,
    /// Source frame capture time.
    pub timestamp: DateTime<Utc>,
    /// Enabled zones, in registration order.
    pub zones: Vec<ZoneFrameResult>,
}

impl FrameResult {
    /// Looks up a zone's result by id.
    #[must_use]
    pub fn zone(&self, zone_id: &str) -> Option<&ZoneFrameResult> {
        self.zones.iter().find(|z| z.zone_id.as_str() == zone_id)
    }

    /// Total crossings across all boundary zones this frame.
    #[must_use]
    pub fn crossing_count(&self) -> usize {
        self.zones.iter().map(|z| z.evaluation.crossings().len()).sum()
    }
}

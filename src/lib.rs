//! # zonewatch - Zone Monitoring Engine
//!
//! zonewatch turns a per-frame stream of tracked detections into zone-level
//! semantics: which identities are inside a region right now, and which
//! identities crossed a line in which direction. Results are aggregated into
//! per-zone counters and emitted as structured zone-event messages.
//!
//! ## Core Concepts
//!
//! - **Zone**: a region (closed polygon) or boundary (oriented line) with a stable id
//! - **Anchor point**: the single point of a bounding box used for geometry tests
//! - **Crossing state**: last known side of a boundary per tracker id
//! - **Zone stats**: immutable counter snapshots returned by value
//! - **ZoneMonitor**: the per-frame driver with a control queue and event streams
//!
//! ## Usage
//!
//! ```rust
//! use zonewatch::{
//!     BoundingBox, DetectionFrame, DirectionMapping, MonitorConfig, TrackedDetection, ZoneMonitor,
//! };
//!
//! # fn main() -> Result<(), zonewatch::ZoneError> {
//! let config = MonitorConfig::builder()
//!     .frame_resolution(1920, 1080)
//!     .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
//!     .build()?;
//! let mut monitor = ZoneMonitor::new(config)?;
//!
//! let above = BoundingBox::new(480.0, 420.0, 520.0, 500.0);
//! let below = BoundingBox::new(480.0, 500.0, 520.0, 580.0);
//! let before = TrackedDetection::new(7u64, 0u32, 0.9, above);
//! let after = TrackedDetection::new(7u64, 0u32, 0.9, below);
//! monitor.process_frame(&DetectionFrame::new(1, vec![before]))?;
//! monitor.process_frame(&DetectionFrame::new(2, vec![after]))?;
//!
//! assert_eq!(monitor.zone_stats("door")?.total_in, Some(1));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod counter;
pub mod crossing;
pub mod detection;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod zone;

// Wire format and configuration
pub mod config;
pub mod schema;

// Orchestration
pub mod monitor;

// Re-export primary types at crate root for convenience
pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use counter::{class_label, CrossingCounts, ZoneCounter, ZoneStats};
pub use crossing::{CrossingTracker, DirectionMapping, EvictionPolicy};
pub use detection::{
    AnchorPolicy, BoundingBox, ClassId, DetectionFrame, TrackedDetection, TrackerId,
};
pub use error::{ConfigErrors, ControlError, ValidationError, ZoneError, ZoneResult};
pub use frame::{
    CrossingDirection, CrossingEvent, FrameResult, Occupant, ZoneEvaluation, ZoneFrameResult,
};
pub use geometry::{BoundaryZone, FrameResolution, Point, RegionZone, Side, ZoneGeometry};
pub use monitor::{
    ControlCommand, ControlHandle, ControlReply, EventStream, PendingReply, SessionId,
    SubscriptionId, ZoneMonitor, ZoneRegistry, ZoneStatsReport,
};
pub use schema::{EventStats, EventType, ZoneEventEntry, ZoneEventMessage, SCHEMA_VERSION};
pub use zone::{Zone, ZoneId, ZoneInfo, ZoneKind, ZoneSpec};

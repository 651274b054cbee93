//! Tracked detections consumed from the upstream tracker.
//!
//! The engine only reads these values. Nothing here outlives the frame it
//! arrived in except the tracker id, which keys crossing state.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geometry::Point;

/// Identity assigned by the upstream tracker, stable across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerId(u64);

impl TrackerId {
    /// Wraps a raw tracker id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrackerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Detector class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(u32);

impl ClassId {
    /// Wraps a raw class id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClassId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Which point of a bounding box stands in for the object.
///
/// Fixed for the lifetime of a monitor session; changing it mid-run would
/// change every crossing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Midpoint of the bottom edge (where people and vehicles touch the ground).
    #[default]
    BottomCenter,
    /// Box center.
    Center,
    /// Midpoint of the top edge.
    TopCenter,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left and `(x2, y2)`
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl BoundingBox {
    /// Creates a box from corner coordinates.
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a box whose anchor under `policy` is exactly `anchor`.
    ///
    /// Handy for tests and replay tools that only know anchor positions.
    #[must_use]
    pub fn around(anchor: Point, policy: AnchorPolicy, width: f64, height: f64) -> Self {
        let (x1, y1) = match policy {
            AnchorPolicy::BottomCenter => (anchor.x - width / 2.0, anchor.y - height),
            AnchorPolicy::Center => (anchor.x - width / 2.0, anchor.y - height / 2.0),
            AnchorPolicy::TopCenter => (anchor.x - width / 2.0, anchor.y),
            AnchorPolicy::TopLeft => (anchor.x, anchor.y),
            AnchorPolicy::TopRight => (anchor.x - width, anchor.y),
            AnchorPolicy::BottomLeft => (anchor.x, anchor.y - height),
            AnchorPolicy::BottomRight => (anchor.x - width, anchor.y - height),
        };
        Self::new(x1, y1, x1 + width, y1 + height)
    }

    /// Box width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Box height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Reference point selected by `policy`.
    #[must_use]
    pub fn anchor(&self, policy: AnchorPolicy) -> Point {
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        match policy {
            AnchorPolicy::BottomCenter => Point::new(cx, self.y2),
            AnchorPolicy::Center => Point::new(cx, cy),
            AnchorPolicy::TopCenter => Point::new(cx, self.y1),
            AnchorPolicy::TopLeft => Point::new(self.x1, self.y1),
            AnchorPolicy::TopRight => Point::new(self.x2, self.y1),
            AnchorPolicy::BottomLeft => Point::new(self.x1, self.y2),
            AnchorPolicy::BottomRight => Point::new(self.x2, self.y2),
        }
    }

    // Zero-width or zero-height boxes still have a well-defined anchor.
    fn problem(&self) -> Option<&'static str> {
        if ![self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite()) {
            return Some("non-finite coordinate");
        }
        if self.x2 < self.x1 || self.y2 < self.y1 {
            return Some("inverted corners");
        }
        None
    }
}

/// One tracked object in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    /// Stable tracker identity.
    pub tracker_id: TrackerId,
    /// Detector class.
    pub class_id: ClassId,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// Box in frame pixels.
    pub bbox: BoundingBox,
}

impl TrackedDetection {
    /// Creates a detection.
    #[must_use]
    pub fn new(
        tracker_id: impl Into<TrackerId>,
        class_id: impl Into<ClassId>,
        confidence: f32,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            class_id: class_id.into(),
            confidence,
            bbox,
        }
    }

    /// Checks confidence range and box shape (finite, `x1 <= x2`, `y1 <= y2`).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange {
                tracker_id: self.tracker_id,
                value: self.confidence,
            });
        }
        if let Some(reason) = self.bbox.problem() {
            return Err(ValidationError::InvalidBoundingBox {
                tracker_id: self.tracker_id,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }
}

/// The tracker's output for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Sequential frame number from the video source.
    pub frame_id: u64,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Detections in tracker order.
    pub detections: Vec<TrackedDetection>,
}

impl DetectionFrame {
    /// Creates a frame stamped with the current time.
    #[must_use]
    pub fn new(frame_id: u64, detections: Vec<TrackedDetection>) -> Self {
        Self {
            frame_id,
            timestamp: Utc::now(),
            detections,
        }
    }

    /// Creates a frame with an explicit capture time.
    #[must_use]
    pub fn at(frame_id: u64, timestamp: DateTime<Utc>, detections: Vec<TrackedDetection>) -> Self {
        Self {
            frame_id,
            timestamp,
            detections,
        }
    }

    /// Validates every detection and tracker-id uniqueness within the frame.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(self.detections.len());
        for det in &self.detections {
            det.validate()?;
            if !seen.insert(det.tracker_id) {
                return Err(ValidationError::DuplicateTrackerId {
                    tracker_id: det.tracker_id,
                    frame_id: self.frame_id,
                });
            }
        }
        Ok(())
    }

    /// Anchor points for every detection, in detection order.
    #[must_use]
    pub fn anchors(&self, policy: AnchorPolicy) -> Vec<Point> {
        self.detections.iter().map(|d| d.bbox.anchor(policy)).collect()
    }
}

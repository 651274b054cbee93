//! Zones: identity, geometry, enablement, crossing state and statistics.
//!
//! A [`Zone`] is the unit the monitor evaluates each frame. Geometry is fixed
//! at construction; only the enabled flag changes afterwards. Statistics and
//! crossing state are owned per zone and never shared.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::counter::{ZoneCounter, ZoneStats};
use crate::crossing::CrossingTracker;
use crate::detection::TrackedDetection;
use crate::error::ValidationError;
use crate::frame::{CrossingEvent, Occupant, ZoneEvaluation, ZoneFrameResult};
use crate::geometry::{BoundaryZone, GeometryReadings, Point, RegionZone, ZoneGeometry};

pub use crate::crossing::{DirectionMapping, EvictionPolicy};
pub use crate::geometry::FrameResolution;

/// Longest accepted zone id.
pub const MAX_ZONE_ID_LEN: usize = 128;

const ZONE_ID_PATTERN: &str = r"^[A-Za-z0-9_.:-]+$";

static ZONE_ID_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Unique, stable zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneId(String);

impl ZoneId {
    /// Validates and wraps a zone id.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let problem = if id.is_empty() {
            Some("must not be empty".to_string())
        } else if id.chars().count() > MAX_ZONE_ID_LEN {
            Some(format!("longer than {MAX_ZONE_ID_LEN} characters"))
        } else {
            match ZONE_ID_RE.get_or_init(|| Regex::new(ZONE_ID_PATTERN)) {
                Ok(re) if re.is_match(&id) => None,
                Ok(_) => {
                    Some("only letters, digits, '_', '.', ':' and '-' are allowed".to_string())
                }
                Err(e) => Some(format!("pattern unavailable: {e}")),
            }
        };
        match problem {
            None => Ok(Self(id)),
            Some(reason) => Err(ValidationError::InvalidZoneId { zone_id: id, reason }),
        }
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ZoneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ZoneId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ZoneId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for ZoneId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ZoneId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneId> for String {
    fn from(id: ZoneId) -> Self {
        id.0
    }
}

/// Zone shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Closed polygon, occupancy semantics.
    #[serde(rename = "region", alias = "polygon")]
    Region,
    /// Oriented line, crossing semantics.
    #[serde(rename = "boundary", alias = "line")]
    Boundary,
}

impl ZoneKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Boundary => "boundary",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn default_enabled() -> bool {
    true
}

/// Declarative zone definition, as found in configuration files and
/// `add_zone` / `update_zone` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Requested id; validated when the zone is built.
    pub zone_id: String,
    /// Region or boundary.
    pub zone_type: ZoneKind,
    /// Polygon vertices, or exactly two boundary endpoints.
    pub coordinates: Vec<[f64; 2]>,
    /// Initial enablement.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Boundary direction mapping; ignored for regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<DirectionMapping>,
    /// Frame the coordinates were drawn against. Must match the monitor when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_resolution: Option<FrameResolution>,
}

impl ZoneSpec {
    /// Region spec from polygon vertices.
    #[must_use]
    pub fn region(
        zone_id: impl Into<String>,
        vertices: impl IntoIterator<Item = [f64; 2]>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            zone_type: ZoneKind::Region,
            coordinates: vertices.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Boundary spec from two endpoints.
    #[must_use]
    pub fn boundary(zone_id: impl Into<String>, start: [f64; 2], end: [f64; 2]) -> Self {
        Self {
            zone_id: zone_id.into(),
            zone_type: ZoneKind::Boundary,
            coordinates: vec![start, end],
            ..Self::default()
        }
    }

    /// Sets the boundary direction mapping.
    #[must_use]
    pub fn with_direction(mut self, direction: DirectionMapping) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Declares the frame the coordinates belong to.
    #[must_use]
    pub fn with_frame_resolution(mut self, frame: FrameResolution) -> Self {
        self.frame_resolution = Some(frame);
        self
    }

    /// Sets the initial enabled flag.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks what can be checked without a frame: the id and the number of
    /// coordinates for the zone kind.
    pub fn check_shape(&self) -> Result<ZoneId, ValidationError> {
        let id = ZoneId::new(self.zone_id.as_str())?;
        let count = self.coordinates.len();
        match self.zone_type {
            ZoneKind::Region if count < 3 => Err(ValidationError::TooFewVertices {
                zone_id: self.zone_id.clone(),
                count,
            }),
            ZoneKind::Boundary if count != 2 => Err(ValidationError::WrongEndpointCount {
                zone_id: self.zone_id.clone(),
                count,
            }),
            _ => Ok(id),
        }
    }
}

impl Default for ZoneSpec {
    fn default() -> Self {
        Self {
            zone_id: String::new(),
            zone_type: ZoneKind::Region,
            coordinates: Vec::new(),
            enabled: true,
            direction: None,
            frame_resolution: None,
        }
    }
}

/// Read-only description of a registered zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Registered id.
    pub zone_id: ZoneId,
    /// Region or boundary.
    pub zone_type: ZoneKind,
    /// Vertices or endpoints, as registered.
    pub coordinates: Vec<[f64; 2]>,
    /// Whether the zone is evaluated each frame.
    pub enabled: bool,
    /// Boundary zones only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<DirectionMapping>,
    /// Frame the geometry was validated against.
    pub frame_resolution: FrameResolution,
    /// Identities with a known side (always zero for regions).
    pub tracked_identities: usize,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// A registered zone with its own counter and crossing state.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    geometry: ZoneGeometry,
    enabled: bool,
    crossings: CrossingTracker,
    counter: ZoneCounter,
    created_at: DateTime<Utc>,
}

impl Zone {
    /// Builds a zone from a spec against the monitor's frame.
    pub fn from_spec(
        spec: &ZoneSpec,
        frame: FrameResolution,
        eviction: EvictionPolicy,
    ) -> Result<Self, ValidationError> {
        let id = spec.check_shape()?;
        if let Some(declared) = spec.frame_resolution {
            if declared != frame {
                return Err(ValidationError::ResolutionMismatch {
                    zone_id: spec.zone_id.clone(),
                    zone: declared,
                    monitor: frame,
                });
            }
        }
        if let (EvictionPolicy::AfterIdleEvaluations(0), ZoneKind::Boundary) =
            (eviction, spec.zone_type)
        {
            return Err(ValidationError::ZeroEvictionWindow);
        }

        let points: Vec<Point> = spec.coordinates.iter().copied().map(Point::from).collect();
        let geometry = match spec.zone_type {
            ZoneKind::Region => ZoneGeometry::Region(RegionZone::new(id.as_str(), points, frame)?),
            ZoneKind::Boundary => {
                let [start, end] = points[..] else {
                    return Err(ValidationError::WrongEndpointCount {
                        zone_id: spec.zone_id.clone(),
                        count: points.len(),
                    });
                };
                ZoneGeometry::Boundary(BoundaryZone::new(id.as_str(), start, end, frame)?)
            }
        };

        Ok(Self {
            counter: ZoneCounter::new(spec.zone_type),
            crossings: CrossingTracker::new(spec.direction.unwrap_or_default(), eviction),
            id,
            geometry,
            enabled: spec.enabled,
            created_at: Utc::now(),
        })
    }

    /// Convenience constructor for an enabled region.
    pub fn region(
        zone_id: &str,
        vertices: impl IntoIterator<Item = [f64; 2]>,
        frame: FrameResolution,
    ) -> Result<Self, ValidationError> {
        Self::from_spec(&ZoneSpec::region(zone_id, vertices), frame, EvictionPolicy::Never)
    }

    /// Convenience constructor for an enabled boundary.
    pub fn boundary(
        zone_id: &str,
        start: [f64; 2],
        end: [f64; 2],
        direction: DirectionMapping,
        frame: FrameResolution,
    ) -> Result<Self, ValidationError> {
        Self::from_spec(
            &ZoneSpec::boundary(zone_id, start, end).with_direction(direction),
            frame,
            EvictionPolicy::Never,
        )
    }

    /// Zone id.
    #[must_use]
    pub const fn id(&self) -> &ZoneId {
        &self.id
    }

    /// Region or boundary.
    #[must_use]
    pub const fn kind(&self) -> ZoneKind {
        match self.geometry {
            ZoneGeometry::Region(_) => ZoneKind::Region,
            ZoneGeometry::Boundary(_) => ZoneKind::Boundary,
        }
    }

    /// Validated geometry.
    #[must_use]
    pub const fn geometry(&self) -> &ZoneGeometry {
        &self.geometry
    }

    /// Whether the zone is evaluated each frame.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the enabled flag and returns the previous value.
    ///
    /// Crossing state and statistics are kept as-is across a disable.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    /// Boundary direction mapping, `None` for regions.
    #[must_use]
    pub const fn direction(&self) -> Option<DirectionMapping> {
        match self.geometry {
            ZoneGeometry::Region(_) => None,
            ZoneGeometry::Boundary(_) => Some(self.crossings.mapping()),
        }
    }

    /// Per-identity crossing state (empty for regions).
    #[must_use]
    pub const fn crossings(&self) -> &CrossingTracker {
        &self.crossings
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> ZoneStats {
        self.counter.snapshot()
    }

    /// Zeroes statistics. Crossing state is kept.
    pub fn reset_stats(&mut self) {
        self.counter.reset();
    }

    /// Evaluates the zone against one frame's anchors.
    ///
    /// `anchors[i]` must be the anchor of `detections[i]`. Boundary zones
    /// advance their crossing state; the counter is not touched.
    pub fn evaluate(
        &mut self,
        detections: &[TrackedDetection],
        anchors: &[Point],
    ) -> ZoneEvaluation {
        match self.geometry.evaluate(anchors) {
            GeometryReadings::Membership(flags) => ZoneEvaluation::Region {
                inside: detections
                    .iter()
                    .zip(flags)
                    .filter(|(_, inside)| *inside)
                    .map(|(det, _)| Occupant {
                        tracker_id: det.tracker_id,
                        class_id: det.class_id,
                    })
                    .collect(),
            },
            GeometryReadings::Sides(readings) => {
                let mut crossings = Vec::new();
                for (det, reading) in detections.iter().zip(readings) {
                    if let Some(direction) = self.crossings.observe(det.tracker_id, reading) {
                        trace!(
                            zone_id = %self.id,
                            tracker_id = %det.tracker_id,
                            class_id = %det.class_id,
                            %direction,
                            "boundary crossed"
                        );
                        crossings.push(CrossingEvent {
                            tracker_id: det.tracker_id,
                            class_id: det.class_id,
                            direction,
                        });
                    }
                }
                let evicted = self.crossings.evict_idle();
                if evicted > 0 {
                    debug!(zone_id = %self.id, evicted, "evicted idle crossing state");
                }
                ZoneEvaluation::Boundary { crossings }
            }
        }
    }

    /// Evaluates and folds the result into the counter. Disabled zones
    /// return `None` and are left untouched.
    pub fn process(
        &mut self,
        detections: &[TrackedDetection],
        anchors: &[Point],
    ) -> Option<ZoneFrameResult> {
        if !self.enabled {
            return None;
        }
        let evaluation = self.evaluate(detections, anchors);
        self.counter.update(&evaluation);
        Some(ZoneFrameResult {
            zone_id: self.id.clone(),
            evaluation,
            stats: self.counter.snapshot(),
        })
    }

    /// Read-only description.
    #[must_use]
    pub fn info(&self) -> ZoneInfo {
        ZoneInfo {
            zone_id: self.id.clone(),
            zone_type: self.kind(),
            coordinates: self.geometry.coordinates(),
            enabled: self.enabled,
            direction: self.direction(),
            frame_resolution: self.geometry.frame(),
            tracked_identities: self.crossings.len(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{AnchorPolicy, BoundingBox};
    use crate::frame::CrossingDirection;

    fn detection(id: u64, anchor: [f64; 2]) -> TrackedDetection {
        TrackedDetection::new(
            id,
            0u32,
            0.9,
            BoundingBox::around(Point::from(anchor), AnchorPolicy::BottomCenter, 20.0, 40.0),
        )
    }

    fn run(zone: &mut Zone, dets: &[TrackedDetection]) -> Option<ZoneFrameResult> {
        let anchors: Vec<Point> = dets
            .iter()
            .map(|d| d.bbox.anchor(AnchorPolicy::BottomCenter))
            .collect();
        zone.process(dets, &anchors)
    }

    fn horizon() -> Zone {
        Zone::boundary(
            "horizon",
            [0.0, 540.0],
            [1920.0, 540.0],
            DirectionMapping::PositiveIsIn,
            FrameResolution::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_zone_id_validation() {
        assert!(ZoneId::new("entrance_1").is_ok());
        assert!(ZoneId::new("cam:2.door-a").is_ok());
        assert!(ZoneId::new("").is_err());
        assert!(ZoneId::new("has space").is_err());
        assert!(ZoneId::new("x".repeat(129)).is_err());
        assert!(ZoneId::new("x".repeat(128)).is_ok());
    }

    #[test]
    fn test_zone_id_deserialization_validates() {
        assert!(serde_json::from_str::<ZoneId>(r#""gate""#).is_ok());
        assert!(serde_json::from_str::<ZoneId>(r#""bad id""#).is_err());
    }

    #[test]
    fn test_zone_kind_accepts_legacy_names() {
        assert_eq!(serde_json::from_str::<ZoneKind>(r#""polygon""#).unwrap(), ZoneKind::Region);
        assert_eq!(serde_json::from_str::<ZoneKind>(r#""line""#).unwrap(), ZoneKind::Boundary);
        assert_eq!(serde_json::to_string(&ZoneKind::Boundary).unwrap(), r#""boundary""#);
    }

    #[test]
    fn test_boundary_spec_needs_two_endpoints() {
        let spec = ZoneSpec {
            zone_id: "tri".to_string(),
            zone_type: ZoneKind::Boundary,
            coordinates: vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]],
            ..ZoneSpec::default()
        };
        let err =
            Zone::from_spec(&spec, FrameResolution::default(), EvictionPolicy::Never).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongEndpointCount {
                zone_id: "tri".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_declared_resolution_must_match() {
        let spec = ZoneSpec::region("r", [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]])
            .with_frame_resolution(FrameResolution::new(1280, 720).unwrap());
        let err =
            Zone::from_spec(&spec, FrameResolution::default(), EvictionPolicy::Never).unwrap_err();
        assert!(matches!(err, ValidationError::ResolutionMismatch { .. }));
    }

    #[test]
    fn test_region_occupancy_per_frame() {
        let mut zone = Zone::region(
            "square",
            [[100.0, 200.0], [300.0, 200.0], [300.0, 400.0], [100.0, 400.0]],
            FrameResolution::default(),
        )
        .unwrap();
        for _ in 0..3 {
            let dets = [detection(1, [200.0, 300.0]), detection(2, [900.0, 900.0])];
            let result = run(&mut zone, &dets).unwrap();
            assert_eq!(result.stats.current_count(), Some(1));
            assert_eq!(result.evaluation.triggered_by(), vec![crate::detection::TrackerId::new(1)]);
        }
    }

    #[test]
    fn test_single_crossing_is_counted_once() {
        let mut zone = horizon();
        run(&mut zone, &[detection(7, [500.0, 500.0])]);
        let result = run(&mut zone, &[detection(7, [500.0, 580.0])]).unwrap();
        assert_eq!(result.evaluation.crossed(CrossingDirection::In).len(), 1);
        let result = run(&mut zone, &[detection(7, [500.0, 600.0])]).unwrap();
        assert!(result.evaluation.crossings().is_empty());
        assert_eq!(result.stats.total_in, Some(1));
        assert_eq!(result.stats.total_out, Some(0));
    }

    #[test]
    fn test_disabled_zone_is_untouched() {
        let mut zone = horizon();
        run(&mut zone, &[detection(7, [500.0, 500.0])]);
        assert!(zone.set_enabled(false));
        assert!(run(&mut zone, &[detection(7, [500.0, 580.0])]).is_none());
        assert_eq!(
            zone.crossings().side_of(crate::detection::TrackerId::new(7)),
            Some(crate::geometry::Side::Negative)
        );
        zone.set_enabled(true);
        let result = run(&mut zone, &[detection(7, [500.0, 580.0])]).unwrap();
        assert_eq!(result.stats.total_in, Some(1));
    }

    #[test]
    fn test_reset_keeps_crossing_state() {
        let mut zone = horizon();
        run(&mut zone, &[detection(7, [500.0, 500.0])]);
        run(&mut zone, &[detection(7, [500.0, 580.0])]);
        zone.reset_stats();
        assert_eq!(zone.stats().total_in, Some(0));
        assert_eq!(zone.crossings().len(), 1);
        let result = run(&mut zone, &[detection(7, [500.0, 500.0])]).unwrap();
        assert_eq!(result.stats.total_out, Some(1));
    }

    #[test]
    fn test_info_describes_zone() {
        let zone = horizon();
        let info = zone.info();
        assert_eq!(info.zone_id, "horizon");
        assert_eq!(info.zone_type, ZoneKind::Boundary);
        assert_eq!(info.coordinates, vec![[0.0, 540.0], [1920.0, 540.0]]);
        assert_eq!(info.direction, Some(DirectionMapping::PositiveIsIn));
        assert!(info.enabled);
    }
}

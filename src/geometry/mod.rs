//! Zone geometry.
//!
//! Two immutable shapes are supported: [`RegionZone`] (closed polygon,
//! membership test) and [`BoundaryZone`] (oriented line, side test). Both are
//! validated once at construction and never rebuilt per frame.

/// Oriented line and side readings.
pub mod boundary;
/// Points, bounds and frame coordinate spaces.
pub mod point;
/// Closed polygon regions.
pub mod region;

pub use boundary::{BoundaryZone, Side};
pub use point::{FrameResolution, Point};
pub use region::RegionZone;

/// Per-point output of evaluating a shape against a batch of anchor points.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryReadings {
    /// Region membership, one flag per point.
    Membership(Vec<bool>),
    /// Boundary side, one reading per point (`None` = on the line).
    Sides(Vec<Option<Side>>),
}

impl GeometryReadings {
    /// Number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Membership(v) => v.len(),
            Self::Sides(v) => v.len(),
        }
    }

    /// True when no points were evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Closed set of zone shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneGeometry {
    /// Closed polygon.
    Region(RegionZone),
    /// Oriented line.
    Boundary(BoundaryZone),
}

impl ZoneGeometry {
    /// Evaluates every point against the shape. Pure; no state is touched.
    #[must_use]
    pub fn evaluate(&self, points: &[Point]) -> GeometryReadings {
        match self {
            Self::Region(region) => GeometryReadings::Membership(region.contains_all(points)),
            Self::Boundary(line) => GeometryReadings::Sides(line.sides(points)),
        }
    }

    /// Frame coordinate space the shape belongs to.
    #[must_use]
    pub const fn frame(&self) -> FrameResolution {
        match self {
            Self::Region(region) => region.frame(),
            Self::Boundary(line) => line.frame(),
        }
    }

    /// Defining coordinates: polygon vertices or the two line endpoints.
    #[must_use]
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        match self {
            Self::Region(region) => region.vertices().iter().map(|p| [p.x, p.y]).collect(),
            Self::Boundary(line) => vec![line.start().into(), line.end().into()],
        }
    }
}

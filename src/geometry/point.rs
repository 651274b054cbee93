//! Planar primitives shared by the zone shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A point in frame pixel coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: f64,
    /// Vertical coordinate in pixels.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true when both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 2-D cross product of `(b - self)` and `(p - self)`.
    #[must_use]
    pub fn cross(self, b: Self, p: Self) -> f64 {
        (b.x - self.x) * (p.y - self.y) - (b.y - self.y) * (p.x - self.x)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Pixel dimensions of the frame coordinate space a zone is defined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameResolution {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl FrameResolution {
    /// Creates a validated resolution. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        let res = Self { width, height };
        res.validate()?;
        Ok(res)
    }

    /// Checks that both dimensions are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.width == 0 || self.height == 0 {
            return Err(ValidationError::InvalidFrameResolution {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// True for points inside the closed rectangle `[0, w] x [0, h]`.
    ///
    /// Used for zone vertices, which may sit exactly on the frame edge.
    #[must_use]
    pub fn contains_closed(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= f64::from(self.width) && p.y <= f64::from(self.height)
    }

    /// True for points inside the half-open pixel grid `[0, w) x [0, h)`.
    #[must_use]
    pub fn contains_pixel(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < f64::from(self.width) && p.y < f64::from(self.height)
    }
}

impl Default for FrameResolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl fmt::Display for FrameResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned bounds of a vertex set, used as a cheap pre-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub(crate) fn of(points: &[Point]) -> Self {
        let mut b = Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        b
    }

    pub(crate) fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Validates a coordinate list against the frame, reporting the first bad index.
pub(crate) fn check_coordinates(
    zone_id: &str,
    points: &[Point],
    frame: FrameResolution,
) -> Result<(), ValidationError> {
    for (index, p) in points.iter().enumerate() {
        if !p.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate {
                zone_id: zone_id.to_string(),
                index,
            });
        }
        if !frame.contains_closed(*p) {
            return Err(ValidationError::CoordinateOutOfFrame {
                zone_id: zone_id.to_string(),
                index,
                x: p.x,
                y: p.y,
                width: frame.width,
                height: frame.height,
            });
        }
    }
    Ok(())
}

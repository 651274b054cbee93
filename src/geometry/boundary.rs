//! Oriented line geometry for crossing detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::point::{check_coordinates, FrameResolution, Point};

/// Definite side of an oriented line.
///
/// `Positive` means the cross product `(end - start) x (point - start)` is
/// greater than zero. In image coordinates (y down) that is the right-hand
/// side when walking from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Cross product > 0.
    Positive,
    /// Cross product < 0.
    Negative,
}

impl Side {
    /// `+1` or `-1`.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "+"),
            Self::Negative => write!(f, "-"),
        }
    }
}

/// Immutable oriented line used for directional crossing detection.
///
/// The side test is against the infinite line through both endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryZone {
    start: Point,
    end: Point,
    frame: FrameResolution,
}

impl BoundaryZone {
    /// Builds a boundary from two distinct endpoints.
    pub fn new(
        zone_id: &str,
        start: Point,
        end: Point,
        frame: FrameResolution,
    ) -> Result<Self, ValidationError> {
        frame.validate()?;
        check_coordinates(zone_id, &[start, end], frame)?;
        if start == end {
            return Err(ValidationError::CoincidentEndpoints {
                zone_id: zone_id.to_string(),
                x: start.x,
                y: start.y,
            });
        }
        Ok(Self { start, end, frame })
    }

    /// Line start.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Line end.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Frame coordinate space this boundary was defined against.
    #[must_use]
    pub const fn frame(&self) -> FrameResolution {
        self.frame
    }

    /// Raw cross product `(end - start) x (p - start)`.
    #[must_use]
    pub fn cross(&self, p: Point) -> f64 {
        self.start.cross(self.end, p)
    }

    /// Side of the line `p` lies on; `None` when exactly on the line or when
    /// `p` is not finite.
    #[must_use]
    pub fn side_of(&self, p: Point) -> Option<Side> {
        let c = self.cross(p);
        if c > 0.0 {
            Some(Side::Positive)
        } else if c < 0.0 {
            Some(Side::Negative)
        } else {
            None
        }
    }

    /// Side readings for a batch of points, in input order.
    #[must_use]
    pub fn sides(&self, points: &[Point]) -> Vec<Option<Side>> {
        points.iter().map(|p| self.side_of(*p)).collect()
    }
}

//! Closed-polygon region geometry.
//!
//! Membership uses the even-odd rule. Points lying on an edge or vertex are
//! treated as inside, matching what a filled raster mask of the polygon would
//! report. Anchor points outside the pixel grid are never inside.

use crate::error::ValidationError;

use super::point::{check_coordinates, Bounds, FrameResolution, Point};

/// Perpendicular distance (px) under which a point counts as lying on an edge.
const ON_EDGE_TOLERANCE: f64 = 1e-9;

/// Absolute area (px²) under which a polygon is considered degenerate.
const MIN_POLYGON_AREA: f64 = 1e-9;

/// Immutable polygon zone geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionZone {
    vertices: Vec<Point>,
    bounds: Bounds,
    frame: FrameResolution,
}

impl RegionZone {
    /// Builds a region from at least three vertices.
    ///
    /// Rejects fewer than three vertices, non-finite or out-of-frame
    /// coordinates, and zero-area (collinear) polygons.
    pub fn new(
        zone_id: &str,
        vertices: Vec<Point>,
        frame: FrameResolution,
    ) -> Result<Self, ValidationError> {
        frame.validate()?;
        if vertices.len() < 3 {
            return Err(ValidationError::TooFewVertices {
                zone_id: zone_id.to_string(),
                count: vertices.len(),
            });
        }
        check_coordinates(zone_id, &vertices, frame)?;
        if signed_area(&vertices).abs() < MIN_POLYGON_AREA {
            return Err(ValidationError::DegeneratePolygon {
                zone_id: zone_id.to_string(),
            });
        }

        let bounds = Bounds::of(&vertices);
        Ok(Self {
            vertices,
            bounds,
            frame,
        })
    }

    /// Polygon vertices in definition order.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Frame coordinate space this region was defined against.
    #[must_use]
    pub const fn frame(&self) -> FrameResolution {
        self.frame
    }

    /// Unsigned polygon area in px².
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Point-in-polygon test; edges and vertices count as inside.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        if !p.is_finite() || !self.frame.contains_pixel(p) || !self.bounds.contains(p) {
            return false;
        }
        if self.on_edge(p) {
            return true;
        }
        self.even_odd(p)
    }

    /// Membership for a batch of points, in input order.
    #[must_use]
    pub fn contains_all(&self, points: &[Point]) -> Vec<bool> {
        points.iter().map(|p| self.contains(*p)).collect()
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    fn on_edge(&self, p: Point) -> bool {
        self.edges().any(|(a, b)| {
            let len = a.distance(b);
            if len == 0.0 {
                return a.distance(p) <= ON_EDGE_TOLERANCE;
            }
            let within_x = p.x >= a.x.min(b.x) - ON_EDGE_TOLERANCE
                && p.x <= a.x.max(b.x) + ON_EDGE_TOLERANCE;
            let within_y = p.y >= a.y.min(b.y) - ON_EDGE_TOLERANCE
                && p.y <= a.y.max(b.y) + ON_EDGE_TOLERANCE;
            within_x && within_y && (a.cross(b, p).abs() / len) <= ON_EDGE_TOLERANCE
        })
    }

    fn even_odd(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_at_y = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_at_y {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

//! Point-level value types shared by every layer of the editor.
//!
//! Coordinates are plain `kurbo::Point`s in path-local space. A point in a
//! drawing gesture additionally carries its role: an `End` point is a path
//! vertex, a `Control` point is a Bézier handle between two vertices.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Role of a point inside a segment's point list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    End,
    Control,
}

/// A point tagged with its role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub kind: PointKind,
    pub pos: Point,
}

impl PathPoint {
    pub const fn end(pos: Point) -> Self {
        Self {
            kind: PointKind::End,
            pos,
        }
    }

    pub const fn control(pos: Point) -> Self {
        Self {
            kind: PointKind::Control,
            pos,
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == PointKind::End
    }
}

/// Point reflection of `p` about `pivot`: `2 * pivot - p`.
pub fn reflect(p: Point, pivot: Point) -> Point {
    Point::new(2.0 * pivot.x - p.x, 2.0 * pivot.y - p.y)
}

/// Canonical hash key for a coordinate.
///
/// Two endpoints share a marker exactly when their keys are equal, so the key
/// compares bit patterns after folding `-0.0` into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey(u64, u64);

impl CoordKey {
    pub fn of(p: Point) -> Self {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
        }
        CoordKey(bits(p.x), bits(p.y))
    }
}

impl From<Point> for CoordKey {
    fn from(p: Point) -> Self {
        CoordKey::of(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_mirrors_about_pivot() {
        let m = reflect(Point::new(12.0, 4.0), Point::new(10.0, 10.0));
        assert_eq!(m, Point::new(8.0, 16.0));
    }

    #[test]
    fn coord_key_folds_negative_zero() {
        assert_eq!(
            CoordKey::of(Point::new(-0.0, 5.0)),
            CoordKey::of(Point::new(0.0, 5.0))
        );
        assert_ne!(
            CoordKey::of(Point::new(0.1, 5.0)),
            CoordKey::of(Point::new(0.2, 5.0))
        );
    }
}

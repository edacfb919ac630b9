//! Segment geometry: one straight, quadratic or cubic path piece.
//!
//! A `SegmentGeometry` is validated on construction, so every value of the
//! type has 2, 3 or 4 points. The first and last are endpoints; anything in
//! between is a control point.

use crate::error::PathError;
use crate::geom::reflect;
use crate::path_data::{PathCmd, emit_path_data, parse_path_data};
use kurbo::{CubicBez, Line, ParamCurveNearest, PathSeg, Point, QuadBez, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Point list of a single segment.
pub type SegmentPoints = SmallVec<[Point; 4]>;

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentShape {
    Line,
    Quad,
    Cubic,
}

impl SegmentShape {
    pub fn from_len(count: usize) -> Result<Self, PathError> {
        match count {
            2 => Ok(SegmentShape::Line),
            3 => Ok(SegmentShape::Quad),
            4 => Ok(SegmentShape::Cubic),
            count => Err(PathError::MalformedSegment { count }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentPoints", into = "SegmentPoints")]
pub struct SegmentGeometry {
    points: SegmentPoints,
}

impl TryFrom<SegmentPoints> for SegmentGeometry {
    type Error = PathError;

    fn try_from(points: SegmentPoints) -> Result<Self, Self::Error> {
        SegmentShape::from_len(points.len())?;
        Ok(Self { points })
    }
}

impl From<SegmentGeometry> for SegmentPoints {
    fn from(geometry: SegmentGeometry) -> Self {
        geometry.points
    }
}

impl SegmentGeometry {
    /// # Errors
    /// `MalformedSegment` unless there are 2, 3 or 4 points.
    pub fn new(points: impl IntoIterator<Item = Point>) -> Result<Self, PathError> {
        Self::try_from(points.into_iter().collect::<SegmentPoints>())
    }

    /// Parse a single-segment geometry string (`M` followed by one drawing
    /// command).
    pub fn from_path_data(d: &str) -> Result<Self, PathError> {
        let mut pieces = decompose(d)?;
        match pieces.len() {
            1 => Ok(pieces.remove(0)),
            n => Err(PathError::InvalidPathData {
                offset: 0,
                reason: format!("expected exactly one segment, found {n}"),
            }),
        }
    }

    pub fn shape(&self) -> SegmentShape {
        match self.points.len() {
            2 => SegmentShape::Line,
            3 => SegmentShape::Quad,
            _ => SegmentShape::Cubic,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn to_points(&self) -> SegmentPoints {
        self.points.clone()
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Endpoint by slot: 0 is the start, 1 is the end.
    pub fn endpoint(&self, slot: usize) -> Point {
        if slot == 0 { self.first() } else { self.last() }
    }

    /// Index into `points` of an endpoint slot.
    pub fn endpoint_index(&self, slot: usize) -> usize {
        if slot == 0 { 0 } else { self.points.len() - 1 }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bézier handles between the two endpoints; empty for a line.
    pub fn control_points(&self) -> &[Point] {
        &self.points[1..self.points.len() - 1]
    }

    pub fn cmds(&self) -> [PathCmd; 2] {
        let p = &self.points;
        let draw = match self.shape() {
            SegmentShape::Line => PathCmd::LineTo(p[1]),
            SegmentShape::Quad => PathCmd::QuadTo(p[1], p[2]),
            SegmentShape::Cubic => PathCmd::CubicTo(p[1], p[2], p[3]),
        };
        [PathCmd::MoveTo(p[0]), draw]
    }

    /// The segment's own geometry string, e.g. `M 0 0 Q 5 5 10 0`.
    pub fn path_data(&self) -> String {
        emit_path_data(&self.cmds())
    }

    pub fn to_path_seg(&self) -> PathSeg {
        let p = &self.points;
        match self.shape() {
            SegmentShape::Line => PathSeg::Line(Line::new(p[0], p[1])),
            SegmentShape::Quad => PathSeg::Quad(QuadBez::new(p[0], p[1], p[2])),
            SegmentShape::Cubic => PathSeg::Cubic(CubicBez::new(p[0], p[1], p[2], p[3])),
        }
    }

    /// Distance from `p` to the curve.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.to_path_seg()
            .nearest(p, NEAREST_ACCURACY)
            .distance_sq
            .sqrt()
    }

    /// Copy with the point at `index` replaced. Out-of-range indexes leave
    /// the geometry unchanged.
    pub fn with_point(&self, index: usize, pos: Point) -> Self {
        let mut points = self.points.clone();
        if let Some(slot) = points.get_mut(index) {
            *slot = pos;
        }
        Self { points }
    }

    /// Copy with the points at `indexes` translated by `delta`.
    pub fn translated(&self, indexes: &[usize], delta: Vec2) -> Self {
        let mut points = self.points.clone();
        for &i in indexes {
            if let Some(p) = points.get_mut(i) {
                *p += delta;
            }
        }
        Self { points }
    }

    /// Reshape the segment so that its incoming tangent at the end point
    /// mirrors a handle dragged out to `steer`.
    ///
    /// The handle nearest the end point becomes `reflect(steer, end)`: a line
    /// gains it as a quadratic control, a quadratic gains it as the second
    /// cubic control, and a cubic has its second control replaced.
    pub fn redraw_curve(&self, steer: Point) -> Self {
        let end = self.last();
        let mirrored = reflect(steer, end);
        let p = &self.points;
        let points: SegmentPoints = match self.shape() {
            SegmentShape::Line => [p[0], mirrored, end].into_iter().collect(),
            SegmentShape::Quad => [p[0], p[1], mirrored, end].into_iter().collect(),
            SegmentShape::Cubic => [p[0], p[1], mirrored, end].into_iter().collect(),
        };
        Self { points }
    }
}

/// Geometry string for a point list.
///
/// # Errors
/// `MalformedSegment` unless there are 2, 3 or 4 points.
pub fn generate_path(points: &[Point]) -> Result<String, PathError> {
    Ok(SegmentGeometry::new(points.iter().copied())?.path_data())
}

/// Split a full path into its segments.
///
/// Every drawing command becomes one segment starting at the current point.
/// A close command contributes a closing line when the pen is away from the
/// subpath start. Bare move-tos contribute nothing.
pub fn decompose(d: &str) -> Result<Vec<SegmentGeometry>, PathError> {
    let cmds = parse_path_data(d)
        .inspect_err(|e| log::warn!("decompose: rejected {d:?}: {e}"))?;
    let segments = decompose_cmds(&cmds);
    log::trace!(
        "decompose: {} segment(s) from {} command(s)",
        segments.len(),
        cmds.len()
    );
    Ok(segments)
}

pub fn decompose_cmds(cmds: &[PathCmd]) -> Vec<SegmentGeometry> {
    let mut out = Vec::new();
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;
    for cmd in cmds {
        let points: SegmentPoints = match *cmd {
            PathCmd::MoveTo(p) => {
                current = p;
                start = p;
                continue;
            }
            PathCmd::LineTo(p) => [current, p].into_iter().collect(),
            PathCmd::QuadTo(c, p) => [current, c, p].into_iter().collect(),
            PathCmd::CubicTo(c1, c2, p) => [current, c1, c2, p].into_iter().collect(),
            PathCmd::Close => {
                if current == start {
                    continue;
                }
                [current, start].into_iter().collect()
            }
        };
        current = points[points.len() - 1];
        out.push(SegmentGeometry { points });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pts(list: &[(f64, f64)]) -> Vec<Point> {
        list.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn generate_path_by_point_count() {
        assert_eq!(
            generate_path(&pts(&[(0.0, 0.0), (10.0, 0.0)])).unwrap(),
            "M 0 0 L 10 0"
        );
        assert_eq!(
            generate_path(&pts(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)])).unwrap(),
            "M 0 0 Q 5 5 10 0"
        );
        assert_eq!(
            generate_path(&pts(&[(0.0, 0.0), (1.0, 2.0), (3.0, 4.0), (5.0, 6.0)])).unwrap(),
            "M 0 0 C 1 2 3 4 5 6"
        );
    }

    #[test]
    fn invalid_point_counts_are_rejected() {
        assert_eq!(
            generate_path(&pts(&[(0.0, 0.0)])),
            Err(PathError::MalformedSegment { count: 1 })
        );
        let five = pts(&[(0.0, 0.0); 5]);
        assert_eq!(
            SegmentGeometry::new(five),
            Err(PathError::MalformedSegment { count: 5 })
        );
    }

    #[test]
    fn parse_generate_roundtrip() {
        for list in [
            pts(&[(0.5, -3.0), (10.25, 7.0)]),
            pts(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
            pts(&[(1.0, 1.0), (2.0, 8.0), (7.0, 8.0), (9.0, 1.0)]),
        ] {
            let geometry = SegmentGeometry::new(list.clone()).unwrap();
            let parsed = SegmentGeometry::from_path_data(&geometry.path_data()).unwrap();
            assert_eq!(parsed.points(), list.as_slice());
        }
    }

    #[test]
    fn decompose_splits_on_commands_and_closes() {
        let pieces = decompose("M 0 0 L 10 0 L 10 10 Z M 20 20 Q 25 25 30 20").unwrap();
        let lens: Vec<usize> = pieces.iter().map(SegmentGeometry::len).collect();
        assert_eq!(lens, vec![2, 2, 2, 3]);
        assert_eq!(pieces[2].last(), Point::new(0.0, 0.0));
        assert_eq!(pieces[3].first(), Point::new(20.0, 20.0));
    }

    #[test]
    fn decompose_concatenated_segments() {
        let d = "M 0 0 L 10 0 M 10 0 Q 15 5 10 10";
        let pieces = decompose(d).unwrap();
        assert_eq!(pieces.len(), 2);
        let joined: Vec<String> = pieces.iter().map(SegmentGeometry::path_data).collect();
        assert_eq!(joined.join(" "), d);
    }

    #[test]
    fn distance_is_monotonic_for_lines() {
        let g = SegmentGeometry::new(pts(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
        let near = g.distance_to(Point::new(5.0, 1.0));
        let far = g.distance_to(Point::new(5.0, 4.0));
        assert!((near - 1.0).abs() < 1e-6);
        assert!(near < far);
    }

    #[test]
    fn redraw_curve_mirrors_about_end() {
        let line = SegmentGeometry::new(pts(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
        let curved = line.redraw_curve(Point::new(14.0, 3.0));
        assert_eq!(
            curved.points(),
            pts(&[(0.0, 0.0), (6.0, -3.0), (10.0, 0.0)]).as_slice()
        );

        let quad = curved.redraw_curve(Point::new(12.0, 0.0));
        assert_eq!(quad.shape(), SegmentShape::Cubic);
        assert_eq!(quad.points()[2], Point::new(8.0, 0.0));
    }

    #[test]
    fn translated_moves_only_listed_indexes() {
        let g = SegmentGeometry::new(pts(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)])).unwrap();
        let moved = g.translated(&[2], Vec2::new(1.0, -1.0));
        assert_eq!(
            moved.points(),
            pts(&[(0.0, 0.0), (5.0, 5.0), (11.0, -1.0)]).as_slice()
        );
    }
}

//! The in-progress point sequence of a drawing gesture.
//!
//! Points accumulate until an end point arrives; at that moment everything
//! accumulated plus the new end point becomes one committed segment and the
//! accumulator restarts from that end point, so clicks chain into a path.

use ld_core::geom::{PathPoint, PointKind};
use ld_core::{Point, SegmentGeometry};

/// Most points a single segment can hold.
const MAX_SEGMENT_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    None,
    Drawing,
}

/// What `set_end_point` did.
#[derive(Debug, Clone, PartialEq)]
pub enum EndPointOutcome {
    /// Too close to the previous point.
    Ignored,
    /// First point of a new chain.
    Started,
    /// A segment was completed; the accumulator now holds its end point.
    Committed(SegmentGeometry),
}

/// Non-committed visuals for the gesture extended by the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preview {
    /// Geometry the segment would have if the cursor were placed now.
    pub curve: Option<String>,
    /// Lines joining each control point to its neighbours.
    pub handle_lines: Vec<(Point, Point)>,
    pub controls: Vec<Point>,
    /// Start of the open segment.
    pub anchor: Option<Point>,
}

#[derive(Debug, Clone)]
pub struct Gesture {
    points: Vec<PathPoint>,
    min_spacing: f64,
}

impl Gesture {
    pub fn new(min_spacing: f64) -> Self {
        Self {
            points: Vec::with_capacity(MAX_SEGMENT_POINTS),
            min_spacing,
        }
    }

    pub fn state(&self) -> GestureState {
        if self.points.is_empty() {
            GestureState::None
        } else {
            GestureState::Drawing
        }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<PathPoint> {
        self.points.last().copied()
    }

    /// End points not yet part of a committed segment.
    pub fn end_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().filter(|p| p.is_end()).map(|p| p.pos)
    }

    fn too_close(&self, pos: Point) -> bool {
        self.points
            .last()
            .is_some_and(|last| (last.pos - pos).hypot() <= self.min_spacing)
    }

    pub fn set_end_point(&mut self, pos: Point) -> EndPointOutcome {
        if self.too_close(pos) {
            return EndPointOutcome::Ignored;
        }
        if self.points.is_empty() {
            self.points.push(PathPoint::end(pos));
            return EndPointOutcome::Started;
        }
        let committed = self
            .points
            .iter()
            .map(|p| p.pos)
            .chain(std::iter::once(pos));
        match SegmentGeometry::new(committed) {
            Ok(geometry) => {
                self.reset_to(Some(pos));
                EndPointOutcome::Committed(geometry)
            }
            // Unreachable while set_control_point caps the accumulator.
            Err(err) => {
                log::warn!("gesture: dropping end point, {err}");
                EndPointOutcome::Ignored
            }
        }
    }

    /// Append a curve handle. Ignored with nothing to attach it to, when
    /// too close to the last point, or when another point would overflow a
    /// cubic segment.
    pub fn set_control_point(&mut self, pos: Point) -> bool {
        if self.points.is_empty()
            || self.points.len() >= MAX_SEGMENT_POINTS - 1
            || self.too_close(pos)
        {
            return false;
        }
        self.points.push(PathPoint::control(pos));
        true
    }

    /// What the open segment would look like with `cursor` as its end.
    /// Leaves the accumulator untouched.
    pub fn preview(&self, cursor: Point) -> Preview {
        if self.points.is_empty() {
            return Preview::default();
        }
        let mut seq: Vec<PathPoint> = self.points.clone();
        seq.push(PathPoint::end(cursor));

        let curve = SegmentGeometry::new(seq.iter().map(|p| p.pos))
            .ok()
            .map(|g| g.path_data());
        let handle_lines = seq
            .windows(2)
            .filter(|w| w.iter().any(|p| p.kind == PointKind::Control))
            .map(|w| (w[0].pos, w[1].pos))
            .collect();
        let controls = self
            .points
            .iter()
            .filter(|p| !p.is_end())
            .map(|p| p.pos)
            .collect();
        Preview {
            curve,
            handle_lines,
            controls,
            anchor: self.points.first().map(|p| p.pos),
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Restart the accumulator, optionally from an existing end point.
    pub fn reset_to(&mut self, start: Option<Point>) {
        self.points.clear();
        if let Some(p) = start {
            self.points.push(PathPoint::end(p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gesture() -> Gesture {
        Gesture::new(1e-6)
    }

    #[test]
    fn chained_end_points_commit_lines() {
        let mut g = gesture();
        assert_eq!(g.state(), GestureState::None);
        assert_eq!(
            g.set_end_point(Point::new(0.0, 0.0)),
            EndPointOutcome::Started
        );
        assert_eq!(g.state(), GestureState::Drawing);

        let EndPointOutcome::Committed(first) = g.set_end_point(Point::new(10.0, 0.0)) else {
            panic!("expected a commit");
        };
        assert_eq!(first.path_data(), "M 0 0 L 10 0");
        assert_eq!(g.points(), &[PathPoint::end(Point::new(10.0, 0.0))]);
    }

    #[test]
    fn control_points_shape_the_next_commit() {
        let mut g = gesture();
        g.set_end_point(Point::new(0.0, 0.0));
        assert!(g.set_control_point(Point::new(5.0, 5.0)));
        let EndPointOutcome::Committed(seg) = g.set_end_point(Point::new(10.0, 0.0)) else {
            panic!("expected a commit");
        };
        assert_eq!(seg.path_data(), "M 0 0 Q 5 5 10 0");

        assert_eq!(seg.control_points(), &[Point::new(5.0, 5.0)]);
    }

    #[test]
    fn degenerate_points_are_ignored() {
        let mut g = gesture();
        assert!(!g.set_control_point(Point::new(1.0, 1.0)));
        g.set_end_point(Point::new(1.0, 1.0));
        assert_eq!(
            g.set_end_point(Point::new(1.0, 1.0)),
            EndPointOutcome::Ignored
        );
        assert!(!g.set_control_point(Point::new(1.0, 1.0)));
        assert_eq!(g.points().len(), 1);
    }

    #[test]
    fn accumulator_never_exceeds_a_cubic() {
        let mut g = gesture();
        g.set_end_point(Point::new(0.0, 0.0));
        assert!(g.set_control_point(Point::new(1.0, 2.0)));
        assert!(g.set_control_point(Point::new(3.0, 4.0)));
        assert!(!g.set_control_point(Point::new(5.0, 6.0)));
        let EndPointOutcome::Committed(seg) = g.set_end_point(Point::new(7.0, 8.0)) else {
            panic!("expected a commit");
        };
        assert_eq!(seg.len(), 4);
    }

    #[test]
    fn preview_does_not_mutate() {
        let mut g = gesture();
        g.set_end_point(Point::new(0.0, 0.0));
        g.set_control_point(Point::new(5.0, 5.0));
        let before = g.points().to_vec();

        let preview = g.preview(Point::new(10.0, 0.0));
        assert_eq!(preview.curve.as_deref(), Some("M 0 0 Q 5 5 10 0"));
        assert_eq!(preview.controls, vec![Point::new(5.0, 5.0)]);
        assert_eq!(preview.handle_lines.len(), 2);
        assert_eq!(preview.anchor, Some(Point::new(0.0, 0.0)));
        assert_eq!(g.points(), before.as_slice());
    }

    #[test]
    fn empty_preview_is_blank() {
        assert_eq!(gesture().preview(Point::new(3.0, 3.0)), Preview::default());
    }
}

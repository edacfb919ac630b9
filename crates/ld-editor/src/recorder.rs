//! Before/after geometry snapshots around a drag, for the undo history.

use crate::graph::PathGraph;
use crate::segment::SegmentId;
use ld_core::SegmentPoints;
use serde::{Deserialize, Serialize};

/// One segment's points at a moment in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub segment: SegmentId,
    pub points: SegmentPoints,
}

/// Paired snapshots of the same segments, in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformPair {
    pub before: Vec<TransformRecord>,
    pub after: Vec<TransformRecord>,
}

/// Tracks one drag at a time. `begin` snapshots the affected segments,
/// mutations call `mark_dirty`, and `finish` snapshots the same segments
/// again. A drag that never mutated produces nothing.
#[derive(Debug, Default)]
pub struct TransformRecorder {
    segments: Vec<SegmentId>,
    before: Vec<TransformRecord>,
    dirty: bool,
}

fn snapshot(graph: &PathGraph, ids: &[SegmentId]) -> Vec<TransformRecord> {
    ids.iter()
        .filter_map(|id| {
            graph.segment(*id).map(|s| TransformRecord {
                segment: *id,
                points: s.to_points(),
            })
        })
        .collect()
}

impl TransformRecorder {
    pub fn begin(&mut self, graph: &PathGraph, ids: impl IntoIterator<Item = SegmentId>) {
        self.segments.clear();
        for id in ids {
            if !self.segments.contains(&id) {
                self.segments.push(id);
            }
        }
        self.before = snapshot(graph, &self.segments);
        self.dirty = false;
    }

    pub fn is_recording(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn mark_dirty(&mut self) {
        if self.is_recording() {
            self.dirty = true;
        }
    }

    /// Close the drag. `None` when nothing moved.
    pub fn finish(&mut self, graph: &PathGraph) -> Option<TransformPair> {
        let segments = std::mem::take(&mut self.segments);
        let before = std::mem::take(&mut self.before);
        let dirty = std::mem::replace(&mut self.dirty, false);
        if !dirty {
            return None;
        }
        let after = snapshot(graph, &segments);
        if after == before {
            return None;
        }
        Some(TransformPair { before, after })
    }

    pub fn cancel(&mut self) {
        self.segments.clear();
        self.before.clear();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld_core::scene::Scene;
    use ld_core::{EditorConfig, Point, SegmentGeometry};
    use pretty_assertions::assert_eq;

    fn setup() -> (Scene, PathGraph, SegmentId) {
        let mut scene = Scene::new();
        let root = scene.root_id();
        let mut graph = PathGraph::new(&mut scene, root, &EditorConfig::default(), 1.0);
        let id = graph.append(
            &mut scene,
            SegmentGeometry::new([Point::new(0.0, 0.0), Point::new(4.0, 0.0)]).unwrap(),
            false,
        );
        (scene, graph, id)
    }

    #[test]
    fn records_before_and_after() {
        let (mut scene, mut graph, id) = setup();
        let mut recorder = TransformRecorder::default();
        recorder.begin(&graph, [id]);

        graph.move_point(&mut scene, id, 1, Point::new(4.0, 3.0));
        recorder.mark_dirty();

        let pair = recorder.finish(&graph).unwrap();
        assert_eq!(pair.before.len(), 1);
        assert_eq!(
            pair.before[0].points.as_slice(),
            &[Point::ZERO, Point::new(4.0, 0.0)]
        );
        assert_eq!(
            pair.after[0].points.as_slice(),
            &[Point::ZERO, Point::new(4.0, 3.0)]
        );
        assert!(!recorder.is_recording());
    }

    #[test]
    fn untouched_drag_records_nothing() {
        let (_scene, graph, id) = setup();
        let mut recorder = TransformRecorder::default();
        recorder.begin(&graph, [id, id]);
        assert_eq!(recorder.finish(&graph), None);

        recorder.begin(&graph, [id]);
        recorder.mark_dirty();
        assert_eq!(recorder.finish(&graph), None);
    }
}

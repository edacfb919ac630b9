//! A single editable path piece and its rendered primitive.

use ld_core::id::PrimitiveId;
use ld_core::scene::{Primitive, Scene};
use ld_core::{PathError, Point, SegmentGeometry, SegmentPoints};
use serde::{Deserialize, Serialize};

/// Stable identity of a segment within a path graph. Survives a delete and
/// restore round-trip through the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Identity of an endpoint marker, shared by every segment whose first or
/// last point coincides with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

/// Stroke applied to a segment's primitive.
#[derive(Debug, Clone)]
pub struct SegmentStroke<'a> {
    pub color: &'a str,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    primitive: PrimitiveId,
    geometry: SegmentGeometry,
    /// Markers at the start and end point, in that order.
    pub(crate) markers: [MarkerId; 2],
    closed_loop: bool,
}

impl Segment {
    /// Build the segment and make sure its path primitive lives in
    /// `container` with geometry matching `geometry`.
    pub(crate) fn create(
        id: SegmentId,
        primitive: Option<PrimitiveId>,
        geometry: SegmentGeometry,
        markers: [MarkerId; 2],
        closed_loop: bool,
        scene: &mut Scene,
        container: PrimitiveId,
        stroke: &SegmentStroke<'_>,
    ) -> Self {
        let primitive = match primitive {
            Some(existing) if scene.contains(existing) => {
                if scene.parent(existing) != Some(container) {
                    scene.reparent(existing, container);
                }
                scene.set_path_data(existing, geometry.path_data());
                scene.set_visible(existing, true);
                existing
            }
            requested => {
                let id = requested.unwrap_or_else(|| PrimitiveId::with_prefix("segment"));
                scene.add(
                    container,
                    Primitive::path(id, geometry.path_data())
                        .with_stroke(stroke.color, stroke.width),
                )
            }
        };
        Self {
            id,
            primitive,
            geometry,
            markers,
            closed_loop,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn primitive(&self) -> PrimitiveId {
        self.primitive
    }

    pub fn geometry(&self) -> &SegmentGeometry {
        &self.geometry
    }

    pub fn points(&self) -> &[Point] {
        self.geometry.points()
    }

    pub fn to_points(&self) -> SegmentPoints {
        self.geometry.to_points()
    }

    pub fn markers(&self) -> [MarkerId; 2] {
        self.markers
    }

    pub fn closed_loop(&self) -> bool {
        self.closed_loop
    }

    /// Endpoint slot (0 start, 1 end) held by `marker`, if any.
    pub fn slot_of(&self, marker: MarkerId) -> Option<usize> {
        self.markers.iter().position(|m| *m == marker)
    }

    /// Geometry string of this segment alone.
    pub fn path_data(&self) -> String {
        self.geometry.path_data()
    }

    /// Replace the geometry and rewrite the primitive, or, with `None`,
    /// re-derive the geometry from the primitive after an external edit.
    ///
    /// Endpoint markers are owned by the graph; callers go through
    /// `PathGraph::update_segment` to keep them in step.
    pub(crate) fn update_position(
        &mut self,
        scene: &mut Scene,
        geometry: Option<SegmentGeometry>,
    ) -> Result<(), PathError> {
        match geometry {
            Some(geometry) => {
                scene.set_path_data(self.primitive, geometry.path_data());
                self.geometry = geometry;
            }
            None => {
                let d = scene.path_data(self.primitive).unwrap_or_default();
                self.geometry = SegmentGeometry::from_path_data(d)?;
            }
        }
        Ok(())
    }

    /// Curve preview while a handle is dragged out of this segment's end
    /// point: `base` reshaped so its incoming handle mirrors `(x, y)`.
    pub(crate) fn redraw_curve(
        &mut self,
        scene: &mut Scene,
        base: &SegmentGeometry,
        x: f64,
        y: f64,
    ) {
        let geometry = base.redraw_curve(Point::new(x, y));
        scene.set_path_data(self.primitive, geometry.path_data());
        self.geometry = geometry;
    }

    /// Distance from `(x, y)` to the segment, for pre-selection.
    pub fn distance_detection(&self, x: f64, y: f64) -> f64 {
        self.geometry.distance_to(Point::new(x, y))
    }

    pub(crate) fn update_scale(&self, scene: &mut Scene, stroke_width: f64) {
        if let Some(p) = scene.get_mut(self.primitive) {
            p.style.stroke_width = stroke_width;
        }
    }

    pub(crate) fn set_stroke(&self, scene: &mut Scene, color: &str) {
        scene.set_stroke(self.primitive, color);
    }

    /// Remove the rendered primitive. Marker cleanup is the graph's job.
    pub(crate) fn del(&self, scene: &mut Scene) {
        scene.remove(self.primitive);
    }
}

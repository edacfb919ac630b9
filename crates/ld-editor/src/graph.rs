//! The path graph: every segment of one editable path plus the endpoint
//! markers they share.
//!
//! Segments are kept in an ordered `Vec` (graph order is drawing order and
//! is the order `compose_full_path` emits). Markers are owned by the graph
//! and referenced from segments by `MarkerId`; a marker records the set of
//! segments touching it, and a canonical coordinate key maps positions to
//! markers so shared-endpoint lookup is a hash probe.
//!
//! All rendered pieces live in the `Scene` under two groups created by the
//! graph: a container holding the segment paths, and a marker group.

use crate::segment::{MarkerId, Segment, SegmentId, SegmentStroke};
use ld_core::geom::CoordKey;
use ld_core::id::PrimitiveId;
use ld_core::scene::{Primitive, PrimitiveKind, Scene};
use ld_core::{EditorConfig, PathError, Point, SegmentGeometry};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// An endpoint handle shared by all segments that start or end on it.
#[derive(Debug, Clone)]
pub struct Marker {
    pub id: MarkerId,
    pub primitive: PrimitiveId,
    pub pos: Point,
    pub owners: SmallVec<[SegmentId; 2]>,
}

/// A segment affected by moving another one, and which of its point
/// indexes move along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedSegment {
    pub segment: SegmentId,
    pub indexes: SmallVec<[usize; 4]>,
}

#[derive(Debug)]
pub struct PathGraph {
    segments: Vec<Segment>,
    markers: HashMap<MarkerId, Marker>,
    by_key: HashMap<CoordKey, MarkerId>,
    by_primitive: HashMap<PrimitiveId, MarkerId>,
    container: PrimitiveId,
    marker_group: PrimitiveId,
    next_segment: u32,
    next_marker: u32,
    config: EditorConfig,
    scale: f64,
}

impl PathGraph {
    /// Create an empty graph whose groups live under `parent`.
    pub fn new(scene: &mut Scene, parent: PrimitiveId, config: &EditorConfig, scale: f64) -> Self {
        let container = scene.add(parent, Primitive::group(PrimitiveId::with_prefix("graph")));
        let marker_group = scene.add(
            parent,
            Primitive::group(PrimitiveId::with_prefix("markers")),
        );
        Self {
            segments: Vec::new(),
            markers: HashMap::new(),
            by_key: HashMap::new(),
            by_primitive: HashMap::new(),
            container,
            marker_group,
            next_segment: 0,
            next_marker: 0,
            config: config.clone(),
            scale,
        }
    }

    pub fn container(&self) -> PrimitiveId {
        self.container
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id() == id)
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn marker_at(&self, pos: Point) -> Option<MarkerId> {
        self.by_key.get(&CoordKey::of(pos)).copied()
    }

    pub fn marker_by_primitive(&self, primitive: PrimitiveId) -> Option<MarkerId> {
        self.by_primitive.get(&primitive).copied()
    }

    /// Markers in graph order: each segment's start then end, first
    /// occurrence only.
    pub fn markers_in_order(&self) -> Vec<MarkerId> {
        let mut seen = HashSet::new();
        self.segments
            .iter()
            .flat_map(|s| s.markers())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    fn stroke_width(&self) -> f64 {
        self.config.stroke_width / self.scale
    }

    fn marker_radius(&self) -> f64 {
        self.config.endpoint_radius / self.scale
    }

    // ─── Append / delete ─────────────────────────────────────────────────

    /// Commit a new segment with a fresh primitive.
    pub fn append(
        &mut self,
        scene: &mut Scene,
        geometry: SegmentGeometry,
        closed_loop: bool,
    ) -> SegmentId {
        let id = SegmentId(self.next_segment);
        self.insert(scene, id, None, geometry, closed_loop)
    }

    /// Adopt an existing path primitive as a segment. Appending a primitive
    /// that is already a segment of this graph returns that segment.
    ///
    /// # Errors
    /// The primitive's geometry is not a single segment.
    pub fn append_primitive(
        &mut self,
        scene: &mut Scene,
        primitive: PrimitiveId,
        closed_loop: bool,
    ) -> Result<SegmentId, PathError> {
        if let Some(existing) = self.segments.iter().find(|s| s.primitive() == primitive) {
            return Ok(existing.id());
        }
        let d = scene.path_data(primitive).unwrap_or_default();
        let geometry = SegmentGeometry::from_path_data(d)?;
        let id = SegmentId(self.next_segment);
        let id = self.insert(scene, id, Some(primitive), geometry, closed_loop);
        Ok(id)
    }

    /// Re-insert a segment under a known id and primitive, as when a delete
    /// is undone. No-op if the id is already present.
    pub fn restore(
        &mut self,
        scene: &mut Scene,
        id: SegmentId,
        primitive: PrimitiveId,
        geometry: SegmentGeometry,
        closed_loop: bool,
    ) -> SegmentId {
        if self.segment(id).is_some() {
            return id;
        }
        self.insert(scene, id, Some(primitive), geometry, closed_loop)
    }

    fn insert(
        &mut self,
        scene: &mut Scene,
        id: SegmentId,
        primitive: Option<PrimitiveId>,
        geometry: SegmentGeometry,
        closed_loop: bool,
    ) -> SegmentId {
        self.next_segment = self.next_segment.max(id.0 + 1);
        let markers = [
            self.acquire_marker(scene, geometry.first(), id),
            self.acquire_marker(scene, geometry.last(), id),
        ];
        let stroke_width = self.stroke_width();
        let stroke = SegmentStroke {
            color: &self.config.stroke_color,
            width: stroke_width,
        };
        let segment = Segment::create(
            id,
            primitive,
            geometry,
            markers,
            closed_loop,
            scene,
            self.container,
            &stroke,
        );
        log::debug!(
            "graph: appended segment {} as {} ({})",
            id.0,
            segment.primitive(),
            segment.path_data()
        );
        self.segments.push(segment);
        id
    }

    /// Remove a segment and any endpoint marker no remaining segment uses.
    pub fn delete_segment(&mut self, scene: &mut Scene, id: SegmentId) -> Option<Segment> {
        let index = self.segments.iter().position(|s| s.id() == id)?;
        let segment = self.segments.remove(index);
        segment.del(scene);
        for marker in segment.markers() {
            self.release_marker(scene, marker, id);
        }
        log::debug!("graph: deleted segment {}", id.0);
        Some(segment)
    }

    fn acquire_marker(&mut self, scene: &mut Scene, pos: Point, owner: SegmentId) -> MarkerId {
        let key = CoordKey::of(pos);
        if let Some(id) = self.by_key.get(&key).copied() {
            if let Some(marker) = self.markers.get_mut(&id) {
                if !marker.owners.contains(&owner) {
                    marker.owners.push(owner);
                }
                return id;
            }
        }
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        let radius = self.marker_radius();
        let primitive = scene.add(
            self.marker_group,
            Primitive::circle(PrimitiveId::with_prefix("marker"), pos, radius)
                .with_stroke(self.config.theme_color.as_str(), self.stroke_width()),
        );
        let mut owners = SmallVec::new();
        owners.push(owner);
        self.markers.insert(
            id,
            Marker {
                id,
                primitive,
                pos,
                owners,
            },
        );
        self.by_key.insert(key, id);
        self.by_primitive.insert(primitive, id);
        id
    }

    fn release_marker(&mut self, scene: &mut Scene, id: MarkerId, owner: SegmentId) {
        let Some(marker) = self.markers.get_mut(&id) else {
            return;
        };
        marker.owners.retain(|o| *o != owner);
        if !marker.owners.is_empty() {
            return;
        }
        if let Some(marker) = self.markers.remove(&id) {
            scene.remove(marker.primitive);
            self.by_primitive.remove(&marker.primitive);
            let key = CoordKey::of(marker.pos);
            if self.by_key.get(&key) == Some(&id) {
                self.by_key.remove(&key);
            }
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Resolve a hit primitive (segment path or endpoint marker) to a
    /// segment. A marker resolves to its first owner.
    pub fn find_by_primitive(&self, primitive: PrimitiveId) -> Option<SegmentId> {
        if let Some(s) = self.segments.iter().find(|s| s.primitive() == primitive) {
            return Some(s.id());
        }
        let marker = self.by_primitive.get(&primitive)?;
        self.markers.get(marker)?.owners.first().copied()
    }

    /// `(segment, slot)` for every segment endpoint sitting on `marker`.
    pub fn marker_endpoints(&self, marker: MarkerId) -> Vec<(SegmentId, usize)> {
        self.segments
            .iter()
            .flat_map(|s| {
                s.markers()
                    .into_iter()
                    .enumerate()
                    .filter(move |(_, m)| *m == marker)
                    .map(move |(slot, _)| (s.id(), slot))
            })
            .collect()
    }

    /// The segment itself with all its indexes, then every other segment
    /// sharing an endpoint marker with it, with the indexes of its points
    /// on the shared markers.
    pub fn linked_segments(&self, id: SegmentId) -> Vec<LinkedSegment> {
        let Some(segment) = self.segment(id) else {
            return Vec::new();
        };
        let mut out = vec![LinkedSegment {
            segment: id,
            indexes: (0..segment.geometry().len()).collect(),
        }];
        let shared = segment.markers();
        for other in self.segments.iter().filter(|s| s.id() != id) {
            let mut indexes: SmallVec<[usize; 4]> = SmallVec::new();
            for (slot, marker) in other.markers().into_iter().enumerate() {
                let index = other.geometry().endpoint_index(slot);
                if shared.contains(&marker) && !indexes.contains(&index) {
                    indexes.push(index);
                }
            }
            if !indexes.is_empty() {
                out.push(LinkedSegment {
                    segment: other.id(),
                    indexes,
                });
            }
        }
        out
    }

    /// Every segment's geometry, space separated, in graph order.
    pub fn compose_full_path(&self) -> String {
        self.segments
            .iter()
            .map(Segment::path_data)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Marker positions in graph order, minus `exclude`.
    pub fn snap_candidates(&self, exclude: Option<MarkerId>) -> Vec<Point> {
        self.markers_in_order()
            .into_iter()
            .filter(|m| Some(*m) != exclude)
            .filter_map(|m| self.markers.get(&m).map(|marker| marker.pos))
            .collect()
    }

    /// Nearest segment within `tolerance` of `pos`.
    pub fn nearest_segment(&self, pos: Point, tolerance: f64) -> Option<SegmentId> {
        self.segments
            .iter()
            .map(|s| (s.id(), s.distance_detection(pos.x, pos.y)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Replace a segment's geometry and carry its endpoint markers along.
    pub fn update_segment(&mut self, scene: &mut Scene, id: SegmentId, geometry: SegmentGeometry) {
        let Some(segment) = self.segment_mut(id) else {
            return;
        };
        let moved = [
            (segment.markers()[0], geometry.first()),
            (segment.markers()[1], geometry.last()),
        ];
        if let Err(err) = segment.update_position(scene, Some(geometry)) {
            log::warn!("graph: segment {} rejected update: {err}", id.0);
            return;
        }
        for (marker, pos) in moved {
            self.place_marker(scene, marker, pos);
        }
    }

    /// Re-read a segment's geometry from its primitive after the primitive
    /// was edited from outside.
    ///
    /// # Errors
    /// The primitive no longer holds a single valid segment.
    pub fn resync_segment(&mut self, scene: &mut Scene, id: SegmentId) -> Result<(), PathError> {
        let Some(segment) = self.segment_mut(id) else {
            return Ok(());
        };
        segment.update_position(scene, None)?;
        let moved = [
            (segment.markers()[0], segment.geometry().first()),
            (segment.markers()[1], segment.geometry().last()),
        ];
        for (marker, pos) in moved {
            self.place_marker(scene, marker, pos);
        }
        Ok(())
    }

    /// Reshape the segment while a handle is dragged out of its end point.
    pub fn redraw_curve(
        &mut self,
        scene: &mut Scene,
        id: SegmentId,
        base: &SegmentGeometry,
        steer: Point,
    ) {
        if let Some(segment) = self.segment_mut(id) {
            segment.redraw_curve(scene, base, steer.x, steer.y);
        }
    }

    /// Move an endpoint marker and every segment endpoint on it. Returns
    /// the segments touched.
    pub fn move_marker(
        &mut self,
        scene: &mut Scene,
        marker: MarkerId,
        pos: Point,
    ) -> Vec<SegmentId> {
        let endpoints = self.marker_endpoints(marker);
        let mut touched = Vec::new();
        for (id, slot) in endpoints {
            let Some(segment) = self.segment_mut(id) else {
                continue;
            };
            let index = segment.geometry().endpoint_index(slot);
            let geometry = segment.geometry().with_point(index, pos);
            if segment.update_position(scene, Some(geometry)).is_ok() && !touched.contains(&id) {
                touched.push(id);
            }
        }
        self.place_marker(scene, marker, pos);
        touched
    }

    /// Move one point of a segment. Endpoints go through `move_marker` so
    /// their sharing segments follow.
    pub fn move_point(&mut self, scene: &mut Scene, id: SegmentId, index: usize, pos: Point) {
        let Some(segment) = self.segment(id) else {
            return;
        };
        let geometry = segment.geometry();
        if index == 0 || index + 1 == geometry.len() {
            let slot = usize::from(index != 0);
            let marker = segment.markers()[slot];
            self.move_marker(scene, marker, pos);
        } else {
            let geometry = geometry.with_point(index, pos);
            self.update_segment(scene, id, geometry);
        }
    }

    fn place_marker(&mut self, scene: &mut Scene, id: MarkerId, pos: Point) {
        let Some(marker) = self.markers.get_mut(&id) else {
            return;
        };
        if marker.pos == pos {
            return;
        }
        let old_key = CoordKey::of(marker.pos);
        marker.pos = pos;
        move_circle(scene, marker.primitive, pos);
        if self.by_key.get(&old_key) == Some(&id) {
            self.by_key.remove(&old_key);
        }
        self.by_key.entry(CoordKey::of(pos)).or_insert(id);
    }

    /// Rebuild marker ownership from coordinates after a drag: endpoints
    /// dropped onto each other become shared, shared endpoints pulled apart
    /// split. Existing marker ids are reused where a segment keeps its
    /// position.
    pub fn relink(&mut self, scene: &mut Scene) {
        let mut old = std::mem::take(&mut self.markers);
        self.by_key.clear();
        self.by_primitive.clear();

        for i in 0..self.segments.len() {
            let id = self.segments[i].id();
            for slot in 0..2 {
                let pos = self.segments[i].geometry().endpoint(slot);
                let key = CoordKey::of(pos);
                let marker = match self.by_key.get(&key).copied() {
                    Some(existing) => {
                        if let Some(m) = self.markers.get_mut(&existing) {
                            if !m.owners.contains(&id) {
                                m.owners.push(id);
                            }
                        }
                        existing
                    }
                    None => match old.remove(&self.segments[i].markers()[slot]) {
                        Some(mut reused) => {
                            reused.owners.clear();
                            reused.owners.push(id);
                            reused.pos = pos;
                            move_circle(scene, reused.primitive, pos);
                            let reused_id = reused.id;
                            self.by_primitive.insert(reused.primitive, reused_id);
                            self.by_key.insert(key, reused_id);
                            self.markers.insert(reused_id, reused);
                            reused_id
                        }
                        None => self.acquire_marker(scene, pos, id),
                    },
                };
                self.segments[i].markers[slot] = marker;
            }
        }

        for (_, stale) in old {
            scene.remove(stale.primitive);
        }
        log::debug!("graph: relinked {} markers", self.markers.len());
    }

    /// Highlight one marker (theme fill), clearing the rest.
    pub fn highlight_marker(&self, scene: &mut Scene, selected: Option<MarkerId>) {
        for marker in self.markers.values() {
            if let Some(p) = scene.get_mut(marker.primitive) {
                p.style.fill =
                    (Some(marker.id) == selected).then(|| self.config.theme_color.clone());
            }
        }
    }

    /// Stroke every segment in the default colour, `selected` ones in the
    /// theme colour.
    pub fn highlight_segments(&self, scene: &mut Scene, selected: &[SegmentId]) {
        for segment in &self.segments {
            let color = if selected.contains(&segment.id()) {
                &self.config.theme_color
            } else {
                &self.config.stroke_color
            };
            segment.set_stroke(scene, color);
        }
    }

    pub fn update_scale(&mut self, scene: &mut Scene, scale: f64) {
        self.scale = scale;
        let stroke_width = self.stroke_width();
        let radius = self.marker_radius();
        for segment in &self.segments {
            segment.update_scale(scene, stroke_width);
        }
        for marker in self.markers.values() {
            if let Some(p) = scene.get_mut(marker.primitive) {
                p.style.stroke_width = stroke_width;
                if let PrimitiveKind::Circle { r, .. } = &mut p.kind {
                    *r = radius;
                }
            }
        }
    }

    /// Remove every primitive the graph created.
    pub fn remove(self, scene: &mut Scene) {
        scene.remove(self.container);
        scene.remove(self.marker_group);
    }
}

fn move_circle(scene: &mut Scene, primitive: PrimitiveId, pos: Point) {
    if let Some(PrimitiveKind::Circle { center, .. }) =
        scene.get_mut(primitive).map(|p| &mut p.kind)
    {
        *center = pos;
    }
}

//! Editing visuals: cursor, attach tip, guide lines, curve preview and
//! control handles.
//!
//! Every visual is created once under the overlay group and afterwards only
//! moved or hidden. Control handles and handle lines are pooled: showing
//! fewer than the pool holds hides the surplus.

use crate::gesture::Preview;
use crate::segment::{Segment, SegmentId};
use crate::snap::SnapResult;
use ld_core::id::PrimitiveId;
use ld_core::scene::{Primitive, PrimitiveKind, Scene};
use ld_core::{EditorConfig, Point};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Overlay {
    group: PrimitiveId,
    cursor: PrimitiveId,
    cursor_pressed: bool,
    attach_tip: PrimitiveId,
    tip_lines: [PrimitiveId; 2],
    guide_x: PrimitiveId,
    guide_y: PrimitiveId,
    preview: PrimitiveId,
    controls: Vec<PrimitiveId>,
    handles: Vec<PrimitiveId>,
    control_targets: HashMap<PrimitiveId, (SegmentId, usize)>,
    config: EditorConfig,
    scale: f64,
}

impl Overlay {
    /// Build the visuals under `parent`. The cursor is only shown while
    /// drawing.
    pub fn new(
        scene: &mut Scene,
        parent: PrimitiveId,
        config: &EditorConfig,
        scale: f64,
        show_cursor: bool,
    ) -> Self {
        let width = config.stroke_width / scale;
        let group = scene.add(
            parent,
            Primitive::group(PrimitiveId::with_prefix("overlay")),
        );

        let cursor_size = config.point_size / scale;
        let mut cursor = Primitive::square(
            PrimitiveId::with_prefix("cursor"),
            Point::ZERO,
            cursor_size,
            cursor_size / 2.0,
        )
        .with_stroke(config.theme_color.as_str(), width);
        if !show_cursor {
            cursor = cursor.hidden();
        }
        let cursor = scene.add(group, cursor);

        let attach_tip = scene.add(
            group,
            Primitive::group(PrimitiveId::with_prefix("attach_tip")).hidden(),
        );
        let tip_lines = [0, 1].map(|_| {
            scene.add(
                attach_tip,
                Primitive::line(PrimitiveId::with_prefix("tip"), Point::ZERO, Point::ZERO)
                    .with_stroke(config.guide_color.as_str(), width),
            )
        });

        let [guide_x, guide_y] = ["guide_x", "guide_y"].map(|name| {
            scene.add(
                group,
                Primitive::line(PrimitiveId::with_prefix(name), Point::ZERO, Point::ZERO)
                    .with_stroke(config.guide_color.as_str(), width)
                    .hidden(),
            )
        });

        let preview = scene.add(
            group,
            Primitive::path(PrimitiveId::with_prefix("preview"), "")
                .with_stroke(config.stroke_color.as_str(), width)
                .hidden(),
        );

        Self {
            group,
            cursor,
            cursor_pressed: false,
            attach_tip,
            tip_lines,
            guide_x,
            guide_y,
            preview,
            controls: Vec::new(),
            handles: Vec::new(),
            control_targets: HashMap::new(),
            config: config.clone(),
            scale,
        }
    }

    fn width(&self) -> f64 {
        self.config.stroke_width / self.scale
    }

    // ─── Cursor & snap ───────────────────────────────────────────────────

    /// Round marker while hovering, square while the button is held.
    pub fn update_cursor(&mut self, scene: &mut Scene, pos: Point, pressed: bool) {
        self.cursor_pressed = pressed;
        let size = self.config.point_size / self.scale;
        let corner = if pressed { 0.0 } else { size / 2.0 };
        set_square(scene, self.cursor, pos, size, corner);
    }

    pub fn cursor_position(&self, scene: &Scene) -> Option<Point> {
        match scene.get(self.cursor)?.kind {
            PrimitiveKind::Rect { origin, width, .. } => {
                Some(Point::new(origin.x + width / 2.0, origin.y + width / 2.0))
            }
            _ => None,
        }
    }

    /// Attach tip while attached, guide lines while aligned.
    pub fn show_snap(&self, scene: &mut Scene, snap: &SnapResult) {
        if snap.attached {
            let r = self.config.point_radius() / self.scale - self.width();
            let p = snap.position;
            let [a, b] = self.tip_lines;
            set_line(
                scene,
                a,
                Point::new(p.x - r, p.y - r),
                Point::new(p.x + r, p.y + r),
            );
            set_line(
                scene,
                b,
                Point::new(p.x - r, p.y + r),
                Point::new(p.x + r, p.y - r),
            );
        }
        scene.set_visible(self.attach_tip, snap.attached);

        for (line, guide) in [(self.guide_x, snap.guide_x), (self.guide_y, snap.guide_y)] {
            match guide {
                Some(g) => {
                    set_line(scene, line, g.from, g.to);
                    scene.set_visible(line, true);
                }
                None => scene.set_visible(line, false),
            }
        }
    }

    pub fn hide_guides(&self, scene: &mut Scene) {
        scene.set_visible(self.guide_x, false);
        scene.set_visible(self.guide_y, false);
        scene.set_visible(self.attach_tip, false);
    }

    pub fn attach_visible(&self, scene: &Scene) -> bool {
        scene.get(self.attach_tip).is_some_and(|p| p.style.visible)
    }

    // ─── Preview & handles ───────────────────────────────────────────────

    /// Live preview of the open gesture.
    pub fn show_preview(&mut self, scene: &mut Scene, preview: &Preview) {
        match &preview.curve {
            Some(d) => {
                scene.set_path_data(self.preview, d.clone());
                scene.set_visible(self.preview, true);
            }
            None => scene.set_visible(self.preview, false),
        }
        self.control_targets.clear();
        self.show_controls(scene, &preview.controls);
        self.show_handle_lines(scene, &preview.handle_lines);
    }

    pub fn hide_preview(&mut self, scene: &mut Scene) {
        scene.set_visible(self.preview, false);
        self.clear_handles(scene);
    }

    /// Control handles of a selected segment, pickable through
    /// `control_target`.
    pub fn show_segment_handles(&mut self, scene: &mut Scene, segment: &Segment) {
        let points = segment.points();
        let last = points.len() - 1;
        let controls = segment.geometry().control_points();
        let mut lines = Vec::new();
        if !controls.is_empty() {
            lines.push((points[0], points[1]));
            lines.push((points[last - 1], points[last]));
        }
        self.show_controls(scene, controls);
        self.show_handle_lines(scene, &lines);

        self.control_targets.clear();
        for (i, prim) in self.controls.iter().take(controls.len()).enumerate() {
            self.control_targets.insert(*prim, (segment.id(), i + 1));
        }
    }

    pub fn clear_handles(&mut self, scene: &mut Scene) {
        self.control_targets.clear();
        self.show_controls(scene, &[]);
        self.show_handle_lines(scene, &[]);
    }

    /// Segment and point index behind a control handle primitive.
    pub fn control_target(&self, primitive: PrimitiveId) -> Option<(SegmentId, usize)> {
        self.control_targets.get(&primitive).copied()
    }

    pub fn control_primitive(&self, segment: SegmentId, index: usize) -> Option<PrimitiveId> {
        self.control_targets
            .iter()
            .find(|(_, target)| **target == (segment, index))
            .map(|(prim, _)| *prim)
    }

    /// Visible control handles, topmost first.
    pub fn visible_controls(&self, scene: &Scene) -> Vec<(PrimitiveId, Point)> {
        self.controls
            .iter()
            .rev()
            .filter(|id| scene.get(**id).is_some_and(|p| p.style.visible))
            .filter_map(|id| match scene.get(*id)?.kind {
                PrimitiveKind::Rect { origin, width, .. } => {
                    let half = width / 2.0;
                    Some((*id, Point::new(origin.x + half, origin.y + half)))
                }
                _ => None,
            })
            .collect()
    }

    fn show_controls(&mut self, scene: &mut Scene, points: &[Point]) {
        let size = self.config.control_point_size / self.scale;
        while self.controls.len() < points.len() {
            let id = scene.add(
                self.group,
                Primitive::square(PrimitiveId::with_prefix("control"), Point::ZERO, size, 0.0)
                    .with_stroke(self.config.theme_color.as_str(), self.width()),
            );
            self.controls.push(id);
        }
        for (i, id) in self.controls.iter().enumerate() {
            match points.get(i) {
                Some(p) => {
                    set_square(scene, *id, *p, size, 0.0);
                    scene.set_visible(*id, true);
                }
                None => scene.set_visible(*id, false),
            }
        }
    }

    fn show_handle_lines(&mut self, scene: &mut Scene, lines: &[(Point, Point)]) {
        while self.handles.len() < lines.len() {
            let id = scene.add(
                self.group,
                Primitive::line(PrimitiveId::with_prefix("handle"), Point::ZERO, Point::ZERO)
                    .with_stroke(self.config.theme_color.as_str(), self.width()),
            );
            self.handles.push(id);
        }
        for (i, id) in self.handles.iter().enumerate() {
            match lines.get(i) {
                Some((a, b)) => {
                    set_line(scene, *id, *a, *b);
                    scene.set_visible(*id, true);
                }
                None => scene.set_visible(*id, false),
            }
        }
    }

    /// Mark one control handle as selected (theme fill).
    pub fn highlight_control(&self, scene: &mut Scene, selected: Option<PrimitiveId>) {
        for id in &self.controls {
            if let Some(p) = scene.get_mut(*id) {
                p.style.fill = (Some(*id) == selected).then(|| self.config.theme_color.clone());
            }
        }
    }

    /// Re-size every visual for a new view scale.
    pub fn update_scale(&mut self, scene: &mut Scene, scale: f64) {
        self.scale = scale;
        let width = self.width();
        let control_size = self.config.control_point_size / scale;
        let cursor_size = self.config.point_size / scale;

        let mut all = vec![self.cursor, self.guide_x, self.guide_y, self.preview];
        all.extend(self.tip_lines);
        all.extend(self.controls.iter().copied());
        all.extend(self.handles.iter().copied());
        for id in all {
            if let Some(p) = scene.get_mut(id) {
                p.style.stroke_width = width;
            }
        }
        if let Some(center) = self.cursor_position(scene) {
            let corner = if self.cursor_pressed { 0.0 } else { cursor_size / 2.0 };
            set_square(scene, self.cursor, center, cursor_size, corner);
        }
        for (id, center) in self.visible_controls(scene) {
            set_square(scene, id, center, control_size, 0.0);
        }
    }

    /// Remove every overlay primitive.
    pub fn remove(self, scene: &mut Scene) {
        scene.remove(self.group);
    }
}

fn set_square(scene: &mut Scene, id: PrimitiveId, center: Point, size: f64, corner_radius: f64) {
    if let Some(PrimitiveKind::Rect {
        origin,
        width,
        height,
        corner,
    }) = scene.get_mut(id).map(|p| &mut p.kind)
    {
        *origin = Point::new(center.x - size / 2.0, center.y - size / 2.0);
        *width = size;
        *height = size;
        *corner = corner_radius;
    }
}

fn set_line(scene: &mut Scene, id: PrimitiveId, a: Point, b: Point) {
    if let Some(PrimitiveKind::Line { from, to }) = scene.get_mut(id).map(|p| &mut p.kind) {
        *from = a;
        *to = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::attach_cursor;

    fn overlay(scene: &mut Scene) -> Overlay {
        let root = scene.root_id();
        Overlay::new(scene, root, &EditorConfig::default(), 1.0, true)
    }

    #[test]
    fn cursor_changes_shape_when_pressed() {
        let mut scene = Scene::new();
        let mut o = overlay(&mut scene);
        o.update_cursor(&mut scene, Point::new(10.0, 10.0), true);
        assert!(matches!(
            scene.get(o.cursor).unwrap().kind,
            PrimitiveKind::Rect { corner, .. } if corner == 0.0
        ));
        assert_eq!(o.cursor_position(&scene), Some(Point::new(10.0, 10.0)));

        o.update_cursor(&mut scene, Point::new(10.0, 10.0), false);
        assert!(matches!(
            scene.get(o.cursor).unwrap().kind,
            PrimitiveKind::Rect { corner, .. } if corner == 6.0
        ));
    }

    #[test]
    fn snap_visuals_follow_the_result() {
        let mut scene = Scene::new();
        let o = overlay(&mut scene);

        o.show_snap(
            &mut scene,
            &attach_cursor(Point::new(1.0, 1.0), [Point::ZERO], 8.0),
        );
        assert!(o.attach_visible(&scene));
        assert!(!scene.get(o.guide_x).unwrap().style.visible);

        o.show_snap(
            &mut scene,
            &attach_cursor(Point::new(1.0, 40.0), [Point::ZERO], 8.0),
        );
        assert!(!o.attach_visible(&scene));
        assert!(scene.get(o.guide_x).unwrap().style.visible);
        assert!(!scene.get(o.guide_y).unwrap().style.visible);
    }

    #[test]
    fn pools_hide_surplus_handles() {
        let mut scene = Scene::new();
        let mut o = overlay(&mut scene);
        o.show_controls(&mut scene, &[Point::ZERO, Point::new(1.0, 1.0)]);
        assert_eq!(o.visible_controls(&scene).len(), 2);
        o.show_controls(&mut scene, &[Point::ZERO]);
        assert_eq!(o.visible_controls(&scene).len(), 1);
        assert_eq!(o.controls.len(), 2);
    }

    #[test]
    fn remove_leaves_nothing_behind() {
        let mut scene = Scene::new();
        let mut o = overlay(&mut scene);
        o.show_controls(&mut scene, &[Point::ZERO]);
        o.remove(&mut scene);
        assert!(scene.is_empty());
    }
}

//! The draw/select state machine.
//!
//! `DrawEditor` owns the `Scene` and, while a mode is active, one editing
//! session: a group carrying the edited path's world transform, the path
//! graph, the overlay visuals and the mode-specific state. Pointer input
//! arrives in scene space and is mapped into the path's local frame before
//! any geometry is touched, so a rotated or scaled target edits exactly like
//! an untransformed one.
//!
//! Every entry point returns the `EditorEvent`s it produced, in order.
//!
//! | Mode | Pointer down | Drag | Pointer up |
//! |------|--------------|------|------------|
//! | Draw | place end point | reshape last segment | maybe add control point |
//! | Select | pick point or segment | move it | record transform, relink |

use crate::gesture::{EndPointOutcome, Gesture};
use crate::graph::PathGraph;
use crate::input::{InputEvent, PointerButton};
use crate::overlay::Overlay;
use crate::recorder::{TransformPair, TransformRecord, TransformRecorder};
use crate::segment::{Segment, SegmentId};
use crate::snap::{SnapResult, attach_cursor};
use ld_core::id::PrimitiveId;
use ld_core::scene::{Primitive, Scene};
use ld_core::shape::decompose;
use ld_core::transform::{apply_vector, invert, linear_scale};
use ld_core::{Affine, EditorConfig, PathError, Point, SegmentGeometry, SegmentPoints, Vec2};
use serde::{Deserialize, Serialize};

// ─── Public types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    Draw,
    Select,
}

/// What is selected in SELECT mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A whole segment body.
    Segment(SegmentId),
    /// The endpoint marker at `slot` (0 start, 1 end) of `segment`. Moving
    /// it moves every segment sharing the marker.
    EndPoint { segment: SegmentId, slot: usize },
    /// An interior control point of one segment.
    ControlPoint { segment: SegmentId, index: usize },
}

impl Selection {
    pub fn segment(&self) -> SegmentId {
        match *self {
            Selection::Segment(id)
            | Selection::EndPoint { segment: id, .. }
            | Selection::ControlPoint { segment: id, .. } => id,
        }
    }
}

/// A segment as reported to the host, enough to re-create it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment: SegmentId,
    pub primitive: PrimitiveId,
    pub points: SegmentPoints,
    pub closed_loop: bool,
}

impl SegmentRecord {
    pub fn of(segment: &Segment) -> Self {
        Self {
            segment: segment.id(),
            primitive: segment.primitive(),
            points: segment.to_points(),
            closed_loop: segment.closed_loop(),
        }
    }
}

/// Lifecycle and edit notifications for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EditorEvent {
    DrawStart { primitive: Option<PrimitiveId> },
    LineAdded(SegmentRecord),
    LinesDeleted(Vec<SegmentRecord>),
    Transform(TransformPair),
    /// DRAW finished. `primitive` is the created or updated path, `None`
    /// when nothing was drawn.
    DrawComplete { primitive: Option<PrimitiveId> },
    TransformComplete {
        primitive: PrimitiveId,
        before: String,
        after: String,
    },
}

// ─── Sessions ────────────────────────────────────────────────────────────

/// State shared by both editing modes.
#[derive(Debug)]
struct Session {
    root: PrimitiveId,
    graph: PathGraph,
    overlay: Overlay,
    world: Affine,
    to_local: Affine,
    local_scale: f64,
    snap: SnapResult,
}

impl Session {
    fn new(
        scene: &mut Scene,
        config: &EditorConfig,
        scale: f64,
        world: Affine,
        show_cursor: bool,
    ) -> Result<Self, PathError> {
        let to_local = invert(world)?;
        let local_scale = scale * linear_scale(world);
        let scene_root = scene.root_id();
        let root = scene.add(
            scene_root,
            Primitive::group(PrimitiveId::with_prefix("editing")).with_transform(world),
        );
        let graph = PathGraph::new(scene, root, config, local_scale);
        let overlay = Overlay::new(scene, root, config, local_scale, show_cursor);
        Ok(Self {
            root,
            graph,
            overlay,
            world,
            to_local,
            local_scale,
            snap: SnapResult::raw(Point::ZERO),
        })
    }

    fn local(&self, p: Point) -> Point {
        self.to_local * p
    }

    /// Screen-space length in local units.
    fn local_len(&self, screen: f64) -> f64 {
        screen / self.local_scale
    }

    fn set_scale(&mut self, scene: &mut Scene, scale: f64) {
        self.local_scale = scale * linear_scale(self.world);
        self.graph.update_scale(scene, self.local_scale);
        self.overlay.update_scale(scene, self.local_scale);
    }

    fn teardown(self, scene: &mut Scene) {
        self.graph.remove(scene);
        self.overlay.remove(scene);
        scene.remove(self.root);
    }
}

#[derive(Debug)]
struct DrawSession {
    session: Session,
    gesture: Gesture,
    /// Existing path being extended, hidden while drawing.
    source: Option<PrimitiveId>,
    pressed: bool,
    /// Segment committed by the current press and its geometry before any
    /// handle was dragged out.
    reshaping: Option<(SegmentId, SegmentGeometry)>,
}

#[derive(Debug)]
struct SelectSession {
    session: Session,
    target: PrimitiveId,
    before: String,
    selection: Option<Selection>,
    hovered: Option<SegmentId>,
    recorder: TransformRecorder,
    pressed: bool,
    /// Offset from the cursor to the grabbed point.
    grab: Vec2,
}

#[derive(Debug)]
enum Mode {
    Idle,
    Drawing(Box<DrawSession>),
    Selecting(Box<SelectSession>),
}

impl Mode {
    fn session(&self) -> Option<&Session> {
        match self {
            Mode::Idle => None,
            Mode::Drawing(d) => Some(&d.session),
            Mode::Selecting(s) => Some(&s.session),
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match self {
            Mode::Idle => None,
            Mode::Drawing(d) => Some(&mut d.session),
            Mode::Selecting(s) => Some(&mut s.session),
        }
    }
}

// ─── Editor ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DrawEditor {
    pub scene: Scene,
    config: EditorConfig,
    scale: f64,
    mode: Mode,
}

impl DrawEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_scene(Scene::new(), config)
    }

    pub fn with_scene(scene: Scene, config: EditorConfig) -> Self {
        Self {
            scene,
            config,
            scale: 1.0,
            mode: Mode::Idle,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn mode(&self) -> EditorMode {
        match self.mode {
            Mode::Idle => EditorMode::Idle,
            Mode::Drawing(_) => EditorMode::Draw,
            Mode::Selecting(_) => EditorMode::Select,
        }
    }

    /// The path graph of the active session.
    pub fn graph(&self) -> Option<&PathGraph> {
        self.mode.session().map(|s| &s.graph)
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        match &self.mode {
            Mode::Drawing(d) => Some(&d.gesture),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        match &self.mode {
            Mode::Selecting(s) => s.selection,
            _ => None,
        }
    }

    /// Last resolved snap of the active session.
    pub fn last_snap(&self) -> Option<SnapResult> {
        self.mode.session().map(|s| s.snap)
    }

    /// The primitive currently hidden behind the session, if any.
    pub fn edited_primitive(&self) -> Option<PrimitiveId> {
        match &self.mode {
            Mode::Idle => None,
            Mode::Drawing(d) => d.source,
            Mode::Selecting(s) => Some(s.target),
        }
    }

    // ─── Mode transitions ────────────────────────────────────────────────

    /// Enter DRAW: a fresh path, or, with `source`, extend an existing one
    /// from its last end point. Any active session is abandoned first.
    ///
    /// # Errors
    /// `source` is not a path, its data does not parse, or its transform
    /// cannot be inverted. The editor keeps its previous mode.
    pub fn start_draw(
        &mut self,
        source: Option<PrimitiveId>,
    ) -> Result<Vec<EditorEvent>, PathError> {
        let (world, pieces) = match source {
            Some(id) => (self.scene.world_transform(id), self.load_path(id)?),
            None => (Affine::IDENTITY, Vec::new()),
        };
        invert(world)?;
        self.abandon();

        let mut session = Session::new(&mut self.scene, &self.config, self.scale, world, true)?;
        for piece in pieces {
            session.graph.append(&mut self.scene, piece, false);
        }
        let mut gesture = Gesture::new(self.config.min_spacing);
        gesture.reset_to(session.graph.last_segment().map(|s| s.geometry().last()));
        if let Some(id) = source {
            self.scene.set_visible(id, false);
        }

        log::debug!("editor: draw started (source {source:?})");
        self.mode = Mode::Drawing(Box::new(DrawSession {
            session,
            gesture,
            source,
            pressed: false,
            reshaping: None,
        }));
        Ok(vec![EditorEvent::DrawStart { primitive: source }])
    }

    /// Enter SELECT on an existing path primitive.
    ///
    /// # Errors
    /// As for `start_draw`.
    pub fn start_select(&mut self, target: PrimitiveId) -> Result<Vec<EditorEvent>, PathError> {
        let pieces = self.load_path(target)?;
        let world = self.scene.world_transform(target);
        invert(world)?;
        let before = self.scene.path_data(target).unwrap_or_default().to_string();
        self.abandon();

        let mut session = Session::new(&mut self.scene, &self.config, self.scale, world, false)?;
        for piece in pieces {
            session.graph.append(&mut self.scene, piece, false);
        }
        self.scene.set_visible(target, false);

        log::debug!("editor: select started on {target}");
        self.mode = Mode::Selecting(Box::new(SelectSession {
            session,
            target,
            before,
            selection: None,
            hovered: None,
            recorder: TransformRecorder::default(),
            pressed: false,
            grab: Vec2::ZERO,
        }));
        Ok(Vec::new())
    }

    fn load_path(&self, id: PrimitiveId) -> Result<Vec<SegmentGeometry>, PathError> {
        let d = self
            .scene
            .path_data(id)
            .ok_or_else(|| PathError::NotAPath(id.to_string()))?;
        decompose(d)
            .inspect_err(|err| log::debug!("editor: rejected {id}: {err}"))
    }

    /// Finish the active mode: materialize the path and report it.
    pub fn complete(&mut self) -> Vec<EditorEvent> {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Idle => Vec::new(),
            Mode::Drawing(draw) => {
                let draw = *draw;
                let (session, source) = (draw.session, draw.source);
                let d = session.graph.compose_full_path();
                let primitive = match source {
                    // Everything was removed: the source keeps its data.
                    Some(id) if session.graph.is_empty() => {
                        self.scene.set_visible(id, true);
                        None
                    }
                    Some(id) => {
                        self.scene.set_path_data(id, d);
                        self.scene.set_visible(id, true);
                        Some(id)
                    }
                    None if session.graph.is_empty() => None,
                    None => {
                        let stroke = self.config.stroke_color.as_str();
                        let path = Primitive::path(PrimitiveId::with_prefix("path"), d)
                            .with_stroke(stroke, self.config.stroke_width);
                        let root = self.scene.root_id();
                        Some(self.scene.add(root, path))
                    }
                };
                session.teardown(&mut self.scene);
                log::debug!("editor: draw complete ({primitive:?})");
                vec![EditorEvent::DrawComplete { primitive }]
            }
            Mode::Selecting(select) => {
                let SelectSession {
                    session,
                    target,
                    before,
                    ..
                } = *select;
                let after = session.graph.compose_full_path();
                self.scene.set_path_data(target, after.clone());
                self.scene.set_visible(target, true);
                session.teardown(&mut self.scene);
                log::debug!("editor: transform complete on {target}");
                vec![EditorEvent::TransformComplete {
                    primitive: target,
                    before,
                    after,
                }]
            }
        }
    }

    /// Leave the active mode. A forced stop discards all editing state,
    /// un-hides the edited primitive and reports nothing.
    pub fn stop_draw(&mut self, forced: bool) -> Vec<EditorEvent> {
        if !forced {
            return self.complete();
        }
        self.abandon();
        Vec::new()
    }

    fn abandon(&mut self) {
        let restore = self.edited_primitive();
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Idle => return,
            Mode::Drawing(draw) => draw.session.teardown(&mut self.scene),
            Mode::Selecting(select) => select.session.teardown(&mut self.scene),
        }
        if let Some(id) = restore {
            self.scene.set_visible(id, true);
        }
        log::debug!("editor: session abandoned");
    }

    // ─── Pointer protocol ────────────────────────────────────────────────

    /// `hit` is the primitive under the cursor as the host resolved it;
    /// `None` lets the editor pick.
    pub fn on_pointer_down(
        &mut self,
        cursor: Point,
        button: PointerButton,
        hit: Option<PrimitiveId>,
    ) -> Vec<EditorEvent> {
        if button != PointerButton::Primary {
            return Vec::new();
        }
        let hit = hit.or_else(|| self.pick(cursor));
        let (scene, config) = (&mut self.scene, &self.config);
        match &mut self.mode {
            Mode::Idle => Vec::new(),
            Mode::Drawing(draw) => draw.pointer_down(scene, config, cursor),
            Mode::Selecting(select) => select.pointer_down(scene, cursor, hit),
        }
    }

    pub fn on_pointer_move(
        &mut self,
        cursor: Point,
        delta: Vec2,
        primary_held: bool,
    ) -> Vec<EditorEvent> {
        let (scene, config) = (&mut self.scene, &self.config);
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Drawing(draw) => draw.pointer_move(scene, config, cursor, primary_held),
            Mode::Selecting(select) => {
                select.pointer_move(scene, config, cursor, delta, primary_held)
            }
        }
        Vec::new()
    }

    pub fn on_pointer_up(&mut self, cursor: Point, button: PointerButton) -> Vec<EditorEvent> {
        if button != PointerButton::Primary {
            return Vec::new();
        }
        let (scene, config) = (&mut self.scene, &self.config);
        match &mut self.mode {
            Mode::Idle => Vec::new(),
            Mode::Drawing(draw) => {
                draw.pointer_up(scene, config, cursor);
                Vec::new()
            }
            Mode::Selecting(select) => select.pointer_up(scene),
        }
    }

    /// Delete the selection. In DRAW this only discards the open gesture.
    pub fn on_delete(&mut self) -> Vec<EditorEvent> {
        let scene = &mut self.scene;
        match &mut self.mode {
            Mode::Idle => Vec::new(),
            Mode::Drawing(draw) => {
                draw.gesture.clear();
                draw.reshaping = None;
                draw.session.overlay.hide_preview(scene);
                Vec::new()
            }
            Mode::Selecting(select) => select.delete(scene),
        }
    }

    /// Dispatch a normalized input event.
    pub fn handle(&mut self, event: &InputEvent, hit: Option<PrimitiveId>) -> Vec<EditorEvent> {
        match *event {
            InputEvent::PointerDown { x, y, button } => {
                self.on_pointer_down(Point::new(x, y), button, hit)
            }
            InputEvent::PointerMove {
                x,
                y,
                dx,
                dy,
                primary_held,
            } => self.on_pointer_move(Point::new(x, y), Vec2::new(dx, dy), primary_held),
            InputEvent::PointerUp { x, y, button } => self.on_pointer_up(Point::new(x, y), button),
            InputEvent::Delete => self.on_delete(),
            InputEvent::Complete => self.complete(),
            InputEvent::Cancel => self.stop_draw(true),
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Re-size every scale-dependent visual. Geometry is untouched.
    pub fn set_scale(&mut self, scale: f64) {
        if !(scale.is_finite() && scale > 0.0) {
            log::warn!("editor: ignoring view scale {scale}");
            return;
        }
        self.scale = scale;
        let scene = &mut self.scene;
        if let Some(session) = self.mode.session_mut() {
            session.set_scale(scene, scale);
        }
    }

    /// Topmost editing primitive under a scene-space point: endpoint
    /// markers, then control handles, then the nearest segment body.
    pub fn pick(&self, cursor: Point) -> Option<PrimitiveId> {
        let session = self.mode.session()?;
        let local = session.local(cursor);
        let radius = session.local_len(self.config.point_radius());

        let graph = &session.graph;
        let nearest = |items: Vec<(PrimitiveId, Point)>| {
            items
                .into_iter()
                .map(|(id, p)| (id, (p - local).hypot()))
                .filter(|(_, d)| *d <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        };

        let markers = graph
            .markers_in_order()
            .into_iter()
            .filter_map(|m| graph.marker(m).map(|m| (m.primitive, m.pos)))
            .collect();
        if let Some(hit) = nearest(markers) {
            return Some(hit);
        }
        if let Some(hit) = nearest(session.overlay.visible_controls(&self.scene)) {
            return Some(hit);
        }
        let tolerance = session.local_len(self.config.hover_tolerance);
        graph
            .nearest_segment(local, tolerance)
            .and_then(|id| graph.segment(id))
            .map(Segment::primitive)
    }

    // ─── History support ─────────────────────────────────────────────────

    /// Re-create deleted segments in the active session. Returns how many
    /// were restored.
    pub fn restore_segments(&mut self, records: &[SegmentRecord]) -> usize {
        let scene = &mut self.scene;
        let Some(session) = self.mode.session_mut() else {
            return 0;
        };
        let mut restored = 0;
        for record in records {
            match SegmentGeometry::try_from(record.points.clone()) {
                Ok(geometry) => {
                    session.graph.restore(
                        scene,
                        record.segment,
                        record.primitive,
                        geometry,
                        record.closed_loop,
                    );
                    restored += 1;
                }
                Err(err) => log::warn!(
                    "editor: cannot restore segment {}: {err}",
                    record.segment.0
                ),
            }
        }
        self.after_structure_change();
        restored
    }

    /// Delete segments from the active session. Returns how many existed.
    pub fn remove_segments(&mut self, ids: &[SegmentId]) -> usize {
        let scene = &mut self.scene;
        let Some(session) = self.mode.session_mut() else {
            return 0;
        };
        let removed = ids
            .iter()
            .filter(|id| session.graph.delete_segment(scene, **id).is_some())
            .count();
        self.after_structure_change();
        removed
    }

    /// Overwrite segment geometry from transform records, then relink.
    pub fn apply_records(&mut self, records: &[TransformRecord]) {
        let scene = &mut self.scene;
        let Some(session) = self.mode.session_mut() else {
            return;
        };
        for record in records {
            match SegmentGeometry::try_from(record.points.clone()) {
                Ok(geometry) => session.graph.update_segment(scene, record.segment, geometry),
                Err(err) => log::warn!(
                    "editor: cannot apply record for {}: {err}",
                    record.segment.0
                ),
            }
        }
        session.graph.relink(scene);
        self.after_structure_change();
    }

    /// Replace a finished primitive's path data.
    pub fn set_primitive_path(&mut self, primitive: PrimitiveId, d: &str) -> bool {
        self.scene.set_path_data(primitive, d.to_string())
    }

    /// Keep gesture and selection valid after segments came or went.
    fn after_structure_change(&mut self) {
        let scene = &mut self.scene;
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Drawing(draw) => {
                draw.reshaping = None;
                let last = draw.session.graph.last_segment();
                let tail = last.map(|s| s.geometry().last());
                draw.gesture.reset_to(tail);
                draw.session.overlay.hide_preview(scene);
            }
            Mode::Selecting(select) => {
                let selection = select
                    .selection
                    .filter(|sel| select.session.graph.segment(sel.segment()).is_some());
                select.select(scene, selection);
            }
        }
    }
}

// ─── DRAW ────────────────────────────────────────────────────────────────

impl DrawSession {
    /// Committed markers in graph order, then open-gesture end points that
    /// are not markers yet.
    fn resolve(&self, config: &EditorConfig, local: Point) -> SnapResult {
        let graph = &self.session.graph;
        let mut candidates = graph.snap_candidates(None);
        candidates.extend(
            self.gesture
                .end_points()
                .filter(|p| graph.marker_at(*p).is_none()),
        );
        let space = self.session.local_len(config.attach_space);
        attach_cursor(local, candidates, space)
    }

    fn pointer_down(
        &mut self,
        scene: &mut Scene,
        config: &EditorConfig,
        cursor: Point,
    ) -> Vec<EditorEvent> {
        let snap = self.resolve(config, self.session.local(cursor));
        self.session.snap = snap;
        self.pressed = true;
        self.reshaping = None;

        let mut events = Vec::new();
        match self.gesture.set_end_point(snap.position) {
            EndPointOutcome::Committed(geometry) => {
                let id = self.session.graph.append(scene, geometry.clone(), snap.attached);
                if let Some(segment) = self.session.graph.segment(id) {
                    events.push(EditorEvent::LineAdded(SegmentRecord::of(segment)));
                }
                if snap.attached {
                    log::debug!("editor: loop closed at {:?}", snap.position);
                    self.gesture.clear();
                } else {
                    self.reshaping = Some((id, geometry));
                }
            }
            EndPointOutcome::Started => log::trace!("editor: chain started at {:?}", snap.position),
            EndPointOutcome::Ignored => {}
        }

        self.session.overlay.update_cursor(scene, snap.position, true);
        self.session.overlay.hide_preview(scene);
        events
    }

    fn pointer_move(
        &mut self,
        scene: &mut Scene,
        config: &EditorConfig,
        cursor: Point,
        primary_held: bool,
    ) {
        let snap = self.resolve(config, self.session.local(cursor));
        self.session.snap = snap;
        self.session.overlay.update_cursor(scene, snap.position, primary_held);
        self.session.overlay.show_snap(scene, &snap);

        if primary_held && self.pressed {
            if let Some((id, base)) = &self.reshaping {
                self.session.graph.redraw_curve(scene, *id, base, snap.position);
            }
        }
        let preview = self.gesture.preview(snap.position);
        self.session.overlay.show_preview(scene, &preview);
    }

    /// A release away from the last end point drags out a control point,
    /// unless the release snapped onto an endpoint.
    fn pointer_up(&mut self, scene: &mut Scene, config: &EditorConfig, cursor: Point) {
        if !self.pressed {
            return;
        }
        self.pressed = false;
        let snap = self.resolve(config, self.session.local(cursor));
        self.session.snap = snap;
        let reshaping = self.reshaping.take();

        let threshold = self.session.local_len(config.drag_threshold);
        let pulled = match self.gesture.last() {
            Some(last) if last.is_end() && !snap.attached => {
                (snap.position - last.pos).hypot() > threshold
            }
            _ => false,
        };
        if pulled && self.gesture.set_control_point(snap.position) {
            log::trace!("editor: control point at {:?}", snap.position);
        } else if let Some((id, base)) = reshaping {
            self.session.graph.update_segment(scene, id, base);
        }

        self.session.overlay.update_cursor(scene, snap.position, false);
        let preview = self.gesture.preview(snap.position);
        self.session.overlay.show_preview(scene, &preview);
    }
}

// ─── SELECT ──────────────────────────────────────────────────────────────

impl SelectSession {
    fn classify(&self, hit: PrimitiveId) -> Option<Selection> {
        if let Some((segment, index)) = self.session.overlay.control_target(hit) {
            return Some(Selection::ControlPoint { segment, index });
        }
        let graph = &self.session.graph;
        if let Some(marker) = graph.marker_by_primitive(hit) {
            let (segment, slot) = graph.marker_endpoints(marker).into_iter().next()?;
            return Some(Selection::EndPoint { segment, slot });
        }
        graph.find_by_primitive(hit).map(Selection::Segment)
    }

    /// Position of the selected point, if a point is selected.
    fn selected_point(&self, selection: Selection) -> Option<Point> {
        let segment = self.session.graph.segment(selection.segment())?;
        match selection {
            Selection::Segment(_) => None,
            Selection::EndPoint { slot, .. } => Some(segment.geometry().endpoint(slot)),
            Selection::ControlPoint { index, .. } => segment.points().get(index).copied(),
        }
    }

    /// Segments a drag of `selection` will mutate.
    fn affected(&self, selection: Selection) -> Vec<SegmentId> {
        let graph = &self.session.graph;
        match selection {
            Selection::ControlPoint { segment, .. } => vec![segment],
            Selection::EndPoint { segment, slot } => match graph.segment(segment) {
                Some(s) => graph
                    .marker_endpoints(s.markers()[slot])
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect(),
                None => Vec::new(),
            },
            Selection::Segment(id) => graph
                .linked_segments(id)
                .into_iter()
                .map(|l| l.segment)
                .collect(),
        }
    }

    /// Apply a selection and refresh highlights and handles.
    fn select(&mut self, scene: &mut Scene, selection: Option<Selection>) {
        self.selection = selection;
        let graph = &self.session.graph;
        let overlay = &mut self.session.overlay;

        let mut lit: Vec<SegmentId> = selection.iter().map(Selection::segment).collect();
        lit.extend(self.hovered);
        graph.highlight_segments(scene, &lit);

        let marker = match selection {
            Some(Selection::EndPoint { segment, slot }) => {
                graph.segment(segment).map(|s| s.markers()[slot])
            }
            _ => None,
        };
        graph.highlight_marker(scene, marker);

        match selection.and_then(|sel| graph.segment(sel.segment())) {
            Some(segment) => overlay.show_segment_handles(scene, segment),
            None => overlay.clear_handles(scene),
        }
        let control = match selection {
            Some(Selection::ControlPoint { segment, index }) => {
                overlay.control_primitive(segment, index)
            }
            _ => None,
        };
        overlay.highlight_control(scene, control);
    }

    fn pointer_down(
        &mut self,
        scene: &mut Scene,
        cursor: Point,
        hit: Option<PrimitiveId>,
    ) -> Vec<EditorEvent> {
        let local = self.session.local(cursor);
        self.pressed = true;
        let selection = hit.and_then(|h| self.classify(h));
        self.select(scene, selection);

        match selection {
            Some(sel) => {
                self.grab = self.selected_point(sel).map_or(Vec2::ZERO, |p| p - local);
                let affected = self.affected(sel);
                self.recorder.begin(&self.session.graph, affected);
                log::trace!("editor: selected {sel:?}");
            }
            None => {
                self.grab = Vec2::ZERO;
                self.recorder.cancel();
            }
        }
        Vec::new()
    }

    fn pointer_move(
        &mut self,
        scene: &mut Scene,
        config: &EditorConfig,
        cursor: Point,
        delta: Vec2,
        primary_held: bool,
    ) {
        let local = self.session.local(cursor);
        if !(primary_held && self.pressed) {
            self.session.overlay.hide_guides(scene);
            let tolerance = self.session.local_len(config.hover_tolerance);
            let hovered = self.session.graph.nearest_segment(local, tolerance);
            if hovered != self.hovered {
                self.hovered = hovered;
                self.select(scene, self.selection);
            }
            return;
        }
        let Some(selection) = self.selection else {
            return;
        };
        let space = self.session.local_len(config.attach_space);
        let graph = &mut self.session.graph;

        match selection {
            Selection::EndPoint { segment, slot } => {
                let Some(marker) = graph.segment(segment).map(|s| s.markers()[slot]) else {
                    return;
                };
                let candidates = graph.snap_candidates(Some(marker));
                let snap = attach_cursor(local + self.grab, candidates, space);
                graph.move_marker(scene, marker, snap.position);
                self.session.overlay.show_snap(scene, &snap);
                self.session.snap = snap;
            }
            Selection::ControlPoint { segment, index } => {
                let snap = attach_cursor(local + self.grab, graph.snap_candidates(None), space);
                graph.move_point(scene, segment, index, snap.position);
                self.session.overlay.show_snap(scene, &snap);
                self.session.snap = snap;
            }
            Selection::Segment(id) => {
                let delta = apply_vector(self.session.to_local, delta);
                if delta == Vec2::ZERO {
                    return;
                }
                for linked in graph.linked_segments(id) {
                    let Some(moved) = graph
                        .segment(linked.segment)
                        .map(|s| s.geometry().translated(&linked.indexes, delta))
                    else {
                        continue;
                    };
                    graph.update_segment(scene, linked.segment, moved);
                }
                self.session.overlay.hide_guides(scene);
            }
        }
        self.recorder.mark_dirty();
        self.select(scene, Some(selection));
    }

    fn pointer_up(&mut self, scene: &mut Scene) -> Vec<EditorEvent> {
        if !self.pressed {
            return Vec::new();
        }
        self.pressed = false;
        let mut events = Vec::new();
        if let Some(pair) = self.recorder.finish(&self.session.graph) {
            log::debug!("editor: transform of {} segment(s)", pair.after.len());
            events.push(EditorEvent::Transform(pair));
        }
        self.session.graph.relink(scene);
        self.session.overlay.hide_guides(scene);
        self.select(scene, self.selection);
        events
    }

    /// Control point: its segment. End point: every segment on the marker.
    /// Segment: itself.
    fn delete(&mut self, scene: &mut Scene) -> Vec<EditorEvent> {
        let Some(selection) = self.selection else {
            return Vec::new();
        };
        let doomed = match selection {
            Selection::EndPoint { .. } => self.affected(selection),
            other => vec![other.segment()],
        };
        self.recorder.cancel();
        let records: Vec<SegmentRecord> = doomed
            .into_iter()
            .filter_map(|id| self.session.graph.delete_segment(scene, id))
            .map(|s| SegmentRecord::of(&s))
            .collect();
        self.hovered = None;
        self.select(scene, None);
        if records.is_empty() {
            return Vec::new();
        }
        log::debug!("editor: deleted {} segment(s)", records.len());
        vec![EditorEvent::LinesDeleted(records)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn click(editor: &mut DrawEditor, x: f64, y: f64) -> Vec<EditorEvent> {
        let at = Point::new(x, y);
        let mut events = editor.on_pointer_down(at, PointerButton::Primary, None);
        events.extend(editor.on_pointer_up(at, PointerButton::Primary));
        events
    }

    #[test]
    fn idle_editor_ignores_input() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        assert!(click(&mut editor, 1.0, 1.0).is_empty());
        assert!(editor.complete().is_empty());
        assert!(editor.on_delete().is_empty());
        assert_eq!(editor.mode(), EditorMode::Idle);
    }

    #[test]
    fn secondary_button_is_ignored() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        editor.start_draw(None).unwrap();
        editor.on_pointer_down(Point::ZERO, PointerButton::Secondary, None);
        assert_eq!(editor.gesture().unwrap().points().len(), 0);
    }

    #[test]
    fn drag_after_click_adds_mirrored_handle() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        editor.start_draw(None).unwrap();
        click(&mut editor, 0.0, 0.0);

        editor.on_pointer_down(Point::new(100.0, 0.0), PointerButton::Primary, None);
        editor.on_pointer_move(Point::new(100.0, 40.0), Vec2::new(0.0, 40.0), true);
        editor.on_pointer_up(Point::new(100.0, 40.0), PointerButton::Primary);

        let graph = editor.graph().unwrap();
        assert_eq!(graph.segments()[0].path_data(), "M 0 0 Q 100 -40 100 0");
        let gesture = editor.gesture().unwrap();
        assert_eq!(gesture.points().len(), 2);
        assert_eq!(gesture.points()[1].pos, Point::new(100.0, 40.0));
    }

    #[test]
    fn short_drag_restores_the_segment() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        editor.start_draw(None).unwrap();
        click(&mut editor, 0.0, 0.0);
        editor.on_pointer_down(Point::new(100.0, 0.0), PointerButton::Primary, None);
        editor.on_pointer_move(Point::new(100.0, 1.0), Vec2::new(0.0, 1.0), true);
        editor.on_pointer_up(Point::new(100.0, 1.0), PointerButton::Primary);

        assert_eq!(
            editor.graph().unwrap().segments()[0].path_data(),
            "M 0 0 L 100 0"
        );
        assert_eq!(editor.gesture().unwrap().points().len(), 1);
    }

    #[test]
    fn forced_stop_leaves_no_visuals() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        editor.start_draw(None).unwrap();
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 50.0, 0.0);
        editor.on_pointer_move(Point::new(80.0, 20.0), Vec2::ZERO, false);
        assert!(editor.stop_draw(true).is_empty());
        assert!(editor.scene.is_empty());
        assert_eq!(editor.mode(), EditorMode::Idle);
    }

    #[test]
    fn start_select_rejects_non_paths() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        let root = editor.scene.root_id();
        let circle = Primitive::circle(PrimitiveId::with_prefix("c"), Point::ZERO, 1.0);
        let dot = editor.scene.add(root, circle);
        assert!(matches!(
            editor.start_select(dot),
            Err(PathError::NotAPath(_))
        ));
        assert_eq!(editor.mode(), EditorMode::Idle);
    }

    #[test]
    fn pick_prefers_markers_over_segments() {
        let mut editor = DrawEditor::new(EditorConfig::default());
        editor.start_draw(None).unwrap();
        click(&mut editor, 0.0, 0.0);
        click(&mut editor, 100.0, 0.0);
        let graph = editor.graph().unwrap();
        let origin = graph.marker_at(Point::ZERO).unwrap();
        let marker = graph.marker(origin).unwrap().primitive;
        let body = graph.segments()[0].primitive();

        assert_eq!(editor.pick(Point::new(1.0, 1.0)), Some(marker));
        assert_eq!(editor.pick(Point::new(50.0, 3.0)), Some(body));
        assert_eq!(editor.pick(Point::new(50.0, 30.0)), None);
    }
}

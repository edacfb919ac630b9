//! Integration tests: operation history over editor events (ld-editor).
//!
//! Every editor call's events go through `History::record`, as a host
//! would wire them, and undo/redo are checked against the live session.

use ld_core::{EditorConfig, Point};
use ld_editor::{DrawEditor, EditorEvent, History, InputEvent};
use pretty_assertions::assert_eq;
use std::cmp::Ordering;

struct Harness {
    editor: DrawEditor,
    history: History,
}

impl Harness {
    fn new() -> Self {
        let config = EditorConfig::default();
        let history = History::new(config.history_depth);
        Self {
            editor: DrawEditor::new(config),
            history,
        }
    }

    fn send(&mut self, event: InputEvent) -> Vec<EditorEvent> {
        let events = self.editor.handle(&event, None);
        self.history.record(&events);
        events
    }

    fn click(&mut self, x: f64, y: f64) {
        self.send(InputEvent::down(x, y));
        self.send(InputEvent::up(x, y));
    }

    fn points(&self) -> Vec<Vec<(f64, f64)>> {
        let mut out: Vec<Vec<(f64, f64)>> = self
            .editor
            .graph()
            .map(|g| {
                g.segments()
                    .iter()
                    .map(|s| s.points().iter().map(|p| (p.x, p.y)).collect())
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal));
        out
    }
}

// ─── Drawing ─────────────────────────────────────────────────────────────

#[test]
fn undo_and_redo_a_drawn_line() {
    let mut h = Harness::new();
    h.editor.start_draw(None).unwrap();
    h.click(0.0, 0.0);
    h.click(100.0, 0.0);
    h.click(100.0, 100.0);
    assert_eq!(h.editor.graph().unwrap().len(), 2);

    assert_eq!(h.history.undo(&mut h.editor), Some("draw line"));
    assert_eq!(h.points(), vec![vec![(0.0, 0.0), (100.0, 0.0)]]);
    // Drawing resumes from the end of what is left.
    assert_eq!(
        h.editor.gesture().unwrap().last().map(|p| p.pos),
        Some(Point::new(100.0, 0.0))
    );

    assert_eq!(h.history.redo(&mut h.editor), Some("draw line"));
    assert_eq!(
        h.points(),
        vec![
            vec![(0.0, 0.0), (100.0, 0.0)],
            vec![(100.0, 0.0), (100.0, 100.0)],
        ]
    );
    let graph = h.editor.graph().unwrap();
    let corner = graph.marker_at(Point::new(100.0, 0.0)).unwrap();
    assert_eq!(graph.marker(corner).unwrap().owners.len(), 2);
}

#[test]
fn lifecycle_events_are_not_undoable() {
    let mut h = Harness::new();
    let events = h.editor.start_draw(None).unwrap();
    assert_eq!(h.history.record(&events), 0);
    h.click(0.0, 0.0);
    assert!(!h.history.can_undo());
}

// ─── Selecting ───────────────────────────────────────────────────────────

fn select_chain(h: &mut Harness) {
    h.editor.start_draw(None).unwrap();
    for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (200.0, 100.0)] {
        h.click(x, y);
    }
    let done = h.editor.complete();
    let Some(EditorEvent::DrawComplete { primitive }) = done.first().cloned() else {
        panic!("expected a finished path, got {done:?}");
    };
    let path = primitive.expect("a finished path");
    h.history.clear();
    h.editor.start_select(path).unwrap();
}

#[test]
fn undo_and_redo_an_endpoint_drag() {
    let mut h = Harness::new();
    select_chain(&mut h);

    h.send(InputEvent::down(100.0, 0.0));
    h.send(InputEvent::drag(130.0, -30.0, 30.0, -30.0));
    h.send(InputEvent::up(130.0, -30.0));
    let moved = vec![
        vec![(0.0, 0.0), (130.0, -30.0)],
        vec![(100.0, 100.0), (200.0, 100.0)],
        vec![(130.0, -30.0), (100.0, 100.0)],
    ];
    assert_eq!(h.points(), moved);

    assert_eq!(h.history.undo(&mut h.editor), Some("move points"));
    assert_eq!(
        h.points(),
        vec![
            vec![(0.0, 0.0), (100.0, 0.0)],
            vec![(100.0, 0.0), (100.0, 100.0)],
            vec![(100.0, 100.0), (200.0, 100.0)],
        ]
    );
    let graph = h.editor.graph().unwrap();
    let corner = graph.marker_at(Point::new(100.0, 0.0)).unwrap();
    assert_eq!(graph.marker(corner).unwrap().owners.len(), 2);

    h.history.redo(&mut h.editor);
    assert_eq!(h.points(), moved);
}

#[test]
fn undo_a_delete_restores_segment_and_primitive() {
    let mut h = Harness::new();
    select_chain(&mut h);
    let middle = h.editor.graph().unwrap().segments()[1].primitive();

    h.editor.on_pointer_down(Point::new(100.0, 50.0), Default::default(), Some(middle));
    h.send(InputEvent::up(100.0, 50.0));
    h.send(InputEvent::Delete);
    assert_eq!(h.editor.graph().unwrap().len(), 2);
    assert!(!h.editor.scene.contains(middle));

    assert_eq!(h.history.undo(&mut h.editor), Some("delete lines"));
    assert_eq!(h.editor.graph().unwrap().len(), 3);
    assert!(h.editor.scene.contains(middle));
    let graph = h.editor.graph().unwrap();
    for corner in [Point::new(100.0, 0.0), Point::new(100.0, 100.0)] {
        let marker = graph.marker_at(corner).unwrap();
        assert_eq!(graph.marker(marker).unwrap().owners.len(), 2);
    }

    h.history.redo(&mut h.editor);
    assert_eq!(h.editor.graph().unwrap().len(), 2);
}

#[test]
fn undo_a_finished_edit_rewrites_the_primitive() {
    let mut h = Harness::new();
    select_chain(&mut h);
    let target = h.editor.edited_primitive().unwrap();

    h.send(InputEvent::down(200.0, 100.0));
    h.send(InputEvent::drag(200.0, 150.0, 0.0, 50.0));
    h.send(InputEvent::up(200.0, 150.0));
    h.send(InputEvent::Complete);
    let after = "M 0 0 L 100 0 M 100 0 L 100 100 M 100 100 L 200 150";
    assert_eq!(h.editor.scene.path_data(target), Some(after));

    assert_eq!(h.history.undo(&mut h.editor), Some("edit path"));
    assert_eq!(
        h.editor.scene.path_data(target),
        Some("M 0 0 L 100 0 M 100 0 L 100 100 M 100 100 L 200 100")
    );
    h.history.redo(&mut h.editor);
    assert_eq!(h.editor.scene.path_data(target), Some(after));
}

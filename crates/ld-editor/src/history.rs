//! Undo/redo for path editing.
//!
//! The editor itself never keeps history: it reports what happened as
//! `EditorEvent`s. `History::record` turns the undoable ones into
//! `Operation`s, and undo/redo replay them back through the editor's
//! segment-level hooks. Segment operations only apply while the session
//! that produced them is still open; `DrawTransformComplete` rewrites the
//! finished primitive and works from any mode.

use crate::editor::{DrawEditor, EditorEvent, SegmentRecord};
use crate::recorder::TransformPair;
use ld_core::PrimitiveId;

/// A reversible editing step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A segment committed while drawing.
    DrawLine(SegmentRecord),
    /// Segments removed in one delete.
    DrawDelete(Vec<SegmentRecord>),
    /// One drag of points or segments.
    DrawTransform(TransformPair),
    /// A finished SELECT edit of `primitive`.
    DrawTransformComplete {
        primitive: PrimitiveId,
        before: String,
        after: String,
    },
}

impl Operation {
    /// The undoable part of an editor event, if any.
    pub fn from_event(event: &EditorEvent) -> Option<Self> {
        match event {
            EditorEvent::LineAdded(record) => Some(Operation::DrawLine(record.clone())),
            EditorEvent::LinesDeleted(records) => Some(Operation::DrawDelete(records.clone())),
            EditorEvent::Transform(pair) => Some(Operation::DrawTransform(pair.clone())),
            EditorEvent::TransformComplete {
                primitive,
                before,
                after,
            } if before != after => Some(Operation::DrawTransformComplete {
                primitive: *primitive,
                before: before.clone(),
                after: after.clone(),
            }),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::DrawLine(_) => "draw line",
            Operation::DrawDelete(_) => "delete lines",
            Operation::DrawTransform(_) => "move points",
            Operation::DrawTransformComplete { .. } => "edit path",
        }
    }

    fn undo(&self, editor: &mut DrawEditor) {
        match self {
            Operation::DrawLine(record) => {
                editor.remove_segments(&[record.segment]);
            }
            Operation::DrawDelete(records) => {
                editor.restore_segments(records);
            }
            Operation::DrawTransform(pair) => editor.apply_records(&pair.before),
            Operation::DrawTransformComplete {
                primitive, before, ..
            } => {
                editor.set_primitive_path(*primitive, before);
            }
        }
    }

    fn redo(&self, editor: &mut DrawEditor) {
        match self {
            Operation::DrawLine(record) => {
                editor.restore_segments(std::slice::from_ref(record));
            }
            Operation::DrawDelete(records) => {
                let ids: Vec<_> = records.iter().map(|r| r.segment).collect();
                editor.remove_segments(&ids);
            }
            Operation::DrawTransform(pair) => editor.apply_records(&pair.after),
            Operation::DrawTransformComplete {
                primitive, after, ..
            } => {
                editor.set_primitive_path(*primitive, after);
            }
        }
    }
}

/// Bounded undo/redo stacks.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Operation>,
    redo_stack: Vec<Operation>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Push a new operation. Clears the redo stack.
    pub fn push(&mut self, op: Operation) {
        log::trace!("history: push {}", op.description());
        self.undo_stack.push(op);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Push every undoable event. Returns how many were recorded.
    pub fn record(&mut self, events: &[EditorEvent]) -> usize {
        let mut count = 0;
        for op in events.iter().filter_map(Operation::from_event) {
            self.push(op);
            count += 1;
        }
        count
    }

    /// Undo the last operation, returning its description.
    pub fn undo(&mut self, editor: &mut DrawEditor) -> Option<&'static str> {
        let op = self.undo_stack.pop()?;
        op.undo(editor);
        let desc = op.description();
        self.redo_stack.push(op);
        Some(desc)
    }

    /// Redo the last undone operation, returning its description.
    pub fn redo(&mut self, editor: &mut DrawEditor) -> Option<&'static str> {
        let op = self.redo_stack.pop()?;
        op.redo(editor);
        let desc = op.description();
        self.undo_stack.push(op);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentId;
    use ld_core::{Point, SegmentPoints};
    use pretty_assertions::assert_eq;

    fn line_op(n: u32) -> Operation {
        Operation::DrawLine(SegmentRecord {
            segment: SegmentId(n),
            primitive: PrimitiveId::intern(&format!("seg-{n}")),
            points: SegmentPoints::from_slice(&[Point::ZERO, Point::new(f64::from(n), 0.0)]),
            closed_loop: false,
        })
    }

    #[test]
    fn depth_is_capped() {
        let mut history = History::new(2);
        for n in 0..3 {
            history.push(line_op(n));
        }
        assert_eq!(history.undo_stack, vec![line_op(1), line_op(2)]);
    }

    #[test]
    fn push_clears_redo() {
        let mut history = History::new(10);
        let mut editor = DrawEditor::new(Default::default());
        history.push(line_op(0));
        assert_eq!(history.undo(&mut editor), Some("draw line"));
        assert!(history.can_redo());
        history.push(line_op(1));
        assert!(!history.can_redo());
    }

    #[test]
    fn unchanged_completion_is_not_recorded() {
        let event = EditorEvent::TransformComplete {
            primitive: PrimitiveId::intern("p"),
            before: "M 0 0 L 1 1".into(),
            after: "M 0 0 L 1 1".into(),
        };
        assert_eq!(Operation::from_event(&event), None);
        assert_eq!(
            Operation::from_event(&EditorEvent::DrawStart { primitive: None }),
            None
        );
    }
}

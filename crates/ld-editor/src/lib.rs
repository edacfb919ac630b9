pub mod editor;
pub mod gesture;
pub mod graph;
pub mod history;
pub mod input;
pub mod overlay;
pub mod recorder;
pub mod segment;
pub mod snap;

pub use editor::{DrawEditor, EditorEvent, EditorMode, SegmentRecord, Selection};
pub use gesture::{EndPointOutcome, Gesture, GestureState, Preview};
pub use graph::{LinkedSegment, Marker, PathGraph};
pub use history::{History, Operation};
pub use input::{InputEvent, PointerButton};
pub use recorder::{TransformPair, TransformRecord, TransformRecorder};
pub use segment::{MarkerId, Segment, SegmentId};
pub use snap::{Guide, SnapResult, attach_cursor};

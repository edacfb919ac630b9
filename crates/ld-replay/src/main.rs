//! Replay a JSON script of editor input against `ld-editor`.
//!
//! ```text
//! ld-replay [--svg] [script.json]
//! ```
//!
//! The script is read from the given file, or stdin when omitted. Each step
//! is either an editor command (`add_path`, `start_draw`, `start_select`,
//! `set_scale`, `undo`, `redo`) or an input event in the same shape the
//! editor deserializes (`{"type": "pointer_down", "x": 0, "y": 0}`). Every
//! event the editor emits is printed as one JSON line; `--svg` prints the
//! final scene as an SVG document instead.
//!
//! Set `RUST_LOG=debug` to trace the session.

use ld_core::{EditorConfig, PathError, Primitive, PrimitiveId, parse_transform, render_svg};
use ld_editor::{DrawEditor, EditorEvent, History, InputEvent};
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
enum ReplayError {
    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("step {step}: {source}")]
    Step { step: usize, source: PathError },
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    config: EditorConfig,
    #[serde(default = "default_scale")]
    scale: f64,
    steps: Vec<Step>,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Command(Command),
    Input(InputEvent),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    /// Put a finished path into the scene.
    AddPath {
        id: String,
        d: String,
        #[serde(default)]
        transform: Option<String>,
    },
    StartDraw {
        #[serde(default)]
        source: Option<String>,
    },
    StartSelect {
        target: String,
    },
    SetScale {
        scale: f64,
    },
    Undo,
    Redo,
}

/// Editor, history and everything the editor reported.
struct Replay {
    editor: DrawEditor,
    history: History,
    events: Vec<EditorEvent>,
}

impl Replay {
    fn new(script: &Script) -> Self {
        let mut editor = DrawEditor::new(script.config.clone());
        editor.set_scale(script.scale);
        Self {
            history: History::new(script.config.history_depth),
            editor,
            events: Vec::new(),
        }
    }

    fn apply(&mut self, step: &Step) -> Result<(), PathError> {
        let events = match step {
            Step::Input(event) => self.editor.handle(event, None),
            Step::Command(command) => self.command(command)?,
        };
        self.history.record(&events);
        for event in &events {
            log::debug!("replay: {event:?}");
        }
        self.events.extend(events);
        Ok(())
    }

    fn command(&mut self, command: &Command) -> Result<Vec<EditorEvent>, PathError> {
        match command {
            Command::AddPath { id, d, transform } => {
                let affine = parse_transform(transform.as_deref().unwrap_or_default())?;
                let config = self.editor.config();
                let path = Primitive::path(PrimitiveId::intern(id), d.as_str())
                    .with_stroke(config.stroke_color.as_str(), config.stroke_width)
                    .with_transform(affine);
                let root = self.editor.scene.root_id();
                self.editor.scene.add(root, path);
                Ok(Vec::new())
            }
            Command::StartDraw { source } => {
                self.editor.start_draw(source.as_deref().map(PrimitiveId::intern))
            }
            Command::StartSelect { target } => {
                self.editor.start_select(PrimitiveId::intern(target))
            }
            Command::SetScale { scale } => {
                self.editor.set_scale(*scale);
                Ok(Vec::new())
            }
            Command::Undo => {
                if let Some(desc) = self.history.undo(&mut self.editor) {
                    log::info!("replay: undo {desc}");
                }
                Ok(Vec::new())
            }
            Command::Redo => {
                if let Some(desc) = self.history.redo(&mut self.editor) {
                    log::info!("replay: redo {desc}");
                }
                Ok(Vec::new())
            }
        }
    }
}

fn replay(script: &Script) -> Result<Replay, ReplayError> {
    let mut replay = Replay::new(script);
    for (step, item) in script.steps.iter().enumerate() {
        replay
            .apply(item)
            .map_err(|source| ReplayError::Step { step, source })?;
    }
    Ok(replay)
}

fn read_script(path: Option<&str>) -> Result<Script, ReplayError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn run(svg: bool, path: Option<&str>) -> Result<(), ReplayError> {
    let script = read_script(path)?;
    let done = replay(&script)?;
    log::info!(
        "replay: {} step(s), {} event(s)",
        script.steps.len(),
        done.events.len()
    );
    if svg {
        print!("{}", render_svg(&done.editor.scene));
    } else {
        for event in &done.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let svg = args.iter().any(|a| a == "--svg");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str);

    if let Err(e) = run(svg, path) {
        eprintln!("ld-replay error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn script(json: &str) -> Script {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn draws_a_triangle() {
        let done = replay(&script(
            r#"{"steps": [
                {"type": "start_draw"},
                {"type": "pointer_down", "x": 0, "y": 0},
                {"type": "pointer_up", "x": 0, "y": 0},
                {"type": "pointer_down", "x": 10, "y": 0},
                {"type": "pointer_up", "x": 10, "y": 0},
                {"type": "pointer_down", "x": 10, "y": 10},
                {"type": "pointer_up", "x": 10, "y": 10},
                {"type": "pointer_down", "x": 0.5, "y": 0.3},
                {"type": "pointer_up", "x": 0.5, "y": 0.3},
                {"type": "complete"}
            ]}"#,
        ))
        .unwrap();

        let Some(EditorEvent::DrawComplete { primitive }) = done.events.last() else {
            panic!("expected DrawComplete, got {:?}", done.events);
        };
        let id = primitive.expect("a drawn path");
        assert_eq!(
            done.editor.scene.path_data(id),
            Some("M 0 0 L 10 0 M 10 0 L 10 10 M 10 10 L 0 0")
        );
        let added = done
            .events
            .iter()
            .filter(|e| matches!(e, EditorEvent::LineAdded(_)))
            .count();
        assert_eq!(added, 3);
    }

    #[test]
    fn undo_steps_go_through_history() {
        let done = replay(&script(
            r#"{"steps": [
                {"type": "start_draw"},
                {"type": "pointer_down", "x": 0, "y": 0},
                {"type": "pointer_up", "x": 0, "y": 0},
                {"type": "pointer_down", "x": 50, "y": 20},
                {"type": "pointer_up", "x": 50, "y": 20},
                {"type": "undo"}
            ]}"#,
        ))
        .unwrap();
        assert_eq!(done.editor.graph().map(|g| g.len()), Some(0));
        assert!(done.history.can_redo());
    }

    #[test]
    fn edits_a_transformed_path() {
        let done = replay(&script(
            r#"{"config": {"attach_space": 4}, "steps": [
                {"type": "add_path", "id": "shape", "d": "M 0 0 L 10 0", "transform": "translate(100 0)"},
                {"type": "start_select", "target": "shape"},
                {"type": "pointer_down", "x": 110, "y": 0},
                {"type": "pointer_move", "x": 110, "y": 20, "dx": 0, "dy": 20, "primary_held": true},
                {"type": "pointer_up", "x": 110, "y": 20},
                {"type": "complete"}
            ]}"#,
        ))
        .unwrap();
        assert_eq!(
            done.editor.scene.path_data(PrimitiveId::intern("shape")),
            Some("M 0 0 L 10 20")
        );
    }

    #[test]
    fn bad_steps_report_their_index() {
        let err = replay(&script(
            r#"{"steps": [
                {"type": "add_path", "id": "arc", "d": "M 0 0 A 1 1 0 0 1 2 2"},
                {"type": "start_select", "target": "arc"}
            ]}"#,
        ))
        .err()
        .unwrap();
        assert!(matches!(err, ReplayError::Step { step: 1, .. }));
    }

    #[test]
    fn events_serialize_as_tagged_json() {
        let line = serde_json::to_string(&EditorEvent::DrawStart { primitive: None }).unwrap();
        assert_eq!(line, r#"{"event":"draw_start","data":{"primitive":null}}"#);
    }
}

//! Input abstraction layer.
//!
//! Pointer and keyboard events as the editor consumes them. Coordinates are
//! in scene space; the editor maps them into the edited path's local frame.

use ld_core::{Point, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Button pressed.
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },

    /// Pointer moved. `dx`/`dy` are the movement since the previous move.
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
        /// Whether the primary button is held.
        #[serde(default)]
        primary_held: bool,
    },

    /// Button released.
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },

    /// Delete key: remove the current selection.
    Delete,

    /// Enter: finish the current draw or edit.
    Complete,

    /// Escape: abandon the current draw or edit.
    Cancel,
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    /// A move with the primary button released.
    pub fn hover(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            primary_held: false,
        }
    }

    /// A move with the primary button held.
    pub fn drag(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            dx,
            dy,
            primary_held: true,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    pub fn delta(&self) -> Vec2 {
        match self {
            Self::PointerMove { dx, dy, .. } => Vec2::new(*dx, *dy),
            _ => Vec2::ZERO,
        }
    }
}

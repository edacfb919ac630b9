//! Path geometry mini-language: `M`/`L`/`H`/`V`/`Q`/`C`/`Z`.
//!
//! The parser is built on `winnow` 0.7 and normalizes everything to absolute
//! commands. The emitter writes the canonical form used for every geometry
//! string this crate produces: single spaces, integral values without a
//! fraction, and the shortest round-trip representation otherwise.

use crate::error::PathError;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// A single absolute path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),         // control, end
    CubicTo(Point, Point, Point), // c1, c2, end
    Close,
}

impl PathCmd {
    /// The point the pen rests on after this command, if it has one.
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => Some(p),
            PathCmd::QuadTo(_, p) | PathCmd::CubicTo(_, _, p) => Some(p),
            PathCmd::Close => None,
        }
    }

    /// Apply `f` to every coordinate of the command.
    pub fn map_points(self, mut f: impl FnMut(Point) -> Point) -> Self {
        match self {
            PathCmd::MoveTo(p) => PathCmd::MoveTo(f(p)),
            PathCmd::LineTo(p) => PathCmd::LineTo(f(p)),
            PathCmd::QuadTo(c, p) => PathCmd::QuadTo(f(c), f(p)),
            PathCmd::CubicTo(c1, c2, p) => PathCmd::CubicTo(f(c1), f(c2), f(p)),
            PathCmd::Close => PathCmd::Close,
        }
    }
}

impl fmt::Display for PathCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCmd::MoveTo(p) => write!(f, "M {}", fmt_point(*p)),
            PathCmd::LineTo(p) => write!(f, "L {}", fmt_point(*p)),
            PathCmd::QuadTo(c, p) => write!(f, "Q {} {}", fmt_point(*c), fmt_point(*p)),
            PathCmd::CubicTo(c1, c2, p) => write!(
                f,
                "C {} {} {}",
                fmt_point(*c1),
                fmt_point(*c2),
                fmt_point(*p)
            ),
            PathCmd::Close => f.write_str("Z"),
        }
    }
}

// ─── Emitter ─────────────────────────────────────────────────────────────

/// Emit commands as a canonical geometry string.
pub fn emit_path_data(cmds: &[PathCmd]) -> String {
    cmds.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a coordinate value for a geometry string.
pub fn format_num(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn fmt_point(p: Point) -> String {
    format!("{} {}", format_num(p.x), format_num(p.y))
}

/// Build a `kurbo::BezPath` from commands, for bounding boxes and rendering.
pub fn to_bez_path(cmds: &[PathCmd]) -> BezPath {
    let mut path = BezPath::new();
    for cmd in cmds {
        match *cmd {
            PathCmd::MoveTo(p) => path.move_to(p),
            PathCmd::LineTo(p) => path.line_to(p),
            PathCmd::QuadTo(c, p) => path.quad_to(c, p),
            PathCmd::CubicTo(c1, c2, p) => path.curve_to(c1, c2, p),
            PathCmd::Close => path.close_path(),
        }
    }
    path
}

// ─── Parser ──────────────────────────────────────────────────────────────

fn separators<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c.is_ascii_whitespace() || c == ',').parse_next(input)
}

fn digits<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn sign(input: &mut &str) -> ModalResult<Option<char>> {
    opt(one_of(['+', '-'])).parse_next(input)
}

fn command_letter(input: &mut &str) -> ModalResult<char> {
    one_of(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E').parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    let start = *input;
    sign(input)?;
    let int_part = digits(input)?;
    let mut frac_len = 0;
    if let Some(rest) = input.strip_prefix('.') {
        *input = rest;
        frac_len = digits(input)?.len();
    }
    if int_part.is_empty() && frac_len == 0 {
        *input = start;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    if let Some(rest) = input.strip_prefix(['e', 'E']) {
        let checkpoint = *input;
        *input = rest;
        sign(input)?;
        if digits(input)?.is_empty() {
            *input = checkpoint;
        }
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn starts_number(input: &str) -> bool {
    input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

struct Cursor<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn offset(&self) -> usize {
        self.source.len() - self.rest.len()
    }

    fn number(&mut self) -> Result<f64, PathError> {
        let _ = separators(&mut self.rest);
        let offset = self.offset();
        let n = parse_number(&mut self.rest).map_err(|_| PathError::InvalidPathData {
            offset,
            reason: "expected a number".to_string(),
        })?;
        if !n.is_finite() {
            return Err(PathError::InvalidPathData {
                offset,
                reason: "number out of range".to_string(),
            });
        }
        Ok(n)
    }

    fn point(&mut self, relative_to: Option<Point>) -> Result<Point, PathError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(match relative_to {
            Some(base) => Point::new(base.x + x, base.y + y),
            None => Point::new(x, y),
        })
    }
}

/// Parse a geometry string into absolute commands.
///
/// # Errors
/// `InvalidPathData` for malformed input, `UnsupportedCommand` for arcs and
/// smooth-curve shorthands.
pub fn parse_path_data(d: &str) -> Result<Vec<PathCmd>, PathError> {
    let mut cur = Cursor { source: d, rest: d };
    let mut cmds = Vec::new();
    let mut current = Point::ZERO;
    let mut subpath_start = Point::ZERO;
    let mut previous: Option<char> = None;

    loop {
        let _ = separators(&mut cur.rest);
        if cur.rest.is_empty() {
            break;
        }
        let offset = cur.offset();
        let letter = match command_letter(&mut cur.rest) {
            Ok(c) => c,
            // Coordinates without a letter repeat the previous command;
            // after a move-to they continue as line-to.
            Err(_) => match previous {
                Some('M') if starts_number(cur.rest) => 'L',
                Some('m') if starts_number(cur.rest) => 'l',
                Some(c) if !matches!(c, 'Z' | 'z') && starts_number(cur.rest) => c,
                _ => {
                    return Err(PathError::InvalidPathData {
                        offset,
                        reason: "expected a path command".to_string(),
                    });
                }
            },
        };

        let relative = letter.is_ascii_lowercase();
        let base = relative.then_some(current);
        let cmd = match letter.to_ascii_uppercase() {
            'M' => {
                let p = cur.point(base)?;
                subpath_start = p;
                PathCmd::MoveTo(p)
            }
            'L' => PathCmd::LineTo(cur.point(base)?),
            'H' => {
                let x = cur.number()?;
                let x = if relative { current.x + x } else { x };
                PathCmd::LineTo(Point::new(x, current.y))
            }
            'V' => {
                let y = cur.number()?;
                let y = if relative { current.y + y } else { y };
                PathCmd::LineTo(Point::new(current.x, y))
            }
            'Q' => {
                let c = cur.point(base)?;
                let p = cur.point(base)?;
                PathCmd::QuadTo(c, p)
            }
            'C' => {
                let c1 = cur.point(base)?;
                let c2 = cur.point(base)?;
                let p = cur.point(base)?;
                PathCmd::CubicTo(c1, c2, p)
            }
            'Z' => PathCmd::Close,
            other => return Err(PathError::UnsupportedCommand(other)),
        };

        current = cmd.end_point().unwrap_or(subpath_start);
        cmds.push(cmd);
        previous = Some(letter);
    }

    Ok(cmds)
}

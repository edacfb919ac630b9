//! Cursor snapping ("attach") against existing endpoints.
//!
//! Pure function of the candidate list and the cursor. The editor gathers
//! candidates from the path graph (and the open gesture), leaves out the
//! point being dragged, and converts the screen-space attach radius into
//! local units before calling in.
//!
//! Resolution order:
//!
//! 1. A candidate within the radius on **both** axes pins the cursor to it
//!    (`attached`). Among several, the smallest single-axis distance wins.
//! 2. Two different candidates each aligned on one axis: the cursor moves to
//!    the crossing of their guides.
//! 3. One aligned candidate: the cursor snaps on that axis only.
//! 4. Otherwise the raw cursor is returned.
//!
//! Exact ties always go to the earliest candidate.

use kurbo::Point;

/// A guide line from `from` (on the resolved cursor) to the aligned
/// endpoint `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Resolved cursor position.
    pub position: Point,
    /// True when `position` is exactly an existing endpoint.
    pub attached: bool,
    /// Vertical guide: a candidate sharing the cursor's x.
    pub guide_x: Option<Guide>,
    /// Horizontal guide: a candidate sharing the cursor's y.
    pub guide_y: Option<Guide>,
}

impl SnapResult {
    /// The unsnapped result.
    pub fn raw(position: Point) -> Self {
        Self {
            position,
            attached: false,
            guide_x: None,
            guide_y: None,
        }
    }
}

/// Best candidate so far on one criterion, keyed by distance.
#[derive(Clone, Copy)]
struct Best {
    point: Point,
    distance: f64,
}

impl Best {
    fn offer(slot: &mut Option<Best>, point: Point, distance: f64) {
        match slot {
            Some(best) if best.distance <= distance => {}
            _ => *slot = Some(Best { point, distance }),
        }
    }
}

/// Resolve `cursor` against `candidates` with radius `attach_space`.
pub fn attach_cursor(
    cursor: Point,
    candidates: impl IntoIterator<Item = Point>,
    attach_space: f64,
) -> SnapResult {
    let mut attach: Option<Best> = None;
    let mut along_x: Option<Best> = None;
    let mut along_y: Option<Best> = None;

    for p in candidates {
        let dx = (cursor.x - p.x).abs();
        let dy = (cursor.y - p.y).abs();
        let near_x = dx <= attach_space;
        let near_y = dy <= attach_space;
        if near_x {
            Best::offer(&mut along_x, p, dx);
        }
        if near_y {
            Best::offer(&mut along_y, p, dy);
        }
        if near_x && near_y {
            Best::offer(&mut attach, p, dx.min(dy));
        }
    }

    if let Some(hit) = attach {
        log::trace!("snap: attached to ({}, {})", hit.point.x, hit.point.y);
        return SnapResult {
            position: hit.point,
            attached: true,
            guide_x: None,
            guide_y: None,
        };
    }

    match (along_x, along_y) {
        (Some(gx), Some(gy)) => {
            let crossing = Point::new(gx.point.x, gy.point.y);
            SnapResult {
                position: crossing,
                attached: false,
                guide_x: Some(Guide {
                    from: crossing,
                    to: gx.point,
                }),
                guide_y: Some(Guide {
                    from: crossing,
                    to: gy.point,
                }),
            }
        }
        (Some(gx), None) => {
            let position = Point::new(gx.point.x, cursor.y);
            SnapResult {
                position,
                attached: false,
                guide_x: Some(Guide {
                    from: position,
                    to: gx.point,
                }),
                guide_y: None,
            }
        }
        (None, Some(gy)) => {
            let position = Point::new(cursor.x, gy.point.y);
            SnapResult {
                position,
                attached: false,
                guide_x: None,
                guide_y: Some(Guide {
                    from: position,
                    to: gy.point,
                }),
            }
        }
        (None, None) => SnapResult::raw(cursor),
    }
}

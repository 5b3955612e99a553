//! Hit-testing and cursor resolution.
//!
//! Pure functions that turn a pointer position and a [`Document`] into "which
//! element, and which part of it, is under the cursor", plus the coordinate
//! math used while moving and resizing the element that was hit.

use crate::canvas::Document;
use crate::shapes::{Coords, Element, ElementPatch};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Half-width of the square around a corner or endpoint that grabs it.
pub const HANDLE_TOLERANCE: f64 = 5.0;
/// Slack allowed by the stretch test on line bodies.
pub const LINE_TOLERANCE: f64 = 1.0;
/// Slack allowed by the stretch test on pen segments.
pub const PEN_TOLERANCE: f64 = 5.0;

/// Hit-test tolerances, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub handle: f64,
    pub line: f64,
    pub pen: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            handle: HANDLE_TOLERANCE,
            line: LINE_TOLERANCE,
            pen: PEN_TOLERANCE,
        }
    }
}

/// Named part of an element under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "inside")]
    Inside,
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "br")]
    BottomRight,
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "end")]
    End,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Inside => "inside",
            Position::TopLeft => "tl",
            Position::TopRight => "tr",
            Position::BottomLeft => "bl",
            Position::BottomRight => "br",
            Position::Start => "start",
            Position::End => "end",
        }
    }

    /// Whether grabbing this position resizes rather than moves.
    pub fn is_handle(self) -> bool {
        self != Position::Inside
    }
}

/// An element found under the cursor, annotated with the part that was hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub element: Element,
    pub position: Position,
}

/// Cursor style token for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Default,
    Move,
    /// Diagonal resize (top-left to bottom-right).
    NwseResize,
    /// Anti-diagonal resize (top-right to bottom-left).
    NeswResize,
}

impl CursorStyle {
    /// CSS cursor keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorStyle::Default => "default",
            CursorStyle::Move => "move",
            CursorStyle::NwseResize => "nwse-resize",
            CursorStyle::NeswResize => "nesw-resize",
        }
    }
}

/// Whether `point` lies in the open square of half-width `tolerance` around `target`.
pub fn near_point(point: Point, target: Point, tolerance: f64) -> bool {
    (point.x - target.x).abs() < tolerance && (point.y - target.y).abs() < tolerance
}

/// How much longer the path a→p→b is than a→b.
///
/// Zero exactly when `p` lies on the segment, growing as `p` strays from it.
pub fn stretch(a: Point, b: Point, p: Point) -> f64 {
    (a.distance(b) - (a.distance(p) + b.distance(p))).abs()
}

/// String-stretch proximity test between `p` and the segment a→b.
pub fn near_segment(a: Point, b: Point, p: Point, tolerance: f64) -> bool {
    stretch(a, b, p) < tolerance
}

/// Find the element under `point`.
///
/// Elements are tried in document order and the first match wins, so among
/// overlapping elements the earliest-drawn one is returned, not the topmost.
pub fn hit_test(point: Point, document: &Document, tolerances: &Tolerances) -> Option<Hit> {
    document.iter().find_map(|element| {
        element.position_at(point, tolerances).map(|position| Hit {
            element: element.clone(),
            position,
        })
    })
}

/// Cursor token for a hit position; `None` means nothing is under the cursor.
pub fn cursor_hint(position: Option<Position>) -> CursorStyle {
    match position {
        Some(Position::TopLeft | Position::BottomRight | Position::Start | Position::End) => {
            CursorStyle::NwseResize
        }
        Some(Position::TopRight | Position::BottomLeft) => CursorStyle::NeswResize,
        Some(Position::Inside) => CursorStyle::Move,
        None => CursorStyle::Default,
    }
}

/// Move the grabbed handle to the pointer, holding the opposite corner or
/// endpoint fixed. Returns `None` for positions that are not handles.
pub fn resize(point: Point, position: Position, coords: Coords) -> Option<Coords> {
    let Coords { x1, y1, x2, y2 } = coords;
    let (x, y) = (point.x, point.y);
    match position {
        Position::TopLeft | Position::Start => Some(Coords::new(x, y, x2, y2)),
        Position::BottomRight | Position::End => Some(Coords::new(x1, y1, x, y)),
        Position::TopRight => Some(Coords::new(x1, y, x, y2)),
        Position::BottomLeft => Some(Coords::new(x, y1, x2, y)),
        Position::Inside => None,
    }
}

/// Pointer-to-anchor vector captured when a move gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub enum GrabOffset {
    /// Offset from `(x1, y1)` of a line or rectangle.
    Anchor(Vec2),
    /// Offset from every sample of a pen stroke.
    Points(Vec<Vec2>),
}

/// Capture the offset between the pointer and the element's anchor(s).
pub fn offset(element: &Element, point: Point) -> GrabOffset {
    match element {
        Element::Pen(pen) => GrabOffset::Points(pen.points.iter().map(|p| point - *p).collect()),
        Element::Line(line) => GrabOffset::Anchor(point - line.coords.start()),
        Element::Rectangle(rect) => GrabOffset::Anchor(point - rect.coords.start()),
    }
}

/// Patch that translates `element` rigidly so its grab offset stays under `point`.
///
/// `element` is the element as it was when the gesture started, so the
/// translation is computed from the original geometry and never drifts.
pub fn moved(element: &Element, grab: &GrabOffset, point: Point) -> Option<ElementPatch> {
    match (element, grab) {
        (Element::Pen(_), GrabOffset::Points(offsets)) => Some(ElementPatch::points(
            offsets.iter().map(|offset| point - *offset).collect(),
        )),
        (Element::Line(_) | Element::Rectangle(_), GrabOffset::Anchor(offset)) => {
            let coords = element.coords()?;
            let anchor = point - *offset;
            Some(ElementPatch::coords(coords.translate(anchor - coords.start())))
        }
        _ => None,
    }
}

//! Element definitions for the drawing surface.

mod line;
mod pen;
mod rectangle;

pub use line::Line;
pub use pen::Pen;
pub use rectangle::Rectangle;

use crate::geometry::{Position, Tolerances};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an element, unique within a document.
pub type ElementId = u64;

/// Element mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("Element not found: {0}")]
    NotFound(ElementId),
    #[error("No element ids left after {0}")]
    IdsExhausted(ElementId),
}

/// Color parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid color: {0}")]
    Invalid(String),
}

/// Serializable color representation (RGBA8).
///
/// Carried on the wire as a `#rrggbb` (or `#rrggbbaa`) hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(color: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::Invalid(color.to_string());
        let hex = color.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match hex.len() {
            3 => Ok(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Format as a lowercase hex string; alpha is only written when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_hex()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke properties shared by every element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
}

impl ElementStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 3.0,
        }
    }
}

/// Two-point coordinates of a line or rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coords {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Coords {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Degenerate coordinates collapsed onto one point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Axis-aligned box spanned by both points.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(
            self.x1 + delta.x,
            self.y1 + delta.y,
            self.x2 + delta.x,
            self.y2 + delta.y,
        )
    }

    fn merge(&mut self, patch: &ElementPatch) {
        if let Some(x1) = patch.x1 {
            self.x1 = x1;
        }
        if let Some(y1) = patch.y1 {
            self.y1 = y1;
        }
        if let Some(x2) = patch.x2 {
            self.x2 = x2;
        }
        if let Some(y2) = patch.y2 {
            self.y2 = y2;
        }
    }
}

/// Partial update merged into an element by [`crate::canvas::Document::update`].
///
/// Lines and rectangles merge the coordinate fields that are set. A pen
/// replaces its path when `points` is set; otherwise a patch carrying both
/// `x2` and `y2` appends that sample to the stroke, so "extend to the pointer"
/// reads the same for every element kind while drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
    pub points: Option<Vec<Point>>,
}

impl ElementPatch {
    /// Extend the element towards a new pointer sample.
    pub fn extend(point: Point) -> Self {
        Self {
            x2: Some(point.x),
            y2: Some(point.y),
            ..Self::default()
        }
    }

    /// Overwrite all four coordinates.
    pub fn coords(coords: Coords) -> Self {
        Self {
            x1: Some(coords.x1),
            y1: Some(coords.y1),
            x2: Some(coords.x2),
            y2: Some(coords.y2),
            points: None,
        }
    }

    /// Replace a pen's path.
    pub fn points(points: Vec<Point>) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }
}

/// Kind of element, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Pen,
    Line,
    Rectangle,
}

impl ElementKind {
    /// Whether the element's coordinates are canonicalized when a draw or
    /// resize gesture ends.
    pub fn needs_normalization(self) -> bool {
        matches!(self, ElementKind::Line | ElementKind::Rectangle)
    }
}

/// One drawable primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Pen(Pen),
    Line(Line),
    Rectangle(Rectangle),
}

impl Element {
    /// Create the element a drawing gesture starts with, anchored at `anchor`.
    pub fn new(kind: ElementKind, id: ElementId, anchor: Point, style: ElementStyle) -> Self {
        match kind {
            ElementKind::Pen => Element::Pen(Pen::new(id, vec![anchor], style)),
            ElementKind::Line => Element::Line(Line::new(id, Coords::at(anchor), style)),
            ElementKind::Rectangle => {
                Element::Rectangle(Rectangle::new(id, Coords::at(anchor), style))
            }
        }
    }

    pub fn id(&self) -> ElementId {
        match self {
            Element::Pen(e) => e.element_id,
            Element::Line(e) => e.element_id,
            Element::Rectangle(e) => e.element_id,
        }
    }

    pub(crate) fn set_id(&mut self, id: ElementId) {
        match self {
            Element::Pen(e) => e.element_id = id,
            Element::Line(e) => e.element_id = id,
            Element::Rectangle(e) => e.element_id = id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Pen(_) => ElementKind::Pen,
            Element::Line(_) => ElementKind::Line,
            Element::Rectangle(_) => ElementKind::Rectangle,
        }
    }

    pub fn style(&self) -> &ElementStyle {
        match self {
            Element::Pen(e) => &e.style,
            Element::Line(e) => &e.style,
            Element::Rectangle(e) => &e.style,
        }
    }

    /// Two-point coordinates; `None` for pen strokes.
    pub fn coords(&self) -> Option<Coords> {
        match self {
            Element::Pen(_) => None,
            Element::Line(e) => Some(e.coords),
            Element::Rectangle(e) => Some(e.coords),
        }
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        match self {
            Element::Pen(e) => e.bounds(),
            Element::Line(e) => e.coords.bounds(),
            Element::Rectangle(e) => e.coords.bounds(),
        }
    }

    /// Named part of the element under `point`, if any.
    pub fn position_at(&self, point: Point, tolerances: &Tolerances) -> Option<Position> {
        match self {
            Element::Pen(e) => e.position_at(point, tolerances.pen),
            Element::Line(e) => e.position_at(point, tolerances.handle, tolerances.line),
            Element::Rectangle(e) => e.position_at(point, tolerances.handle),
        }
    }

    /// Canonical form of the element. Pen strokes are returned unchanged.
    pub fn normalized(&self) -> Element {
        match self {
            Element::Pen(_) => self.clone(),
            Element::Line(e) => Element::Line(e.normalized()),
            Element::Rectangle(e) => Element::Rectangle(e.normalized()),
        }
    }

    pub(crate) fn apply_patch(&mut self, patch: &ElementPatch) {
        match self {
            Element::Pen(e) => {
                if let Some(points) = &patch.points {
                    e.points = points.clone();
                } else if let (Some(x), Some(y)) = (patch.x2, patch.y2) {
                    e.add_point(Point::new(x, y));
                }
            }
            Element::Line(e) => e.coords.merge(patch),
            Element::Rectangle(e) => e.coords.merge(patch),
        }
    }
}

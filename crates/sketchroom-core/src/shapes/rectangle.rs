//! Axis-aligned rectangle outline.

use super::{Coords, ElementId, ElementStyle};
use crate::geometry::{Position, near_point};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// A rectangle spanned by two opposite corners.
///
/// While drawing, `(x1, y1)` is the anchor and `(x2, y2)` follows the
/// pointer, so either corner may be the top-left until the gesture ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub(crate) element_id: ElementId,
    /// Opposite corners.
    #[serde(flatten)]
    pub coords: Coords,
    /// Stroke properties.
    #[serde(flatten)]
    pub style: ElementStyle,
}

impl Rectangle {
    pub fn new(element_id: ElementId, coords: Coords, style: ElementStyle) -> Self {
        Self {
            element_id,
            coords,
            style,
        }
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        self.coords.bounds()
    }

    /// Corner handles win over the interior; edges count as inside.
    pub fn position_at(&self, point: Point, handle: f64) -> Option<Position> {
        let Coords { x1, y1, x2, y2 } = self.coords;
        let corners = [
            (Point::new(x1, y1), Position::TopLeft),
            (Point::new(x2, y1), Position::TopRight),
            (Point::new(x1, y2), Position::BottomLeft),
            (Point::new(x2, y2), Position::BottomRight),
        ];
        if let Some((_, position)) = corners
            .iter()
            .find(|(corner, _)| near_point(point, *corner, handle))
        {
            return Some(*position);
        }

        let rect = self.as_rect();
        let inside =
            point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1;
        inside.then_some(Position::Inside)
    }

    /// Corners reordered so `(x1, y1)` is the top-left.
    pub fn normalized(&self) -> Self {
        let rect = self.as_rect();
        Self {
            coords: Coords::new(rect.x0, rect.y0, rect.x1, rect.y1),
            ..self.clone()
        }
    }

    pub fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }
}

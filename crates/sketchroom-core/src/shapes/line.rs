//! Straight line segment.

use super::{Coords, ElementId, ElementStyle};
use crate::geometry::{Position, near_point, near_segment};
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

/// A line from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub(crate) element_id: ElementId,
    /// Start and end points.
    #[serde(flatten)]
    pub coords: Coords,
    /// Stroke properties.
    #[serde(flatten)]
    pub style: ElementStyle,
}

impl Line {
    pub fn new(element_id: ElementId, coords: Coords, style: ElementStyle) -> Self {
        Self {
            element_id,
            coords,
            style,
        }
    }

    pub fn length(&self) -> f64 {
        self.coords.start().distance(self.coords.end())
    }

    /// Endpoint handles win over the body of the line.
    pub fn position_at(&self, point: Point, handle: f64, tolerance: f64) -> Option<Position> {
        let (start, end) = (self.coords.start(), self.coords.end());
        if near_point(point, start, handle) {
            Some(Position::Start)
        } else if near_point(point, end, handle) {
            Some(Position::End)
        } else if near_segment(start, end, point, tolerance) {
            Some(Position::Inside)
        } else {
            None
        }
    }

    /// Endpoints ordered left to right, then top to bottom on a vertical line.
    pub fn normalized(&self) -> Self {
        let Coords { x1, y1, x2, y2 } = self.coords;
        let coords = if x1 < x2 || (x1 == x2 && y1 < y2) {
            self.coords
        } else {
            Coords::new(x2, y2, x1, y1)
        };
        Self { coords, ..self.clone() }
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.coords.start());
        path.line_to(self.coords.end());
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::new(0, Coords::new(x1, y1, x2, y2), ElementStyle::default())
    }

    #[test]
    fn test_length() {
        assert!((line(0.0, 0.0, 30.0, 40.0).length() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_endpoints_first() {
        let l = line(0.0, 0.0, 100.0, 0.0);
        assert_eq!(l.position_at(Point::new(2.0, 1.0), 5.0, 1.0), Some(Position::Start));
        assert_eq!(l.position_at(Point::new(98.0, -3.0), 5.0, 1.0), Some(Position::End));
        assert_eq!(l.position_at(Point::new(50.0, 0.0), 5.0, 1.0), Some(Position::Inside));
        assert_eq!(l.position_at(Point::new(50.0, 20.0), 5.0, 1.0), None);
    }

    #[test]
    fn test_normalize_swaps_right_to_left() {
        let l = line(30.0, 30.0, 10.0, 0.0).normalized();
        assert_eq!(l.coords, Coords::new(10.0, 0.0, 30.0, 30.0));
    }

    #[test]
    fn test_normalize_vertical() {
        assert_eq!(
            line(5.0, 9.0, 5.0, 1.0).normalized().coords,
            Coords::new(5.0, 1.0, 5.0, 9.0)
        );
        assert_eq!(
            line(5.0, 1.0, 5.0, 9.0).normalized().coords,
            Coords::new(5.0, 1.0, 5.0, 9.0)
        );
    }

    #[test]
    fn test_normalize_keeps_ordered() {
        let l = line(0.0, 50.0, 10.0, 0.0);
        assert_eq!(l.normalized(), l);
    }
}

//! Freehand pen stroke.

use super::{ElementId, ElementStyle};
use crate::geometry::{Position, near_segment};
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand stroke (ordered series of pointer samples).
///
/// Point order is the stroke path, so pens are never normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pen {
    pub(crate) element_id: ElementId,
    /// Samples in the order they were drawn.
    pub points: Vec<Point>,
    /// Stroke properties.
    #[serde(flatten)]
    pub style: ElementStyle,
}

impl Pen {
    pub fn new(element_id: ElementId, points: Vec<Point>, style: ElementStyle) -> Self {
        Self {
            element_id,
            points,
            style,
        }
    }

    /// Add a sample to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |acc, p| {
                acc.union_pt(*p)
            })
    }

    /// `Inside` when the point lies near any consecutive pair of samples.
    pub fn position_at(&self, point: Point, tolerance: f64) -> Option<Position> {
        self.points
            .windows(2)
            .any(|w| near_segment(w[0], w[1], point, tolerance))
            .then_some(Position::Inside)
    }

    /// Polyline through every sample.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.points.first() else {
            return path;
        };
        path.move_to(*first);
        for point in self.points.iter().skip(1) {
            path.line_to(*point);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f64, f64)]) -> Pen {
        Pen::new(
            0,
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            ElementStyle::default(),
        )
    }

    #[test]
    fn test_bounds() {
        let pen = stroke(&[(0.0, 0.0), (100.0, 50.0), (50.0, 100.0)]);
        assert_eq!(pen.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(stroke(&[]).bounds(), Rect::ZERO);
    }

    #[test]
    fn test_position_near_segment() {
        let pen = stroke(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
        assert_eq!(pen.position_at(Point::new(50.0, 0.0), 5.0), Some(Position::Inside));
        assert_eq!(pen.position_at(Point::new(100.0, 60.0), 5.0), Some(Position::Inside));
        assert_eq!(pen.position_at(Point::new(50.0, 40.0), 5.0), None);
    }

    #[test]
    fn test_single_sample_never_hit() {
        let pen = stroke(&[(10.0, 10.0)]);
        assert_eq!(pen.position_at(Point::new(10.0, 10.0), 5.0), None);
    }

    #[test]
    fn test_to_path() {
        let pen = stroke(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
        assert_eq!(pen.to_path().elements().len(), 3);
        assert!(stroke(&[]).to_path().elements().is_empty());
    }
}

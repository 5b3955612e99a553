//! Draw-command generation for renderers.
//!
//! Painting itself happens elsewhere; this module only turns a [`Document`]
//! into styled paths in paint order.

use crate::canvas::Document;
use crate::shapes::Element;
use kurbo::{BezPath, Cap, Join, Rect, Stroke};
use peniko::Color;

/// One stroked path, ready to paint.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub path: BezPath,
    pub color: Color,
    pub stroke: Stroke,
}

impl DrawCommand {
    fn new(path: BezPath, element: &Element, cap: Cap) -> Self {
        let style = element.style();
        Self {
            path,
            color: style.stroke(),
            stroke: Stroke::new(style.stroke_width)
                .with_caps(cap)
                .with_join(Join::Round),
        }
    }
}

/// Draw commands for every element visible in `viewport`, back to front.
///
/// Culling uses bounds inflated by half the stroke width so thick strokes
/// at the viewport edge are kept.
pub fn draw_commands(document: &Document, viewport: Rect) -> Vec<DrawCommand> {
    document
        .iter()
        .filter(|element| {
            let half = element.style().stroke_width / 2.0;
            let bounds = element.bounds().inflate(half, half);
            bounds.x0 <= viewport.x1
                && bounds.x1 >= viewport.x0
                && bounds.y0 <= viewport.y1
                && bounds.y1 >= viewport.y0
        })
        .map(draw_element)
        .collect()
}

/// Draw command for a single element.
pub fn draw_element(element: &Element) -> DrawCommand {
    match element {
        Element::Pen(pen) => DrawCommand::new(pen.to_path(), element, Cap::Round),
        Element::Line(line) => DrawCommand::new(line.to_path(), element, Cap::Butt),
        Element::Rectangle(rect) => DrawCommand::new(rect.to_path(), element, Cap::Butt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Coords, ElementStyle, Line, Pen, Rectangle, SerializableColor};
    use kurbo::Point;

    fn sample() -> Document {
        let pink = ElementStyle {
            stroke_color: SerializableColor::new(0xe9, 0x1e, 0x63, 255),
            stroke_width: 4.0,
        };
        Document::from_elements(vec![
            Element::Rectangle(Rectangle::new(0, Coords::new(0.0, 0.0, 50.0, 50.0), pink)),
            Element::Line(Line::new(
                1,
                Coords::new(500.0, 500.0, 600.0, 600.0),
                ElementStyle::default(),
            )),
            Element::Pen(Pen::new(
                2,
                vec![Point::new(10.0, 10.0), Point::new(20.0, 25.0)],
                ElementStyle::default(),
            )),
        ])
    }

    #[test]
    fn test_paint_order_and_culling() {
        let commands = draw_commands(&sample(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].stroke.width, 4.0);
        assert_eq!(commands[1].stroke.start_cap, Cap::Round);
    }

    #[test]
    fn test_colors_carried() {
        let commands = draw_commands(&sample(), Rect::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].color, Color::from_rgba8(0xe9, 0x1e, 0x63, 255));
        assert_eq!(commands[1].color, Color::from_rgba8(0, 0, 0, 255));
    }

    #[test]
    fn test_stroke_edge_kept() {
        let doc = Document::from_elements(vec![Element::Line(Line::new(
            0,
            Coords::new(0.0, 101.0, 50.0, 101.0),
            ElementStyle::default(),
        ))]);
        let commands = draw_commands(&doc, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert!(draw_commands(&Document::new(), Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }
}

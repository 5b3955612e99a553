//! Tool selection and stroke settings.

use crate::geometry::Tolerances;
use crate::shapes::{ElementKind, ElementStyle, SerializableColor};
use serde::{Deserialize, Serialize};

/// Thinnest selectable stroke.
pub const MIN_STROKE_WIDTH: f64 = 1.0;
/// Thickest selectable stroke.
pub const MAX_STROKE_WIDTH: f64 = 20.0;
/// Stroke width new sessions start with.
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;

/// Stroke colors offered by the options palette, as hex strings.
pub const STROKE_PALETTE: [(&str, &str); 5] = [
    ("black", "#000000"),
    ("pink", "#e91e63"),
    ("yellow", "#ffc107"),
    ("blue", "#00bcd4"),
    ("peach", "#FF677D"),
];

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Line,
    Rectangle,
    Eraser,
    Select,
}

impl ToolKind {
    /// Element kind created by a drawing tool; `None` for eraser and select.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            ToolKind::Pen => Some(ElementKind::Pen),
            ToolKind::Line => Some(ElementKind::Line),
            ToolKind::Rectangle => Some(ElementKind::Rectangle),
            ToolKind::Eraser | ToolKind::Select => None,
        }
    }

    pub fn is_drawing(self) -> bool {
        self.element_kind().is_some()
    }
}

/// Shared UI context read by the interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    /// Currently selected tool.
    pub tool: ToolKind,
    /// Style applied to newly drawn elements.
    pub style: ElementStyle,
    /// Hit-test slack used by select and eraser.
    pub tolerances: Tolerances,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            style: ElementStyle {
                stroke_color: SerializableColor::black(),
                stroke_width: DEFAULT_STROKE_WIDTH,
            },
            tolerances: Tolerances::default(),
        }
    }
}

impl ToolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stroke_color(&mut self, color: SerializableColor) {
        self.style.stroke_color = color;
    }

    /// Set the stroke width, clamped to the selectable range.
    pub fn set_stroke_width(&mut self, width: f64) {
        self.style.stroke_width = if width.is_finite() {
            width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
        } else {
            DEFAULT_STROKE_WIDTH
        };
    }
}

/// Parsed palette colors, in display order.
pub fn palette() -> Vec<(&'static str, SerializableColor)> {
    STROKE_PALETTE
        .iter()
        .filter_map(|(name, hex)| SerializableColor::from_hex(hex).ok().map(|c| (*name, c)))
        .collect()
}

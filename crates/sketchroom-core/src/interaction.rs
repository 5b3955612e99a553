//! Pointer-driven interaction state machine.
//!
//! Turns pointer-down/move/up into element mutations. Every gesture opens one
//! undo entry on pointer-down and coalesces everything after it into that
//! entry, so a whole drag undoes in one step. Erasing is the exception: each
//! removal is its own entry and its own broadcast.

use crate::canvas::{Document, IdAllocator};
use crate::geometry::{self, CursorStyle, GrabOffset, Position};
use crate::history::History;
use crate::shapes::{Element, ElementId, ElementKind, ElementPatch};
use crate::tools::{ToolKind, ToolSettings};
use kurbo::Point;

/// Observable interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing,
    Moving,
    Resizing,
    Erasing,
}

/// The element grabbed by a select gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedElement {
    /// The element as it was when the gesture started.
    pub element: Element,
    /// Part of the element that was grabbed.
    pub position: Position,
    /// Pointer-to-anchor offset captured at pointer-down.
    pub offset: GrabOffset,
}

impl SelectedElement {
    pub fn id(&self) -> ElementId {
        self.element.id()
    }
}

/// Outcome of feeding one event to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputResponse {
    /// Cursor the presentation layer should show.
    pub cursor: CursorStyle,
    /// Whether the Document should be published to the room.
    pub broadcast: bool,
    /// Whether the Document changed.
    pub changed: bool,
}

impl InputResponse {
    fn cursor(cursor: CursorStyle) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    fn with_broadcast(mut self) -> Self {
        self.broadcast = true;
        self
    }

    fn with_change(mut self, changed: bool) -> Self {
        self.changed |= changed;
        self
    }
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Drawing {
        id: ElementId,
        kind: ElementKind,
    },
    Moving(SelectedElement),
    Resizing(SelectedElement),
    Erasing,
}

/// Interaction state machine.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    gesture: Gesture,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        match self.gesture {
            Gesture::Idle => InteractionState::Idle,
            Gesture::Drawing { .. } => InteractionState::Drawing,
            Gesture::Moving(_) => InteractionState::Moving,
            Gesture::Resizing(_) => InteractionState::Resizing,
            Gesture::Erasing => InteractionState::Erasing,
        }
    }

    /// Element held by the current move or resize gesture.
    pub fn selected(&self) -> Option<&SelectedElement> {
        match &self.gesture {
            Gesture::Moving(selected) | Gesture::Resizing(selected) => Some(selected),
            _ => None,
        }
    }

    /// Id of the element being drawn, moved or resized.
    pub fn active_element(&self) -> Option<ElementId> {
        match &self.gesture {
            Gesture::Drawing { id, .. } => Some(*id),
            Gesture::Moving(selected) | Gesture::Resizing(selected) => Some(selected.id()),
            Gesture::Idle | Gesture::Erasing => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn pointer_down(
        &mut self,
        point: Point,
        settings: &ToolSettings,
        history: &mut History,
        ids: &mut IdAllocator,
    ) -> InputResponse {
        match settings.tool {
            ToolKind::Eraser => {
                self.gesture = Gesture::Erasing;
                InputResponse::default()
            }
            ToolKind::Select => {
                let document = history.present().clone();
                let Some(hit) = geometry::hit_test(point, &document, &settings.tolerances) else {
                    return InputResponse::default();
                };

                let selected = SelectedElement {
                    offset: geometry::offset(&hit.element, point),
                    position: hit.position,
                    element: hit.element,
                };
                let cursor = geometry::cursor_hint(Some(selected.position));
                self.gesture = if selected.position.is_handle() {
                    Gesture::Resizing(selected)
                } else {
                    Gesture::Moving(selected)
                };

                // Opens the undo entry the rest of the drag coalesces into.
                history.push(document, false);
                InputResponse::cursor(cursor)
            }
            ToolKind::Pen => self.begin_drawing(ElementKind::Pen, point, settings, history, ids),
            ToolKind::Line => self.begin_drawing(ElementKind::Line, point, settings, history, ids),
            ToolKind::Rectangle => {
                self.begin_drawing(ElementKind::Rectangle, point, settings, history, ids)
            }
        }
    }

    fn begin_drawing(
        &mut self,
        kind: ElementKind,
        point: Point,
        settings: &ToolSettings,
        history: &mut History,
        ids: &mut IdAllocator,
    ) -> InputResponse {
        let id = match ids.allocate(history.present()) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Cannot start a new {:?}: {}", kind, err);
                return InputResponse::default();
            }
        };
        let element = Element::new(kind, id, point, settings.style);
        history.push(history.present().append_with_id(element), false);
        self.gesture = Gesture::Drawing { id, kind };
        InputResponse::default().with_change(true)
    }

    pub fn pointer_move(
        &mut self,
        point: Point,
        settings: &ToolSettings,
        history: &mut History,
    ) -> InputResponse {
        let (id, patch, cursor) = match &self.gesture {
            Gesture::Idle => {
                return InputResponse::cursor(self.hover(point, settings, history.present()));
            }
            Gesture::Erasing => return self.erase_at(point, settings, history),
            Gesture::Drawing { id, .. } => (*id, Some(ElementPatch::extend(point)), CursorStyle::Default),
            Gesture::Moving(selected) => (
                selected.id(),
                geometry::moved(&selected.element, &selected.offset, point),
                CursorStyle::Move,
            ),
            Gesture::Resizing(selected) => (
                selected.id(),
                selected
                    .element
                    .coords()
                    .and_then(|coords| geometry::resize(point, selected.position, coords))
                    .map(ElementPatch::coords),
                geometry::cursor_hint(Some(selected.position)),
            ),
        };

        let Some(patch) = patch else {
            return InputResponse::cursor(cursor);
        };
        match history.present().update(id, &patch) {
            Ok(updated) => {
                history.push(updated, true);
                InputResponse::cursor(cursor).with_change(true)
            }
            Err(err) => {
                log::debug!("Abandoning gesture: {}", err);
                self.gesture = Gesture::Idle;
                InputResponse::default()
            }
        }
    }

    pub fn pointer_up(&mut self, history: &mut History) -> InputResponse {
        let gesture = std::mem::take(&mut self.gesture);
        let normalize = match &gesture {
            Gesture::Idle | Gesture::Erasing => return InputResponse::default(),
            Gesture::Drawing { id, kind } => kind.needs_normalization().then_some(*id),
            Gesture::Resizing(selected) => selected
                .element
                .kind()
                .needs_normalization()
                .then(|| selected.id()),
            Gesture::Moving(_) => None,
        };

        let response = InputResponse::default().with_broadcast();
        let Some(id) = normalize else {
            return response;
        };
        match history.present().normalize(id) {
            Ok(normalized) => {
                let changed = &normalized != history.present();
                history.push(normalized, true);
                response.with_change(changed)
            }
            Err(err) => {
                log::debug!("Element vanished before normalization: {}", err);
                response
            }
        }
    }

    /// Cursor hint for an idle pointer, shown only by the select tool.
    pub fn hover(&self, point: Point, settings: &ToolSettings, document: &Document) -> CursorStyle {
        if settings.tool != ToolKind::Select || !self.is_idle() {
            return CursorStyle::Default;
        }
        let hit = geometry::hit_test(point, document, &settings.tolerances);
        geometry::cursor_hint(hit.map(|h| h.position))
    }

    fn erase_at(&self, point: Point, settings: &ToolSettings, history: &mut History) -> InputResponse {
        let document = history.present();
        let target = geometry::hit_test(point, document, &settings.tolerances)
            .filter(|hit| hit.position == Position::Inside)
            .map(|hit| hit.element.id());
        let Some(id) = target else {
            return InputResponse::default();
        };

        log::debug!("Erasing element {}", id);
        let erased = document.remove(id);
        history.push(erased, false);
        InputResponse::default().with_change(true).with_broadcast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Coords, ElementStyle, Rectangle};

    struct Rig {
        interaction: Interaction,
        settings: ToolSettings,
        history: History,
        ids: IdAllocator,
    }

    impl Rig {
        fn new(tool: ToolKind) -> Self {
            let settings = ToolSettings {
                tool,
                ..ToolSettings::default()
            };
            Self {
                interaction: Interaction::new(),
                settings,
                history: History::default(),
                ids: IdAllocator::default(),
            }
        }

        fn with_document(tool: ToolKind, document: Document) -> Self {
            let mut rig = Self::new(tool);
            rig.history = History::new(document);
            rig
        }

        fn down(&mut self, x: f64, y: f64) -> InputResponse {
            self.interaction.pointer_down(
                Point::new(x, y),
                &self.settings,
                &mut self.history,
                &mut self.ids,
            )
        }

        fn drag(&mut self, x: f64, y: f64) -> InputResponse {
            self.interaction
                .pointer_move(Point::new(x, y), &self.settings, &mut self.history)
        }

        fn up(&mut self) -> InputResponse {
            self.interaction.pointer_up(&mut self.history)
        }

        fn doc(&self) -> &Document {
            self.history.present()
        }
    }

    fn rect(id: ElementId, x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
        Element::Rectangle(Rectangle::new(
            id,
            Coords::new(x1, y1, x2, y2),
            ElementStyle::default(),
        ))
    }

    #[test]
    fn test_draw_rectangle_normalizes_on_up() {
        let mut rig = Rig::new(ToolKind::Rectangle);
        rig.down(50.0, 40.0);
        assert_eq!(rig.interaction.state(), InteractionState::Drawing);
        rig.drag(30.0, 20.0);
        rig.drag(10.0, 5.0);

        // Not normalized mid-gesture.
        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(50.0, 40.0, 10.0, 5.0))
        );

        let response = rig.up();
        assert!(response.broadcast);
        assert_eq!(rig.interaction.state(), InteractionState::Idle);
        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(10.0, 5.0, 50.0, 40.0))
        );
    }

    #[test]
    fn test_draw_is_one_undo_step() {
        let mut rig = Rig::new(ToolKind::Pen);
        rig.down(0.0, 0.0);
        for i in 1..20 {
            rig.drag(i as f64, i as f64);
        }
        rig.up();
        assert_eq!(rig.history.past_len(), 1);

        let Some(Element::Pen(pen)) = rig.doc().get(0).cloned() else {
            panic!("expected a pen stroke");
        };
        assert_eq!(pen.points.len(), 20);

        assert!(rig.history.undo());
        assert!(rig.doc().is_empty());
    }

    #[test]
    fn test_line_endpoints_swapped_on_up() {
        let mut rig = Rig::new(ToolKind::Line);
        rig.down(40.0, 0.0);
        rig.drag(0.0, 10.0);
        rig.up();
        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(0.0, 10.0, 40.0, 0.0))
        );
    }

    #[test]
    fn test_select_miss_stays_idle() {
        let mut rig = Rig::with_document(
            ToolKind::Select,
            Document::from_elements(vec![rect(0, 10.0, 10.0, 20.0, 20.0)]),
        );
        rig.down(100.0, 100.0);
        assert_eq!(rig.interaction.state(), InteractionState::Idle);
        assert!(!rig.history.can_undo());
        assert!(!rig.up().broadcast);
    }

    #[test]
    fn test_move_translates_rigidly() {
        let mut rig = Rig::with_document(
            ToolKind::Select,
            Document::from_elements(vec![rect(0, 10.0, 10.0, 30.0, 30.0)]),
        );
        let down = rig.down(20.0, 20.0);
        assert_eq!(down.cursor, CursorStyle::Move);
        assert_eq!(rig.interaction.state(), InteractionState::Moving);

        rig.drag(25.0, 22.0);
        rig.drag(70.0, 60.0);
        rig.up();

        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(60.0, 50.0, 80.0, 70.0))
        );
        assert_eq!(rig.history.past_len(), 1);
    }

    #[test]
    fn test_resize_from_corner_then_normalize() {
        let mut rig = Rig::with_document(
            ToolKind::Select,
            Document::from_elements(vec![rect(0, 0.0, 0.0, 10.0, 10.0)]),
        );
        let down = rig.down(10.0, 10.0);
        assert_eq!(down.cursor, CursorStyle::NwseResize);
        assert_eq!(rig.interaction.state(), InteractionState::Resizing);

        rig.drag(20.0, 30.0);
        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(0.0, 0.0, 20.0, 30.0))
        );

        // Drag the corner past the opposite one.
        rig.drag(-5.0, -8.0);
        rig.up();
        assert_eq!(
            rig.doc().get(0).and_then(|e| e.coords()),
            Some(Coords::new(-5.0, -8.0, 0.0, 0.0))
        );
    }

    #[test]
    fn test_erase_streams_deletions() {
        let mut rig = Rig::with_document(
            ToolKind::Eraser,
            Document::from_elements(vec![
                rect(0, 0.0, 0.0, 20.0, 20.0),
                rect(1, 100.0, 100.0, 120.0, 120.0),
            ]),
        );
        rig.down(0.0, 0.0);
        assert_eq!(rig.interaction.state(), InteractionState::Erasing);
        assert!(rig.doc().len() == 2);

        let first = rig.drag(10.0, 10.0);
        assert!(first.broadcast);
        let miss = rig.drag(50.0, 50.0);
        assert!(!miss.broadcast);
        let second = rig.drag(110.0, 110.0);
        assert!(second.broadcast);

        assert!(rig.doc().is_empty());
        assert_eq!(rig.history.past_len(), 2);
        assert!(!rig.up().broadcast);
    }

    #[test]
    fn test_eraser_ignores_handles() {
        let mut rig = Rig::with_document(
            ToolKind::Eraser,
            Document::from_elements(vec![rect(0, 0.0, 0.0, 20.0, 20.0)]),
        );
        rig.down(0.0, 0.0);
        rig.drag(1.0, 1.0);
        assert_eq!(rig.doc().len(), 1);
    }

    #[test]
    fn test_gesture_abandoned_when_element_disappears() {
        let mut rig = Rig::new(ToolKind::Rectangle);
        rig.down(0.0, 0.0);
        rig.history.replace_present(Document::new());

        let response = rig.drag(10.0, 10.0);
        assert!(!response.changed);
        assert_eq!(rig.interaction.state(), InteractionState::Idle);
        assert!(rig.doc().is_empty());
    }

    #[test]
    fn test_hover_hint_only_for_select() {
        let doc = Document::from_elements(vec![rect(0, 0.0, 0.0, 20.0, 20.0)]);
        let mut rig = Rig::with_document(ToolKind::Select, doc.clone());
        assert_eq!(rig.drag(20.0, 0.0).cursor, CursorStyle::NeswResize);
        assert_eq!(rig.drag(10.0, 10.0).cursor, CursorStyle::Move);
        assert_eq!(rig.drag(50.0, 50.0).cursor, CursorStyle::Default);

        rig.settings.tool = ToolKind::Pen;
        assert_eq!(rig.drag(10.0, 10.0).cursor, CursorStyle::Default);
    }
}

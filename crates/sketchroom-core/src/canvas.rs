//! Canvas document and session state.

use crate::geometry::CursorStyle;
use crate::history::History;
use crate::input::{KeyCommand, PointerEvent};
use crate::interaction::{InputResponse, Interaction, InteractionState};
use crate::shapes::{Element, ElementError, ElementId, ElementPatch};
use crate::tools::{ToolKind, ToolSettings};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An ordered, immutable collection of elements.
///
/// Order is paint order and hit-test priority. Every mutation returns a new
/// Document; clones share storage, so history snapshots are cheap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    elements: Arc<Vec<Element>>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }

    /// Id the next appended element receives: one past the largest id, or 0.
    pub fn next_id(&self) -> Result<ElementId, ElementError> {
        match self.elements.iter().map(Element::id).max() {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or(ElementError::IdsExhausted(max)),
        }
    }

    /// Append `element` under the next free id.
    pub fn append(&self, mut element: Element) -> Result<(Document, ElementId), ElementError> {
        let id = self.next_id()?;
        element.set_id(id);
        Ok((self.append_with_id(element), id))
    }

    /// Append `element` keeping the id it already carries.
    pub(crate) fn append_with_id(&self, element: Element) -> Document {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend(self.elements.iter().cloned());
        elements.push(element);
        Self::from_elements(elements)
    }

    /// Merge `patch` into the element with `id`.
    pub fn update(&self, id: ElementId, patch: &ElementPatch) -> Result<Document, ElementError> {
        self.map_element(id, |element| element.apply_patch(patch))
    }

    /// Replace the element with `id` by its normalized form.
    pub fn normalize(&self, id: ElementId) -> Result<Document, ElementError> {
        self.map_element(id, |element| *element = element.normalized())
    }

    /// Drop the element with `id`. Unknown ids leave the document as is.
    pub fn remove(&self, id: ElementId) -> Document {
        if self.position_of(id).is_none() {
            return self.clone();
        }
        Self::from_elements(
            self.elements
                .iter()
                .filter(|element| element.id() != id)
                .cloned()
                .collect(),
        )
    }

    fn map_element(
        &self,
        id: ElementId,
        f: impl FnOnce(&mut Element),
    ) -> Result<Document, ElementError> {
        let index = self.position_of(id).ok_or(ElementError::NotFound(id))?;
        let mut elements = self.elements.as_ref().clone();
        f(&mut elements[index]);
        Ok(Self::from_elements(elements))
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| element.id() == id)
    }

    /// Index of the element with `id` in paint order.
    pub fn position_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|element| element.id() == id)
    }

    /// Elements in paint order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Bounding box of all elements.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements
            .iter()
            .map(Element::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl FromIterator<Element> for Document {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self::from_elements(iter.into_iter().collect())
    }
}

/// Issues element ids for one client session.
///
/// Follows the document's `max + 1` rule, but never hands out an id at or
/// below one it has already issued, so removing the newest element does not
/// recycle its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdAllocator {
    issued: Option<ElementId>,
}

impl IdAllocator {
    pub fn allocate(&mut self, document: &Document) -> Result<ElementId, ElementError> {
        let floor = match self.issued {
            None => 0,
            Some(id) => id.checked_add(1).ok_or(ElementError::IdsExhausted(id))?,
        };
        let id = document.next_id()?.max(floor);
        self.issued = Some(id);
        Ok(id)
    }

    /// Take ids present in `document` into account, e.g. after a remote load.
    pub fn observe(&mut self, document: &Document) {
        if let Some(max) = document.iter().map(Element::id).max() {
            self.issued = Some(self.issued.map_or(max, |id| id.max(max)));
        }
    }
}

/// One participant's drawing session.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    history: History,
    interaction: Interaction,
    /// Current tool and stroke settings.
    pub settings: ToolSettings,
    ids: IdAllocator,
}

impl Canvas {
    /// Create a new canvas with an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Document) -> Self {
        let mut canvas = Self::new();
        canvas.load_document(document);
        canvas
    }

    /// Use a bounded undo history.
    pub fn with_history(history: History) -> Self {
        let mut ids = IdAllocator::default();
        ids.observe(history.present());
        Self {
            history,
            ids,
            ..Self::default()
        }
    }

    /// The document currently displayed.
    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> InteractionState {
        self.interaction.state()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn tool(&self) -> ToolKind {
        self.settings.tool
    }

    /// Switch tools. A gesture in progress is finished first.
    pub fn set_tool(&mut self, tool: ToolKind) -> InputResponse {
        let response = self.interaction.pointer_up(&mut self.history);
        self.settings.tool = tool;
        response
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputResponse {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { .. } => self.pointer_up(),
        }
    }

    pub fn pointer_down(&mut self, point: Point) -> InputResponse {
        self.interaction
            .pointer_down(point, &self.settings, &mut self.history, &mut self.ids)
    }

    pub fn pointer_move(&mut self, point: Point) -> InputResponse {
        self.interaction
            .pointer_move(point, &self.settings, &mut self.history)
    }

    pub fn pointer_up(&mut self) -> InputResponse {
        self.interaction.pointer_up(&mut self.history)
    }

    /// Cursor for the pointer resting at `point`.
    pub fn hover(&self, point: Point) -> CursorStyle {
        self.interaction.hover(point, &self.settings, self.document())
    }

    /// Step back one entry. A gesture in progress is finished first, so the
    /// undo never lands between two of its samples.
    pub fn undo(&mut self) -> InputResponse {
        let finished = self.interaction.pointer_up(&mut self.history);
        let changed = self.history.undo();
        Self::history_response(finished, changed)
    }

    pub fn redo(&mut self) -> InputResponse {
        let finished = self.interaction.pointer_up(&mut self.history);
        let changed = self.history.redo();
        Self::history_response(finished, changed)
    }

    /// Apply a keyboard shortcut. Held keys repeat the command each time.
    pub fn apply_key(&mut self, command: KeyCommand) -> InputResponse {
        match command {
            KeyCommand::Undo => self.undo(),
            KeyCommand::Redo => self.redo(),
        }
    }

    /// Replace the document with one received from a peer.
    ///
    /// Not undoable: past and future are kept. A gesture in progress keeps
    /// going against the new document if its element is still there.
    pub fn replace_document(&mut self, document: Document) {
        log::debug!("Replacing document with {} remote elements", document.len());
        self.ids.observe(&document);
        self.history.replace_present(document);
    }

    /// Start over from a room's initial state.
    pub fn load_document(&mut self, document: Document) {
        log::debug!("Loading document with {} elements", document.len());
        self.ids.observe(&document);
        self.interaction = Interaction::new();
        self.history.reset(document);
    }

    fn history_response(finished: InputResponse, changed: bool) -> InputResponse {
        InputResponse {
            cursor: CursorStyle::Default,
            broadcast: finished.broadcast || changed,
            changed: finished.changed || changed,
        }
    }
}

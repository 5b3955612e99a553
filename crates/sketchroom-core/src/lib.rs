//! Sketchroom Core Library
//!
//! Platform-agnostic engine beneath a shared drawing surface: the element
//! model, hit-testing, undo/redo history, the pointer interaction state
//! machine and the relay sync client.

pub mod canvas;
pub mod collaboration;
pub mod geometry;
pub mod history;
pub mod input;
pub mod interaction;
pub mod render;
pub mod room;
pub mod shapes;
pub mod sync;
pub mod tools;

pub use canvas::{Canvas, Document, IdAllocator};
pub use collaboration::CollaborationManager;
pub use geometry::{CursorStyle, Hit, Position, Tolerances, cursor_hint, hit_test, resize};
pub use history::History;
pub use input::{KeyCommand, Modifiers, PointerEvent};
pub use interaction::{InputResponse, InteractionState};
pub use render::{DrawCommand, draw_commands};
pub use room::{RoomId, RoomRoute, resolve_room};
pub use shapes::{Element, ElementError, ElementId, ElementKind, ElementPatch, ElementStyle};
pub use sync::{ClientMessage, ConnectionState, ServerMessage, SyncError, SyncEvent, Transport};
#[cfg(not(target_arch = "wasm32"))]
pub use sync::NativeWebSocket;
pub use tools::{ToolKind, ToolSettings};

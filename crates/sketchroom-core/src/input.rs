//! Pointer and keyboard input events.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
}

/// Primary-button pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => *position,
        }
    }
}

/// Keyboard shortcut understood by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCommand {
    Undo,
    Redo,
}

impl KeyCommand {
    /// Resolve a key press. Ctrl+Z undoes and Ctrl+Y redoes; key names are
    /// matched case-insensitively so Caps Lock does not matter.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        if !modifiers.ctrl {
            return None;
        }
        if key.eq_ignore_ascii_case("z") {
            Some(KeyCommand::Undo)
        } else if key.eq_ignore_ascii_case("y") {
            Some(KeyCommand::Redo)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcuts() {
        assert_eq!(KeyCommand::from_key("z", Modifiers::CTRL), Some(KeyCommand::Undo));
        assert_eq!(KeyCommand::from_key("Z", Modifiers::CTRL), Some(KeyCommand::Undo));
        assert_eq!(KeyCommand::from_key("y", Modifiers::CTRL), Some(KeyCommand::Redo));
        assert_eq!(KeyCommand::from_key("x", Modifiers::CTRL), None);
        assert_eq!(KeyCommand::from_key("z", Modifiers::default()), None);
    }

    #[test]
    fn test_pointer_position() {
        let event = PointerEvent::Move {
            position: Point::new(3.0, 4.0),
        };
        assert_eq!(event.position(), Point::new(3.0, 4.0));
    }
}

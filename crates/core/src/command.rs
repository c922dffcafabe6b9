//! Keyboard commands
//!
//! Key events are resolved into an explicit [`Command`] by a pure function; the
//! session then matches on the command. Nothing here touches state.

use crate::annotation::AnnotationType;
use crate::store::DocumentId;

/// Key identity, independent of any windowing toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character as produced by the keyboard layout
    Char(char),
    Delete,
    Backspace,
    Escape,
    /// Any key with no binding; hosts map unrecognised keys here
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command key on macOS; treated like ctrl
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false, alt: false, meta: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false, alt: false, meta: false };
    pub const CTRL_SHIFT: Modifiers = Modifiers { ctrl: true, shift: true, alt: false, meta: false };

    /// Ctrl or Meta
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// One key press as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Focus is inside a text field (style panel, sticky note editor)
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            in_text_input: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }

    /// Same event with focus in a text field
    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// Engine action a host can dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetTool(AnnotationType),
    Undo,
    Redo,
    DeleteSelected,
    Copy,
    Cut,
    Paste,
    SelectAll,
    BringToFront,
    SendToBack,
    /// Abort any gesture, clear the selection and return to the select tool
    Escape,
    SetPage(u32),
    OpenDocument(DocumentId),
}

/// Map a key event to a command.
///
/// Returns `None` while focus is in a text input so typing is never intercepted.
pub fn resolve_command(event: &KeyEvent) -> Option<Command> {
    if event.in_text_input {
        return None;
    }
    let modifiers = event.modifiers;

    match event.key {
        Key::Escape => Some(Command::Escape),
        Key::Delete | Key::Backspace if !modifiers.command() => Some(Command::DeleteSelected),
        Key::Char(c) if modifiers.command() => match c.to_ascii_lowercase() {
            'z' if modifiers.shift => Some(Command::Redo),
            'z' => Some(Command::Undo),
            'y' => Some(Command::Redo),
            'c' => Some(Command::Copy),
            'x' => Some(Command::Cut),
            'v' => Some(Command::Paste),
            'a' => Some(Command::SelectAll),
            ']' | '}' => Some(Command::BringToFront),
            '[' | '{' => Some(Command::SendToBack),
            _ => None,
        },
        Key::Char(c) if !modifiers.alt => tool_for_key(c).map(Command::SetTool),
        _ => None,
    }
}

/// Single-letter tool shortcuts
fn tool_for_key(c: char) -> Option<AnnotationType> {
    let tool = match c.to_ascii_lowercase() {
        'p' => AnnotationType::Freehand,
        'r' => AnnotationType::Rectangle,
        'c' => AnnotationType::Circle,
        'l' => AnnotationType::Line,
        'a' => AnnotationType::Arrow,
        't' => AnnotationType::Text,
        'h' => AnnotationType::Highlight,
        'v' => AnnotationType::Select,
        _ => return None,
    };
    Some(tool)
}

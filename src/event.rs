//! Input events, generic messages, and deferred commands.
//!
//! The runtime defines its own key and mouse event types rather than exposing
//! crossterm's directly; `From` conversions are provided so an event loop can
//! feed crossterm events straight in. Anything that is not a key or mouse
//! event travels as a [`Msg`]: an opaque, downcastable message broadcast to
//! every component's message handlers.

use std::any::Any;
use std::time::Duration;

/// Key codes recognized by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Escape.
    Esc,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Function key.
    F(u8),
    /// Any key this crate does not model.
    Unidentified,
}

/// Modifier keys held during a key or mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    /// Control key.
    pub ctrl: bool,
    /// Alt / Option key.
    pub alt: bool,
    /// Shift key.
    pub shift: bool,
    /// Super / Command / Windows key.
    pub super_key: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        super_key: false,
    };
    /// Control only.
    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        super_key: false,
    };
    /// Alt only.
    pub const ALT: Self = Self {
        ctrl: false,
        alt: true,
        shift: false,
        super_key: false,
    };
    /// Shift only.
    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        super_key: false,
    };
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,
    /// Modifiers held at the time.
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Create a key event for a plain character.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
}

/// What a mouse event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Down(MouseButton),
    /// Button released.
    Up(MouseButton),
    /// Moved with a button held.
    Drag(MouseButton),
    /// Moved with no button held.
    Moved,
    /// Scroll wheel up.
    ScrollUp,
    /// Scroll wheel down.
    ScrollDown,
    /// Scroll wheel left.
    ScrollLeft,
    /// Scroll wheel right.
    ScrollRight,
}

/// A mouse event in terminal cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// What happened.
    pub kind: MouseEventKind,
    /// Column, zero-based.
    pub x: u16,
    /// Row, zero-based.
    pub y: u16,
    /// Modifiers held at the time.
    pub modifiers: KeyModifiers,
}

impl MouseEvent {
    /// True for `Moved` and `Drag` events, which drive hover tracking.
    pub fn is_motion(&self) -> bool {
        matches!(self.kind, MouseEventKind::Moved | MouseEventKind::Drag(_))
    }
}

impl From<crossterm::event::KeyModifiers> for KeyModifiers {
    fn from(m: crossterm::event::KeyModifiers) -> Self {
        use crossterm::event::KeyModifiers as Cm;
        Self {
            ctrl: m.contains(Cm::CONTROL),
            alt: m.contains(Cm::ALT),
            shift: m.contains(Cm::SHIFT),
            super_key: m.contains(Cm::SUPER),
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        use crossterm::event::KeyCode as Ck;
        let code = match event.code {
            Ck::Char(c) => KeyCode::Char(c),
            Ck::Enter => KeyCode::Enter,
            Ck::Tab => KeyCode::Tab,
            Ck::BackTab => KeyCode::BackTab,
            Ck::Backspace => KeyCode::Backspace,
            Ck::Delete => KeyCode::Delete,
            Ck::Insert => KeyCode::Insert,
            Ck::Esc => KeyCode::Esc,
            Ck::Up => KeyCode::Up,
            Ck::Down => KeyCode::Down,
            Ck::Left => KeyCode::Left,
            Ck::Right => KeyCode::Right,
            Ck::Home => KeyCode::Home,
            Ck::End => KeyCode::End,
            Ck::PageUp => KeyCode::PageUp,
            Ck::PageDown => KeyCode::PageDown,
            Ck::F(n) => KeyCode::F(n),
            _ => KeyCode::Unidentified,
        };
        Self {
            code,
            modifiers: event.modifiers.into(),
        }
    }
}

impl From<crossterm::event::MouseEvent> for MouseEvent {
    fn from(event: crossterm::event::MouseEvent) -> Self {
        use crossterm::event::{MouseButton as Cb, MouseEventKind as Ck};
        let button = |b: Cb| match b {
            Cb::Left => MouseButton::Left,
            Cb::Right => MouseButton::Right,
            Cb::Middle => MouseButton::Middle,
        };
        let kind = match event.kind {
            Ck::Down(b) => MouseEventKind::Down(button(b)),
            Ck::Up(b) => MouseEventKind::Up(button(b)),
            Ck::Drag(b) => MouseEventKind::Drag(button(b)),
            Ck::Moved => MouseEventKind::Moved,
            Ck::ScrollUp => MouseEventKind::ScrollUp,
            Ck::ScrollDown => MouseEventKind::ScrollDown,
            Ck::ScrollLeft => MouseEventKind::ScrollLeft,
            Ck::ScrollRight => MouseEventKind::ScrollRight,
        };
        Self {
            kind,
            x: event.column,
            y: event.row,
            modifiers: event.modifiers.into(),
        }
    }
}

/// Key binding helper for matching shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key code to match.
    pub code: KeyCode,
    /// Required modifier keys.
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Create a binding for a simple key.
    pub fn key(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Create a binding with Ctrl modifier.
    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CTRL,
        }
    }

    /// Create a binding with Alt modifier.
    pub fn alt(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::ALT,
        }
    }

    /// Create a binding with Shift modifier.
    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    /// Check if this binding matches a key event.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.code == event.code && self.modifiers == event.modifiers
    }
}

/// An opaque application message.
///
/// Anything that is not a key or mouse event (timer ticks, results of
/// deferred work, app-defined notifications) is delivered as a `Msg` and
/// broadcast to every registered message handler.
pub struct Msg(Box<dyn Any + Send>);

impl Msg {
    /// Wrap a value as a message.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Downcast to a concrete message type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if the payload is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl std::fmt::Debug for Msg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Msg").finish()
    }
}

/// A deferred unit of work.
///
/// Commands are returned by message handlers and executed off the dispatch
/// thread; a command never mutates component state directly. Its result, if
/// any, is delivered back through the message queue. A failed command is
/// logged and dropped, mirroring the handler error policy.
pub type Command = Box<dyn FnOnce() -> anyhow::Result<Option<Msg>> + Send + 'static>;

/// A command that sleeps for `after` and then produces a message.
///
/// This is the scheduled-future-message model for timers: cursor blinking,
/// polling, and delayed wake-ups are all ticks, never background mutation.
pub fn tick<F>(after: Duration, make: F) -> Command
where
    F: FnOnce() -> Msg + Send + 'static,
{
    Box::new(move || {
        std::thread::sleep(after);
        Ok(Some(make()))
    })
}

/// A unified input event, as consumed by [`Ctx::dispatch`](crate::Ctx::dispatch).
#[derive(Debug)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Mouse input.
    Mouse(MouseEvent),
    /// Anything else.
    Message(Msg),
}

impl From<KeyEvent> for Event {
    fn from(e: KeyEvent) -> Self {
        Self::Key(e)
    }
}

impl From<MouseEvent> for Event {
    fn from(e: MouseEvent) -> Self {
        Self::Mouse(e)
    }
}

impl From<Msg> for Event {
    fn from(m: Msg) -> Self {
        Self::Message(m)
    }
}

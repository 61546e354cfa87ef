//! Window events
//!
//! Every native callback is translated into one `Event` value. Events are pure
//! data: no variant owns a native resource, so they can be queued, cloned and
//! moved across threads freely.
//!
//! Dispatch is plain `match`; code that only cares about a few variants keeps
//! an explicit `_ =>` arm rather than leaving the other cases implicit.

pub mod queue;

pub use queue::{EventQueue, Iter, OverflowPolicy, ResizePolicy};

use crate::input::{KeyCode, KeyState, ModifierKey, MouseButton, MouseButtonState};
use crate::manager::WindowId;
use std::path::PathBuf;

/// A single window, input or monitor event
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Event {
    /// Placeholder stored in unused queue slots
    #[default]
    Empty,
    /// Window moved; `dx`/`dy` are relative to the previous position
    WindowMoved {
        /// New x position
        x: i32,
        /// New y position
        y: i32,
        /// Change in x
        dx: i32,
        /// Change in y
        dy: i32,
    },
    /// Window client area resized
    WindowResized {
        /// New width
        width: i32,
        /// New height
        height: i32,
        /// Change in width
        width_change: i32,
        /// Change in height
        height_change: i32,
    },
    /// User asked to close the window
    WindowClosed,
    /// Window contents need to be redrawn
    WindowRefreshed,
    /// Input focus gained or lost
    WindowFocused {
        /// Whether the window now has focus
        focused: bool,
    },
    /// Window minimised or restored
    WindowIconified {
        /// Whether the window is now iconified
        iconified: bool,
    },
    /// Window maximised or restored
    WindowMaximized {
        /// Whether the window is now maximized
        maximized: bool,
    },
    /// Content scale changed (moved to a monitor with different DPI)
    WindowScaleChanged {
        /// Horizontal scale
        x: f32,
        /// Vertical scale
        y: f32,
    },
    /// Framebuffer resized, in pixels
    FramebufferResized {
        /// New width
        width: i32,
        /// New height
        height: i32,
        /// Change in width
        width_change: i32,
        /// Change in height
        height_change: i32,
    },
    /// Mouse button pressed or released
    ButtonPressed {
        /// Button
        button: MouseButton,
        /// New state
        state: MouseButtonState,
        /// Held modifiers
        mods: ModifierKey,
    },
    /// Cursor moved; `dx`/`dy` are relative to the previous cursor position
    CursorMoved {
        /// New x position
        x: f64,
        /// New y position
        y: f64,
        /// Change in x
        dx: f64,
        /// Change in y
        dy: f64,
    },
    /// Cursor entered or left the client area
    CursorEntered {
        /// Whether the cursor is now inside
        entered: bool,
    },
    /// Scroll wheel or touchpad scroll
    Scrolled {
        /// Horizontal offset
        dx: f64,
        /// Vertical offset
        dy: f64,
    },
    /// Keyboard key pressed, repeated or released
    KeyPressed {
        /// Key
        key: KeyCode,
        /// Platform scancode
        scancode: i32,
        /// New state
        state: KeyState,
        /// Held modifiers
        mods: ModifierKey,
    },
    /// Text input
    CharInput {
        /// Unicode code point
        codepoint: char,
    },
    /// Files dropped onto the window
    FileDropped {
        /// Dropped paths
        files: Vec<PathBuf>,
    },
    /// Monitor connected or disconnected
    MonitorConnected {
        /// Monitor name as reported by the backend
        name: String,
        /// `true` on connect, `false` on disconnect
        connected: bool,
    },
}

impl Event {
    /// Name of the active variant
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::WindowMoved { .. } => "WindowMoved",
            Self::WindowResized { .. } => "WindowResized",
            Self::WindowClosed => "WindowClosed",
            Self::WindowRefreshed => "WindowRefreshed",
            Self::WindowFocused { .. } => "WindowFocused",
            Self::WindowIconified { .. } => "WindowIconified",
            Self::WindowMaximized { .. } => "WindowMaximized",
            Self::WindowScaleChanged { .. } => "WindowScaleChanged",
            Self::FramebufferResized { .. } => "FramebufferResized",
            Self::ButtonPressed { .. } => "ButtonPressed",
            Self::CursorMoved { .. } => "CursorMoved",
            Self::CursorEntered { .. } => "CursorEntered",
            Self::Scrolled { .. } => "Scrolled",
            Self::KeyPressed { .. } => "KeyPressed",
            Self::CharInput { .. } => "CharInput",
            Self::FileDropped { .. } => "FileDropped",
            Self::MonitorConnected { .. } => "MonitorConnected",
        }
    }

    /// Whether this is the `Empty` placeholder
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Cursor move with zero deltas; the manager fills them in on delivery
    pub fn cursor_moved(x: f64, y: f64) -> Self {
        Self::CursorMoved { x, y, dx: 0.0, dy: 0.0 }
    }

    /// Window move with zero deltas; the manager fills them in on delivery
    pub fn window_moved(x: i32, y: i32) -> Self {
        Self::WindowMoved { x, y, dx: 0, dy: 0 }
    }

    /// Window resize with zero deltas; the manager fills them in on delivery
    pub fn window_resized(width: i32, height: i32) -> Self {
        Self::WindowResized { width, height, width_change: 0, height_change: 0 }
    }

    /// Framebuffer resize with zero deltas; the manager fills them in on delivery
    pub fn framebuffer_resized(width: i32, height: i32) -> Self {
        Self::FramebufferResized { width, height, width_change: 0, height_change: 0 }
    }

    /// Key event with no modifiers and scancode 0
    pub fn key(key: KeyCode, state: KeyState) -> Self {
        Self::KeyPressed { key, scancode: 0, state, mods: ModifierKey::empty() }
    }
}

/// Hook that sees every event before it reaches a window
///
/// Runs on the manager thread, after relative deltas are resolved and before
/// the window's cached properties are updated. Returning `false` drops the
/// event entirely. Closures of the matching shape implement this trait.
pub trait EventInterceptor {
    /// Inspect or rewrite `event` bound for `window`; return whether to forward it
    fn intercept(&mut self, window: WindowId, event: &mut Event) -> bool;
}

impl<F> EventInterceptor for F
where
    F: FnMut(WindowId, &mut Event) -> bool,
{
    fn intercept(&mut self, window: WindowId, event: &mut Event) -> bool {
        self(window, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let event = Event::default();
        assert!(event.is_empty());
        assert_eq!(event.name(), "Empty");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Event::cursor_moved(1.0, 2.0).name(), "CursorMoved");
        assert_eq!(Event::key(KeyCode::A, KeyState::Press).name(), "KeyPressed");
        assert_eq!(Event::FileDropped { files: vec![] }.name(), "FileDropped");
        assert_eq!(
            Event::MonitorConnected { name: "DP-1".into(), connected: true }.name(),
            "MonitorConnected"
        );
    }

    #[test]
    fn test_closure_interceptor() {
        let mut veto_scroll = |_: WindowId, event: &mut Event| !matches!(event, Event::Scrolled { .. });
        let id = WindowId::default();

        let mut scroll = Event::Scrolled { dx: 0.0, dy: 1.0 };
        let mut focus = Event::WindowFocused { focused: true };
        assert!(!veto_scroll.intercept(id, &mut scroll));
        assert!(veto_scroll.intercept(id, &mut focus));
    }
}

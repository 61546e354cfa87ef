//! Cached window state
//!
//! `Properties` mirrors what the backend last reported for a window. It is
//! written only on the manager thread, while an event is being delivered, and
//! read through cloned snapshots from anywhere else.

use crate::event::Event;
use crate::input::{KeyState, KeyStateRecord, MouseButtonState, MouseButtonStateRecord};
use bitflags::bitflags;

bitflags! {
    /// Boolean window attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowAttributes: u8 {
        /// Window has input focus
        const FOCUSED = 0x01;
        /// Cursor is over the client area
        const HOVERED = 0x02;
        /// Window is minimised
        const ICONIFIED = 0x04;
        /// Window is maximised
        const MAXIMIZED = 0x08;
        /// Window is shown
        const VISIBLE = 0x10;
        /// User can resize the window
        const RESIZABLE = 0x20;
        /// Window stays on top of others
        const FLOATING = 0x40;
    }
}

/// Integer 2D position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

/// Integer 2D size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

/// Cursor position relative to the top-left corner of the client area
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorPosition {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

/// Last known state of a window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties {
    /// Window title
    pub title: String,
    /// Screen position of the window
    pub position: Position,
    /// Client area size in screen coordinates
    pub dimensions: Dimensions,
    /// Framebuffer size in pixels
    pub framebuffer_size: Dimensions,
    /// Cursor position
    pub cursor: CursorPosition,
    /// Boolean attributes
    pub attributes: WindowAttributes,
    /// Keys currently held
    pub key_state: KeyStateRecord,
    /// Mouse buttons currently held
    pub button_state: MouseButtonStateRecord,
}

impl Properties {
    /// Width divided by height, or `0.0` for a zero-height window
    pub fn aspect_ratio(&self) -> f32 {
        if self.dimensions.height == 0 {
            0.0
        } else {
            self.dimensions.width as f32 / self.dimensions.height as f32
        }
    }

    /// Fill the relative fields of a freshly translated backend event
    ///
    /// Backends only know absolute values; the deltas are computed against
    /// the values cached here before [`apply`](Self::apply) overwrites them.
    pub fn resolve_deltas(&self, event: &mut Event) {
        match event {
            Event::WindowMoved { x, y, dx, dy } => {
                *dx = *x - self.position.x;
                *dy = *y - self.position.y;
            }
            Event::WindowResized { width, height, width_change, height_change } => {
                *width_change = *width - self.dimensions.width;
                *height_change = *height - self.dimensions.height;
            }
            Event::FramebufferResized { width, height, width_change, height_change } => {
                *width_change = *width - self.framebuffer_size.width;
                *height_change = *height - self.framebuffer_size.height;
            }
            Event::CursorMoved { x, y, dx, dy } => {
                *dx = *x - self.cursor.x;
                *dy = *y - self.cursor.y;
            }
            _ => {}
        }
    }

    /// Update the cached state from an event about to be delivered
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::WindowMoved { x, y, .. } => {
                self.position = Position { x: *x, y: *y };
            }
            Event::WindowResized { width, height, .. } => {
                self.dimensions = Dimensions { width: *width, height: *height };
            }
            Event::FramebufferResized { width, height, .. } => {
                self.framebuffer_size = Dimensions { width: *width, height: *height };
            }
            Event::CursorMoved { x, y, .. } => {
                self.cursor = CursorPosition { x: *x, y: *y };
            }
            Event::CursorEntered { entered } => {
                self.attributes.set(WindowAttributes::HOVERED, *entered);
            }
            Event::WindowFocused { focused } => {
                self.attributes.set(WindowAttributes::FOCUSED, *focused);
            }
            Event::WindowIconified { iconified } => {
                self.attributes.set(WindowAttributes::ICONIFIED, *iconified);
            }
            Event::WindowMaximized { maximized } => {
                self.attributes.set(WindowAttributes::MAXIMIZED, *maximized);
            }
            Event::KeyPressed { key, state, .. } => {
                // repeats leave the key held
                self.key_state.set_value(*key, *state != KeyState::Release);
            }
            Event::ButtonPressed { button, state, .. } => {
                self.button_state.set_value(*button, *state == MouseButtonState::Press);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, ModifierKey, MouseButton};

    #[test]
    fn test_resolve_cursor_deltas() {
        let mut props = Properties::default();
        props.cursor = CursorPosition { x: 10.0, y: 20.0 };

        let mut event = Event::cursor_moved(15.0, 5.0);
        props.resolve_deltas(&mut event);
        assert_eq!(event, Event::CursorMoved { x: 15.0, y: 5.0, dx: 5.0, dy: -15.0 });

        props.apply(&event);
        assert_eq!(props.cursor, CursorPosition { x: 15.0, y: 5.0 });
    }

    #[test]
    fn test_resolve_size_deltas() {
        let mut props = Properties::default();
        props.dimensions = Dimensions { width: 800, height: 600 };
        props.framebuffer_size = Dimensions { width: 1600, height: 1200 };

        let mut resized = Event::window_resized(1024, 600);
        let mut framebuffer = Event::framebuffer_resized(2048, 1200);
        props.resolve_deltas(&mut resized);
        props.resolve_deltas(&mut framebuffer);

        assert!(matches!(resized, Event::WindowResized { width_change: 224, height_change: 0, .. }));
        assert!(matches!(framebuffer, Event::FramebufferResized { width_change: 448, height_change: 0, .. }));
    }

    #[test]
    fn test_apply_attributes() {
        let mut props = Properties::default();
        props.apply(&Event::WindowFocused { focused: true });
        props.apply(&Event::CursorEntered { entered: true });
        props.apply(&Event::WindowIconified { iconified: true });
        props.apply(&Event::WindowIconified { iconified: false });

        assert_eq!(props.attributes, WindowAttributes::FOCUSED | WindowAttributes::HOVERED);
    }

    #[test]
    fn test_apply_key_and_button_state() {
        let mut props = Properties::default();
        props.apply(&Event::key(KeyCode::Space, KeyState::Press));
        props.apply(&Event::key(KeyCode::Space, KeyState::Repeat));
        assert!(props.key_state.is_pressed(KeyCode::Space));

        props.apply(&Event::key(KeyCode::Space, KeyState::Release));
        assert!(!props.key_state.is_pressed(KeyCode::Space));

        props.apply(&Event::ButtonPressed {
            button: MouseButton::Right,
            state: MouseButtonState::Press,
            mods: ModifierKey::empty(),
        });
        assert!(props.button_state.is_pressed(MouseButton::Right));
    }

    #[test]
    fn test_aspect_ratio() {
        let mut props = Properties::default();
        assert_eq!(props.aspect_ratio(), 0.0);

        props.dimensions = Dimensions { width: 1920, height: 1080 };
        assert!((props.aspect_ratio() - 16.0 / 9.0).abs() < f32::EPSILON);
    }
}

//! Native windowing backends
//!
//! A backend is split along thread lines. [`Platform`] and [`NativeWindow`]
//! may only be touched from the thread that owns the [`Manager`], which is
//! where native windowing systems require creation, event pumping and most
//! setters to happen. [`RenderSurface`] is the slice of a native window a
//! worker thread needs to render: context binding and presentation.
//!
//! [`Manager`]: crate::manager::Manager

pub mod glfw_backend;
pub mod headless;

pub use glfw_backend::GlfwPlatform;
pub use headless::{HeadlessController, HeadlessPlatform, HeadlessWindowHandle};

use crate::config::{ApiConfig, ProcAddress, WindowHint};
use crate::event::Event;
use std::time::Duration;
use thiserror::Error;

/// Backend errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Windowing system could not be initialised
    #[error("Backend initialization failed: {0}")]
    InitializationFailed(String),

    /// Native window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Error reported by GLFW
    #[error("GLFW error: {0}")]
    Glfw(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Geometry and pointer state of a native window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSnapshot {
    /// Screen position
    pub position: (i32, i32),
    /// Client area size
    pub size: (i32, i32),
    /// Framebuffer size in pixels
    pub framebuffer_size: (i32, i32),
    /// Cursor position
    pub cursor: (f64, f64),
    /// Whether the cursor is over the client area
    pub hovered: bool,
}

/// Process-wide native windowing system
pub trait Platform {
    /// Native window type created by this platform
    type Window: NativeWindow;

    /// Create a native window with the given hints
    fn create_window(
        &mut self,
        hint: &WindowHint,
        api: &ApiConfig,
        title: &str,
        width: u32,
        height: u32,
    ) -> BackendResult<Self::Window>;

    /// Process pending native events without blocking
    fn poll_events(&mut self);

    /// Block until at least one native event arrives or the timeout expires
    fn wait_events(&mut self, timeout: Option<Duration>);

    /// Names of the currently connected monitors
    fn monitors(&mut self) -> Vec<String>;
}

/// A native window, owned by the manager thread
pub trait NativeWindow {
    /// Translate and hand over every event received since the last call
    fn drain_events(&mut self, sink: &mut dyn FnMut(Event));

    /// Create the render surface for the window's owner thread
    ///
    /// Called exactly once, right after creation.
    fn render_surface(&mut self) -> Box<dyn RenderSurface>;

    /// Current geometry, cursor and hover state
    fn snapshot(&self) -> WindowSnapshot;

    /// Whether closing has been requested
    fn should_close(&self) -> bool;

    /// Resolve a graphics API function; context must be current on this thread
    fn get_proc_address(&mut self, name: &str) -> ProcAddress;

    /// Set the title text
    fn set_title(&mut self, title: &str);

    /// Resize the client area
    fn set_size(&mut self, width: i32, height: i32);

    /// Move the window
    fn set_position(&mut self, x: i32, y: i32);

    /// Minimise the window
    fn iconify(&mut self);

    /// Restore a minimised or maximised window
    fn restore(&mut self);

    /// Maximise the window
    fn maximize(&mut self);

    /// Make the window visible
    fn show(&mut self);

    /// Hide the window
    fn hide(&mut self);

    /// Bring the window to the front and give it input focus
    fn focus(&mut self);

    /// Hide and lock the cursor to the window, or release it
    fn set_cursor_captured(&mut self, captured: bool);

    /// Constrain resizing to `numerator:denominator`, or lift the constraint
    fn set_aspect_ratio(&mut self, ratio: Option<(u32, u32)>);
}

/// Context operations usable from the thread that owns a [`Window`](crate::window::Window)
pub trait RenderSurface: Send {
    /// Make the window's context current on the calling thread
    fn make_current(&mut self);

    /// Detach whatever context is current on the calling thread
    fn clear_current(&mut self);

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Whether closing has been requested
    fn should_close(&self) -> bool;

    /// Request or cancel closing
    fn set_should_close(&mut self, value: bool);
}

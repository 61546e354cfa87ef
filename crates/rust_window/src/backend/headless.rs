//! In-process backend without a display
//!
//! Windows exist only as state behind a mutex. Events are injected through a
//! [`HeadlessController`] and delivered on the next poll, the same way a real
//! windowing system queues them until the event pump runs. Setters update
//! the native state and queue the event a real window manager would report.
//!
//! ```
//! use rust_window::backend::{HeadlessPlatform, Platform};
//! use rust_window::config::{ApiConfig, WindowHint};
//!
//! let mut platform = HeadlessPlatform::new();
//! let controller = platform.controller();
//! let _window = platform
//!     .create_window(&WindowHint::default(), &ApiConfig::NoApi, "demo", 320, 240)
//!     .unwrap();
//!
//! let handle = controller.window(0).unwrap();
//! assert_eq!(handle.title(), "demo");
//! ```

use super::{BackendError, BackendResult, NativeWindow, Platform, RenderSurface, WindowSnapshot};
use crate::config::{ApiConfig, ProcAddress, WindowHint};
use crate::event::Event;
use crate::lock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

#[derive(Debug, Default)]
struct PlatformState {
    windows: Vec<Arc<WindowShared>>,
    monitors: Vec<String>,
    fail_next_window: bool,
    polls: usize,
}

#[derive(Debug, Default)]
struct NativeState {
    title: String,
    position: (i32, i32),
    size: (i32, i32),
    visible: bool,
    iconified: bool,
    maximized: bool,
    focused: bool,
    cursor_captured: bool,
    aspect_ratio: Option<(u32, u32)>,
    pending: VecDeque<Event>,
}

#[derive(Debug, Default)]
struct WindowShared {
    native: Mutex<NativeState>,
    should_close: AtomicBool,
    destroyed: AtomicBool,
    current: Mutex<Option<ThreadId>>,
    swaps: AtomicUsize,
}

/// Platform whose windows live entirely in memory
#[derive(Debug)]
pub struct HeadlessPlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    /// Create a platform with a single monitor named `Headless-0`
    pub fn new() -> Self {
        let state = PlatformState {
            monitors: vec!["Headless-0".to_string()],
            ..PlatformState::default()
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Handle for scripting this platform from any thread
    pub fn controller(&self) -> HeadlessController {
        HeadlessController { state: Arc::clone(&self.state) }
    }
}

impl Platform for HeadlessPlatform {
    type Window = HeadlessWindow;

    fn create_window(
        &mut self,
        hint: &WindowHint,
        _api: &ApiConfig,
        title: &str,
        width: u32,
        height: u32,
    ) -> BackendResult<HeadlessWindow> {
        let mut state = lock(&self.state);
        if std::mem::take(&mut state.fail_next_window) {
            return Err(BackendError::CreationFailed);
        }

        let native = NativeState {
            title: title.to_string(),
            size: (clamp_dimension(width), clamp_dimension(height)),
            visible: hint.visible,
            focused: hint.focused && hint.visible,
            maximized: hint.maximized,
            ..NativeState::default()
        };
        let shared = Arc::new(WindowShared {
            native: Mutex::new(native),
            ..WindowShared::default()
        });
        state.windows.push(Arc::clone(&shared));

        Ok(HeadlessWindow { shared })
    }

    fn poll_events(&mut self) {
        lock(&self.state).polls += 1;
    }

    fn wait_events(&mut self, timeout: Option<Duration>) {
        // nothing can arrive while blocked, so waiting is a poll
        let _ = timeout;
        self.poll_events();
    }

    fn monitors(&mut self) -> Vec<String> {
        lock(&self.state).monitors.clone()
    }
}

fn clamp_dimension(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Test and automation handle to a [`HeadlessPlatform`]
#[derive(Debug, Clone)]
pub struct HeadlessController {
    state: Arc<Mutex<PlatformState>>,
}

impl HeadlessController {
    /// Window by creation order, including destroyed ones
    pub fn window(&self, index: usize) -> Option<HeadlessWindowHandle> {
        lock(&self.state)
            .windows
            .get(index)
            .map(|shared| HeadlessWindowHandle { shared: Arc::clone(shared) })
    }

    /// Number of windows created so far
    pub fn windows_created(&self) -> usize {
        lock(&self.state).windows.len()
    }

    /// Number of event pumps so far
    pub fn poll_count(&self) -> usize {
        lock(&self.state).polls
    }

    /// Make the next window creation fail
    pub fn fail_next_window(&self) {
        lock(&self.state).fail_next_window = true;
    }

    /// Plug in a monitor
    pub fn connect_monitor(&self, name: &str) {
        lock(&self.state).monitors.push(name.to_string());
    }

    /// Unplug one monitor called `name`; identical panels share a name
    pub fn disconnect_monitor(&self, name: &str) {
        let mut state = lock(&self.state);
        if let Some(index) = state.monitors.iter().rposition(|monitor| monitor == name) {
            state.monitors.remove(index);
        }
    }
}

/// View of one headless window
#[derive(Debug, Clone)]
pub struct HeadlessWindowHandle {
    shared: Arc<WindowShared>,
}

impl HeadlessWindowHandle {
    /// Queue an event for delivery on the next poll
    pub fn inject(&self, event: Event) {
        lock(&self.shared.native).pending.push_back(event);
    }

    /// Simulate the user clicking the close button
    pub fn click_close(&self) {
        self.shared.should_close.store(true, Ordering::SeqCst);
        self.inject(Event::WindowClosed);
    }

    /// Current title
    pub fn title(&self) -> String {
        lock(&self.shared.native).title.clone()
    }

    /// Current position
    pub fn position(&self) -> (i32, i32) {
        lock(&self.shared.native).position
    }

    /// Current client area size
    pub fn size(&self) -> (i32, i32) {
        lock(&self.shared.native).size
    }

    /// Whether the window is shown
    pub fn is_visible(&self) -> bool {
        lock(&self.shared.native).visible
    }

    /// Whether the window is minimised
    pub fn is_iconified(&self) -> bool {
        lock(&self.shared.native).iconified
    }

    /// Whether the window is maximised
    pub fn is_maximized(&self) -> bool {
        lock(&self.shared.native).maximized
    }

    /// Whether the window has focus
    pub fn is_focused(&self) -> bool {
        lock(&self.shared.native).focused
    }

    /// Whether the cursor is captured
    pub fn is_cursor_captured(&self) -> bool {
        lock(&self.shared.native).cursor_captured
    }

    /// Current aspect ratio constraint
    pub fn aspect_ratio(&self) -> Option<(u32, u32)> {
        lock(&self.shared.native).aspect_ratio
    }

    /// Whether closing has been requested
    pub fn should_close(&self) -> bool {
        self.shared.should_close.load(Ordering::SeqCst)
    }

    /// Whether the native window has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::SeqCst)
    }

    /// Thread the context was last made current on, if still current
    pub fn current_thread(&self) -> Option<ThreadId> {
        *lock(&self.shared.current)
    }

    /// Number of presented frames
    pub fn swap_count(&self) -> usize {
        self.shared.swaps.load(Ordering::SeqCst)
    }
}

/// Native window of a [`HeadlessPlatform`]
#[derive(Debug)]
pub struct HeadlessWindow {
    shared: Arc<WindowShared>,
}

impl HeadlessWindow {
    fn update(&mut self, apply: impl FnOnce(&mut NativeState) -> Option<Event>) {
        let mut native = lock(&self.shared.native);
        if let Some(event) = apply(&mut native) {
            native.pending.push_back(event);
        }
    }
}

impl Drop for HeadlessWindow {
    fn drop(&mut self) {
        // taken so no surface call straddles the destruction
        let mut current = lock(&self.shared.current);
        self.shared.destroyed.store(true, Ordering::SeqCst);
        *current = None;
    }
}

impl NativeWindow for HeadlessWindow {
    fn drain_events(&mut self, sink: &mut dyn FnMut(Event)) {
        let pending = std::mem::take(&mut lock(&self.shared.native).pending);
        pending.into_iter().for_each(sink);
    }

    fn render_surface(&mut self) -> Box<dyn RenderSurface> {
        Box::new(HeadlessSurface { shared: Arc::clone(&self.shared) })
    }

    fn snapshot(&self) -> WindowSnapshot {
        let native = lock(&self.shared.native);
        WindowSnapshot {
            position: native.position,
            size: native.size,
            framebuffer_size: native.size,
            cursor: (0.0, 0.0),
            hovered: false,
        }
    }

    fn should_close(&self) -> bool {
        self.shared.should_close.load(Ordering::SeqCst)
    }

    fn get_proc_address(&mut self, _name: &str) -> ProcAddress {
        std::ptr::null()
    }

    fn set_title(&mut self, title: &str) {
        self.update(|native| {
            native.title = title.to_string();
            None
        });
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.update(|native| {
            native.size = (width, height);
            native.pending.push_back(Event::window_resized(width, height));
            Some(Event::framebuffer_resized(width, height))
        });
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.update(|native| {
            native.position = (x, y);
            Some(Event::window_moved(x, y))
        });
    }

    fn iconify(&mut self) {
        self.update(|native| {
            native.iconified = true;
            Some(Event::WindowIconified { iconified: true })
        });
    }

    fn restore(&mut self) {
        self.update(|native| {
            if native.iconified {
                native.iconified = false;
                Some(Event::WindowIconified { iconified: false })
            } else if native.maximized {
                native.maximized = false;
                Some(Event::WindowMaximized { maximized: false })
            } else {
                None
            }
        });
    }

    fn maximize(&mut self) {
        self.update(|native| {
            native.maximized = true;
            Some(Event::WindowMaximized { maximized: true })
        });
    }

    fn show(&mut self) {
        self.update(|native| {
            native.visible = true;
            None
        });
    }

    fn hide(&mut self) {
        self.update(|native| {
            native.visible = false;
            native.focused = false;
            None
        });
    }

    fn focus(&mut self) {
        self.update(|native| {
            if native.focused || !native.visible {
                return None;
            }
            native.focused = true;
            Some(Event::WindowFocused { focused: true })
        });
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        self.update(|native| {
            native.cursor_captured = captured;
            None
        });
    }

    fn set_aspect_ratio(&mut self, ratio: Option<(u32, u32)>) {
        self.update(|native| {
            native.aspect_ratio = ratio;
            None
        });
    }
}

/// Surface calls hold the context lock and do nothing once the window is gone
struct HeadlessSurface {
    shared: Arc<WindowShared>,
}

impl HeadlessSurface {
    fn with_live(&self, apply: impl FnOnce(&mut Option<ThreadId>)) {
        let mut current = lock(&self.shared.current);
        if !self.shared.destroyed.load(Ordering::SeqCst) {
            apply(&mut current);
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn make_current(&mut self) {
        self.with_live(|current| *current = Some(std::thread::current().id()));
    }

    fn clear_current(&mut self) {
        self.with_live(|current| *current = None);
    }

    fn swap_buffers(&mut self) {
        self.with_live(|_| {
            self.shared.swaps.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn should_close(&self) -> bool {
        let _current = lock(&self.shared.current);
        self.shared.destroyed.load(Ordering::SeqCst) || self.shared.should_close.load(Ordering::SeqCst)
    }

    fn set_should_close(&mut self, value: bool) {
        self.with_live(|_| self.shared.should_close.store(value, Ordering::SeqCst));
    }
}

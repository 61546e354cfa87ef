//! Thread-safe half of a window
//!
//! [`WindowShared`] is the state reachable from more than one thread: the
//! producer side of the event double buffer together with the cached
//! [`Properties`], the window's task queue and the frame lock. The manager
//! reaches it through a `Weak` reference; [`WindowProxy`] holds a strong one.

use super::properties::Properties;
use crate::event::{Event, EventQueue, OverflowPolicy, ResizePolicy};
use crate::lock;
use crate::manager::{ManagerHandle, WindowId};
use crate::task::Task;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Producer side of the event double buffer
#[derive(Debug)]
pub(crate) struct EventBuffers {
    pub(crate) back: EventQueue,
    pub(crate) properties: Properties,
}

pub(crate) struct WindowShared {
    pub(crate) events: Mutex<EventBuffers>,
    pub(crate) tasks: Mutex<VecDeque<Task>>,
    pub(crate) frame: Mutex<()>,
    pub(crate) frame_thread: Mutex<Option<ThreadId>>,
    pub(crate) close_requested: AtomicBool,
    pub(crate) mouse_captured: AtomicBool,
}

impl WindowShared {
    pub(crate) fn new(properties: Properties, capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            events: Mutex::new(EventBuffers {
                back: EventQueue::with_overflow_policy(capacity, overflow),
                properties,
            }),
            tasks: Mutex::new(VecDeque::new()),
            frame: Mutex::new(()),
            frame_thread: Mutex::new(None),
            close_requested: AtomicBool::new(false),
            mouse_captured: AtomicBool::new(false),
        }
    }

    /// Fill relative fields from the cached properties
    pub(crate) fn resolve_deltas(&self, event: &mut Event) {
        lock(&self.events).properties.resolve_deltas(event);
    }

    /// Update the cached properties from `event`, then queue it for the next poll
    pub(crate) fn push_event(&self, event: Event) {
        let mut buffers = lock(&self.events);
        buffers.properties.apply(&event);
        buffers.back.push(event);
    }

    pub(crate) fn resize_back(&self, capacity: usize) {
        lock(&self.events).back.resize(capacity, ResizePolicy::DiscardOld);
    }

    pub(crate) fn properties(&self) -> Properties {
        lock(&self.events).properties.clone()
    }

    pub(crate) fn enqueue_task(&self, task: Task) {
        lock(&self.tasks).push_back(task);
    }

    pub(crate) fn take_tasks(&self) -> VecDeque<Task> {
        std::mem::take(&mut *lock(&self.tasks))
    }

    /// Hold the frame lock and record the calling thread as the frame owner
    pub(crate) fn begin_frame(&self) -> FrameGuard<'_> {
        let frame = lock(&self.frame);
        *lock(&self.frame_thread) = Some(thread::current().id());
        FrameGuard { shared: self, _frame: frame }
    }
}

/// Frame in progress; releases the frame lock when dropped
pub(crate) struct FrameGuard<'a> {
    shared: &'a WindowShared,
    _frame: MutexGuard<'a, ()>,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.shared.frame_thread) = None;
    }
}

/// Cloneable, `Send + Sync` handle to a window
///
/// Everything here may be called from any thread. Native operations are
/// forwarded to the manager thread and take effect on its next drain; the
/// resulting backend events then update [`properties`](Self::properties).
#[derive(Clone)]
pub struct WindowProxy {
    id: WindowId,
    shared: Arc<WindowShared>,
    manager: ManagerHandle,
}

impl std::fmt::Debug for WindowProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowProxy").field("id", &self.id).finish_non_exhaustive()
    }
}

impl WindowProxy {
    pub(crate) fn new(id: WindowId, shared: Arc<WindowShared>, manager: ManagerHandle) -> Self {
        Self { id, shared, manager }
    }

    pub(crate) fn shared(&self) -> &Arc<WindowShared> {
        &self.shared
    }

    pub(crate) fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    /// Identifier of the native window inside its manager
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Snapshot of the cached window state
    pub fn properties(&self) -> Properties {
        self.shared.properties()
    }

    /// Width divided by height of the cached client area
    pub fn aspect_ratio(&self) -> f32 {
        self.shared.properties().aspect_ratio()
    }

    /// Queue a closure for the window's owner thread
    ///
    /// Tasks run in FIFO order during the owner's next frame or poll.
    pub fn enqueue_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.enqueue_task(Box::new(task));
    }

    /// Ask the window's run loop to stop after the current frame
    pub fn request_close(&self) {
        self.shared.close_requested.store(true, Ordering::SeqCst);
        log::info!("(Window) Window {:?} requested to close", self.id);
    }

    /// Run `f` while no frame of this window is in progress
    ///
    /// Called from inside the window's own frame, `f` runs immediately.
    pub fn between_frames<R>(&self, f: impl FnOnce() -> R) -> R {
        if *lock(&self.shared.frame_thread) == Some(thread::current().id()) {
            return f();
        }
        let _frame = lock(&self.shared.frame);
        f()
    }

    /// Resize the client area
    pub fn set_window_size(&self, width: i32, height: i32) {
        self.manager.enqueue_window_task(self.id, move |native| native.set_size(width, height));
    }

    /// Move the window
    pub fn set_window_pos(&self, x: i32, y: i32) {
        self.manager.enqueue_window_task(self.id, move |native| native.set_position(x, y));
    }

    /// Change the title text
    pub fn update_title(&self, title: &str) {
        let title = title.to_string();
        let shared = Arc::clone(&self.shared);
        self.manager.enqueue_window_task(self.id, move |native| {
            native.set_title(&title);
            // no backend reports title changes
            lock(&shared.events).properties.title = title;
        });
    }

    /// Minimise the window
    pub fn iconify(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.iconify());
    }

    /// Restore the window from minimised or maximised state
    pub fn restore(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.restore());
    }

    /// Maximise the window
    pub fn maximize(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.maximize());
    }

    /// Show the window
    pub fn show(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.show());
    }

    /// Hide the window
    pub fn hide(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.hide());
    }

    /// Bring the window to the front and focus it
    pub fn focus(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.focus());
    }

    /// Capture or release the mouse cursor
    ///
    /// On capture the cached cursor position is refreshed first so the next
    /// cursor event does not report a jump.
    pub fn set_capture_mouse(&self, capture: bool) {
        self.shared.mouse_captured.store(capture, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        self.manager.enqueue_window_task(self.id, move |native| {
            if capture {
                let (x, y) = native.snapshot().cursor;
                let mut buffers = lock(&shared.events);
                buffers.properties.cursor.x = x;
                buffers.properties.cursor.y = y;
            }
            native.set_cursor_captured(capture);
        });
    }

    /// Whether the cursor was last asked to be captured
    pub fn is_mouse_captured(&self) -> bool {
        self.shared.mouse_captured.load(Ordering::SeqCst)
    }

    /// Constrain resizing to `ratio` (width / height)
    ///
    /// Non-positive or non-finite ratios are rejected with a warning.
    pub fn lock_aspect_ratio(&self, ratio: f32) {
        if !(ratio.is_finite() && ratio > 0.0) {
            log::warn!("(Window) Invalid aspect ratio: {}", ratio);
            return;
        }

        let shared = Arc::clone(&self.shared);
        self.manager.enqueue_window_task(self.id, move |native| {
            let width = lock(&shared.events).properties.dimensions.width.max(1);
            let height = ((width as f32 / ratio) as i32).max(1);
            native.set_aspect_ratio(Some((width as u32, height as u32)));
        });
    }

    /// Constrain resizing to the current width / height ratio
    pub fn lock_current_aspect_ratio(&self) {
        let shared = Arc::clone(&self.shared);
        self.manager.enqueue_window_task(self.id, move |native| {
            let dimensions = lock(&shared.events).properties.dimensions;
            if dimensions.width > 0 && dimensions.height > 0 {
                native.set_aspect_ratio(Some((dimensions.width as u32, dimensions.height as u32)));
            } else {
                log::warn!("(Window) Cannot lock aspect ratio of an empty window");
            }
        });
    }

    /// Lift any aspect ratio constraint
    pub fn unlock_aspect_ratio(&self) {
        self.manager.enqueue_window_task(self.id, |native| native.set_aspect_ratio(None));
    }
}

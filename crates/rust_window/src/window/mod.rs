//! Window subsystem
//!
//! A [`Window`] is the consumer-side half of a native window. It is created by
//! the [`Manager`](crate::manager::Manager), moved to whichever thread renders
//! into it, and talks back to the manager thread only through queues.
//!
//! # Architecture Overview
//!
//! ```text
//!  manager thread                          render thread
//! ┌──────────────────┐                   ┌──────────────────────┐
//! │ Manager          │  push_event       │ Window               │
//! │  native window ──┼──────────┐        │  front EventQueue    │
//! │  inboxes ◄───────┼───────┐  │        │  render surface      │
//! └──────────────────┘       │  │        │  key handlers        │
//!                            │  ▼        └──────────┬───────────┘
//!                     ┌──────┴──────────────┐       │ poll(): swap
//!                     │ WindowShared        │◄──────┘
//!                     │  back EventQueue    │
//!                     │  Properties         │
//!                     │  task queue         │
//!                     └─────────────────────┘
//!                            ▲
//!                            │ WindowProxy (any thread)
//! ```
//!
//! # Module Organization
//!
//! - **`proxy`**: the shared core and its cloneable handle
//! - **`properties`**: cached window state updated from events
//! - **`timer`**: per-window frame timing

pub mod properties;
pub mod proxy;
pub mod timer;

pub use properties::{CursorPosition, Dimensions, Position, Properties, WindowAttributes};
pub use proxy::WindowProxy;
pub use timer::FrameTimer;

use crate::backend::RenderSurface;
use crate::event::{Event, EventQueue, OverflowPolicy, ResizePolicy};
use crate::input::{KeyCode, KeyState, KeyStateRecord, ModifierKey};
use crate::lock;
use crate::task::run_guarded;
use std::ops::Deref;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// When a key handler fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Once per press, during [`Window::poll`]
    Callback,
    /// Every frame of [`Window::run`] while one of the keys is held
    Continuous,
}

type KeyHandlerFn = Box<dyn FnMut(&mut Window) + Send>;

struct KeyHandler {
    keys: Vec<KeyCode>,
    mods: ModifierKey,
    action: KeyAction,
    handler: KeyHandlerFn,
}

impl KeyHandler {
    /// Handlers without modifiers fire on plain presses only; others on any overlap
    fn matches_press(&self, key: KeyCode, mods: ModifierKey) -> bool {
        self.action == KeyAction::Callback
            && self.keys.contains(&key)
            && if self.mods.is_empty() { mods.is_empty() } else { mods.intersects(self.mods) }
    }

    fn matches_held(&self, held: &KeyStateRecord, mods: ModifierKey) -> bool {
        self.action == KeyAction::Continuous
            && held.any_pressed(&self.keys)
            && (self.mods.is_empty() || mods.intersects(self.mods))
    }
}

/// A native window as seen from the thread that renders into it
///
/// Dropping a `Window` unbinds its context when bound on the dropping thread
/// and asks the manager to destroy the native window. Cross-thread operations
/// are available through [`Deref`] to [`WindowProxy`].
pub struct Window {
    proxy: WindowProxy,
    surface: Box<dyn RenderSurface>,
    front: EventQueue,
    attached_thread: Option<ThreadId>,
    has_context: bool,
    timer: FrameTimer,
    key_handlers: Vec<KeyHandler>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.proxy.id())
            .field("attached_thread", &self.attached_thread)
            .field("has_context", &self.has_context)
            .finish_non_exhaustive()
    }
}

impl Window {
    pub(crate) fn new(
        proxy: WindowProxy,
        surface: Box<dyn RenderSurface>,
        capacity: usize,
        overflow: OverflowPolicy,
        has_context: bool,
    ) -> Self {
        Self {
            proxy,
            surface,
            front: EventQueue::with_overflow_policy(capacity, overflow),
            attached_thread: None,
            has_context,
            timer: FrameTimer::new(),
            key_handlers: Vec::new(),
        }
    }

    /// Cloneable handle usable from other threads
    pub fn proxy(&self) -> WindowProxy {
        self.proxy.clone()
    }

    /// Thread currently holding this window's context, if any
    pub fn attached_thread_id(&self) -> Option<ThreadId> {
        self.attached_thread
    }

    /// Attach the window's context to the calling thread
    ///
    /// Binding again from the same thread does nothing.
    ///
    /// # Panics
    ///
    /// Panics if the context is bound to another thread; it must be unbound
    /// there first.
    pub fn bind(&mut self) {
        let current = thread::current().id();
        match self.attached_thread {
            None => {
                if self.has_context {
                    self.surface.make_current();
                }
                self.attached_thread = Some(current);
                log::debug!("(Window) Context {:?} attached to {:?} (+)", self.proxy.id(), current);
            }
            Some(attached) if attached == current => {}
            Some(attached) => {
                log::error!(
                    "(Window) Context {:?} already attached to {:?}, cannot attach to {:?}",
                    self.proxy.id(),
                    attached,
                    current
                );
                panic!(
                    "window context {:?} is bound to thread {:?}, cannot bind to thread {:?}",
                    self.proxy.id(),
                    attached,
                    current
                );
            }
        }
    }

    /// Detach the window's context from the calling thread
    ///
    /// Unbinding an unbound window does nothing.
    ///
    /// # Panics
    ///
    /// Panics if the context is bound to another thread; only that thread
    /// can release it.
    pub fn unbind(&mut self) {
        let Some(attached) = self.attached_thread else {
            return;
        };

        let current = thread::current().id();
        if attached != current {
            log::error!(
                "(Window) Context {:?} attached to {:?}, cannot detach from {:?}",
                self.proxy.id(),
                attached,
                current
            );
            panic!(
                "window context {:?} is bound to thread {:?}, cannot unbind from thread {:?}",
                self.proxy.id(),
                attached,
                current
            );
        }

        if self.has_context {
            self.surface.clear_current();
        }
        self.attached_thread = None;
        log::debug!("(Window) Context {:?} detached (-)", self.proxy.id());
    }

    /// Swap in every event received since the last poll
    ///
    /// Queued tasks run first. The returned queue holds the new events,
    /// oldest first, and stays valid until the next `poll`. Key handlers
    /// registered as [`KeyAction::Callback`] fire for each press found.
    pub fn poll(&mut self) -> &EventQueue {
        self.process_queued_tasks();

        {
            let mut buffers = lock(&self.proxy.shared().events);
            self.front.swap(&mut buffers.back);
            buffers.back.reset();
        }

        self.dispatch_key_callbacks();
        &self.front
    }

    /// Events returned by the last [`poll`](Self::poll)
    pub fn events(&self) -> &EventQueue {
        &self.front
    }

    /// Deliver an event as if it came from the backend
    ///
    /// Updates the cached properties and queues the event for the next poll.
    pub fn push_event(&self, event: Event) {
        self.proxy.shared().push_event(event);
    }

    /// Run every task queued through [`WindowProxy::enqueue_task`]
    ///
    /// Tasks queued while draining run on the next call. A panicking task is
    /// logged and the remaining tasks still run.
    pub fn process_queued_tasks(&self) {
        for task in self.proxy.shared().take_tasks() {
            run_guarded("Window", task);
        }
    }

    /// Change the capacity of both event buffers, keeping the newest events
    pub fn resize_event_queue(&mut self, capacity: usize) {
        self.proxy.shared().resize_back(capacity);
        self.front.resize(capacity, ResizePolicy::DiscardOld);
    }

    /// Ask the run loop to stop after the current frame
    pub fn request_close(&mut self) {
        self.surface.set_should_close(true);
        self.proxy.request_close();
    }

    /// Whether closing was requested by the user or the application
    pub fn should_close(&self) -> bool {
        self.surface.should_close() || self.proxy.shared().close_requested.load(Ordering::SeqCst)
    }

    /// Seconds between the two most recent frames
    pub fn delta_time(&self) -> f64 {
        self.timer.delta_time()
    }

    /// Frame timing statistics
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Present the frame and advance the frame timer, for hand-written loops
    ///
    /// Returns the new delta time in seconds.
    pub fn display(&mut self) -> f64 {
        if self.has_context {
            self.surface.swap_buffers();
        }
        self.timer.update();
        self.timer.delta_time()
    }

    /// Register a handler for one or more keys
    ///
    /// A handler without modifiers fires on unmodified presses (callback) or
    /// regardless of modifiers (continuous); otherwise any of `mods` must be
    /// held.
    pub fn add_key_handler<F>(
        &mut self,
        keys: &[KeyCode],
        mods: ModifierKey,
        action: KeyAction,
        handler: F,
    ) -> &mut Self
    where
        F: FnMut(&mut Window) + Send + 'static,
    {
        self.key_handlers.push(KeyHandler {
            keys: keys.to_vec(),
            mods,
            action,
            handler: Box::new(handler),
        });
        self
    }

    /// Remove every key handler
    pub fn clear_key_handlers(&mut self) {
        self.key_handlers.clear();
    }

    /// Render loop: binds the context, then calls `frame` until closing is requested
    ///
    /// Each iteration holds the frame lock while it advances the timer, runs
    /// continuous key handlers, drains queued tasks and calls `frame`. The
    /// buffers are presented after the lock is released.
    pub fn run<F>(&mut self, mut frame: F)
    where
        F: FnMut(&mut Window),
    {
        self.bind();

        while !self.should_close() {
            let shared = Arc::clone(self.proxy.shared());
            {
                let _frame = shared.begin_frame();
                self.timer.update();
                self.dispatch_continuous_keys();
                self.process_queued_tasks();
                frame(self);
            }

            if self.has_context {
                self.surface.swap_buffers();
            }
        }
    }

    /// Release the window now instead of at the end of its scope
    pub fn destroy(self) {
        drop(self);
    }

    fn with_handlers(&mut self, mut visit: impl FnMut(&mut KeyHandler, &mut Window)) {
        let mut handlers = std::mem::take(&mut self.key_handlers);
        for handler in &mut handlers {
            visit(handler, self);
        }
        // keep handlers added while dispatching
        handlers.append(&mut self.key_handlers);
        self.key_handlers = handlers;
    }

    fn dispatch_key_callbacks(&mut self) {
        if self.key_handlers.is_empty() {
            return;
        }

        let presses: Vec<(KeyCode, ModifierKey)> = self
            .front
            .iter()
            .filter_map(|event| match event {
                Event::KeyPressed { key, state: KeyState::Press, mods, .. } => Some((*key, *mods)),
                _ => None,
            })
            .collect();

        for (key, mods) in presses {
            self.with_handlers(|handler, window| {
                if handler.matches_press(key, mods) {
                    (handler.handler)(window);
                }
            });
        }
    }

    fn dispatch_continuous_keys(&mut self) {
        if self.key_handlers.is_empty() {
            return;
        }

        let held = self.proxy.properties().key_state;
        let mods = ModifierKey::from_key_state(&held);
        self.with_handlers(|handler, window| {
            if handler.matches_held(&held, mods) {
                (handler.handler)(window);
            }
        });
    }
}

impl Deref for Window {
    type Target = WindowProxy;

    fn deref(&self) -> &WindowProxy {
        &self.proxy
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.attached_thread == Some(thread::current().id()) {
            self.unbind();
        }
        self.proxy.manager().request_delete_window(self.proxy.id());
    }
}

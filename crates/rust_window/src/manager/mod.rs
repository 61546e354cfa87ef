//! Window manager
//!
//! The [`Manager`] lives on one thread for its whole life, normally the main
//! thread, because native windowing systems only allow window creation and
//! event pumping there. It owns every native window and is the only place
//! native setters run. Other threads reach it through a [`ManagerHandle`]:
//! requests are filed into inboxes and executed during the next
//! [`poll_events`](Manager::poll_events) or [`wait_events`](Manager::wait_events).
//!
//! Each pump has three steps:
//!
//! 1. the backend is pumped and every native event is routed to its window,
//!    with relative deltas filled in and the interceptor consulted;
//! 2. monitor changes are broadcast to all windows;
//! 3. the inboxes are drained: deletions, then window tasks, then general
//!    tasks.

mod inbox;

pub use inbox::ManagerHandle;

use crate::backend::{GlfwPlatform, NativeWindow, Platform};
use crate::config::WindowHint;
use crate::event::{Event, EventInterceptor};
use crate::instance::{Instance, InstanceError};
use crate::task::run_guarded;
use crate::window::proxy::WindowShared;
use crate::window::{CursorPosition, Dimensions, Position, Properties, Window, WindowAttributes, WindowProxy};
use inbox::Inbox;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use thiserror::Error;

slotmap::new_key_type! {
    /// Identifier of a native window owned by a [`Manager`]
    ///
    /// Versioned: the id of a destroyed window never matches a window created
    /// later in the same slot.
    pub struct WindowId;
}

/// Window manager errors
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Manager used from a thread other than the one that created it
    #[error("Manager attached to thread {attached:?} was accessed from thread {current:?}")]
    WrongThread {
        /// Thread the manager belongs to
        attached: ThreadId,
        /// Thread that made the call
        current: ThreadId,
    },

    /// The backend could not create a window
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    /// Instance could not be set up
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;

struct ManagedWindow<W> {
    native: W,
    core: Weak<WindowShared>,
}

/// Owner of every native window of an [`Instance`]
pub struct Manager<P: Platform = GlfwPlatform> {
    windows: SlotMap<WindowId, ManagedWindow<P::Window>>,
    attached_thread: ThreadId,
    inbox: Arc<Inbox>,
    interceptor: Option<Box<dyn EventInterceptor + Send>>,
    monitors: Vec<String>,
    // last: windows must go before the backend shuts down
    instance: Instance<P>,
}

impl<P: Platform> std::fmt::Debug for Manager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("windows", &self.windows.len())
            .field("attached_thread", &self.attached_thread)
            .field("monitors", &self.monitors)
            .finish_non_exhaustive()
    }
}

impl Manager<GlfwPlatform> {
    /// Initialise GLFW and create a manager on the calling thread
    pub fn init(config: crate::config::InstanceConfig) -> ManagerResult<Self> {
        Ok(Self::new(Instance::init(config)?))
    }
}

impl<P: Platform> Manager<P> {
    /// Create a manager bound to the calling thread for its whole life
    pub fn new(mut instance: Instance<P>) -> Self {
        let monitors = instance.platform_mut().monitors();
        let attached_thread = thread::current().id();
        log::debug!("(WindowManager) Created on {:?}", attached_thread);

        Self {
            windows: SlotMap::with_key(),
            attached_thread,
            inbox: Arc::new(Inbox::new()),
            interceptor: None,
            monitors,
            instance,
        }
    }

    /// Thread this manager belongs to
    pub fn attached_thread_id(&self) -> ThreadId {
        self.attached_thread
    }

    /// The instance this manager was created from
    pub fn instance(&self) -> &Instance<P> {
        &self.instance
    }

    /// Cloneable handle for filing requests from other threads
    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle::new(Arc::clone(&self.inbox))
    }

    /// Check that the calling thread may use this manager
    ///
    /// With `check_thread` false any thread is accepted.
    pub fn validate_access(&self, check_thread: bool) -> ManagerResult<()> {
        let current = thread::current().id();
        if check_thread && current != self.attached_thread {
            return Err(ManagerError::WrongThread { attached: self.attached_thread, current });
        }
        Ok(())
    }

    /// Create a window
    ///
    /// The graphics loader from the instance configuration runs with the new
    /// context current. The window's context stays bound to the calling thread
    /// unless `bind_immediately` is false, in which case the window can be
    /// sent to another thread and bound there.
    pub fn create_window(
        &mut self,
        hint: &WindowHint,
        title: &str,
        width: u32,
        height: u32,
        bind_immediately: bool,
    ) -> ManagerResult<Window> {
        self.validate_access(true)?;

        let config = self.instance.config().clone();
        let mut native = self
            .instance
            .platform_mut()
            .create_window(hint, &config.api, title, width, height)
            .map_err(|e| {
                log::error!("(WindowManager) Window creation failed: {}", e);
                ManagerError::WindowCreation(e.to_string())
            })?;

        let has_context = config.api.has_context();
        let mut surface = native.render_surface();
        if has_context {
            surface.make_current();
            if let Some(loader) = &config.gl_loader {
                loader.load(&mut |name| native.get_proc_address(name));
            }
        }

        let properties = initial_properties(&native, hint, title);
        let shared = Arc::new(WindowShared::new(
            properties,
            config.event_queue_capacity,
            config.overflow_policy,
        ));
        let id = self.windows.insert(ManagedWindow {
            native,
            core: Arc::downgrade(&shared),
        });
        self.inbox.register(id);
        log::info!("(WindowManager) Window {:?} created", id);

        if has_context && !bind_immediately {
            // made current above for the loader
            surface.clear_current();
        }

        let proxy = WindowProxy::new(id, shared, self.handle());
        let mut window = Window::new(
            proxy,
            surface,
            config.event_queue_capacity,
            config.overflow_policy,
            has_context,
        );
        if bind_immediately {
            window.bind();
        }

        Ok(window)
    }

    /// Ask for a window to be destroyed on the next drain
    pub fn request_delete_window(&self, id: WindowId) {
        self.handle().request_delete_window(id);
    }

    /// Run `task` against the native window `id` on the next drain
    pub fn enqueue_window_task<F>(&self, id: WindowId, task: F)
    where
        F: FnOnce(&mut dyn NativeWindow) + Send + 'static,
    {
        self.handle().enqueue_window_task(id, task);
    }

    /// Run `task` on the next drain
    pub fn enqueue_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle().enqueue_task(task);
    }

    /// Install a hook that sees every event before its window does
    pub fn set_event_interceptor<I>(&mut self, interceptor: I) -> ManagerResult<()>
    where
        I: EventInterceptor + Send + 'static,
    {
        self.validate_access(true)?;
        self.interceptor = Some(Box::new(interceptor));
        Ok(())
    }

    /// Remove the event interceptor, if any
    pub fn clear_event_interceptor(&mut self) -> ManagerResult<()> {
        self.validate_access(true)?;
        self.interceptor = None;
        Ok(())
    }

    /// Whether any window is still open and not asked to close
    pub fn has_window_opened(&self) -> ManagerResult<bool> {
        self.validate_access(true)?;
        Ok(self.windows.values().any(|managed| {
            !managed.native.should_close()
                && managed
                    .core
                    .upgrade()
                    .is_some_and(|core| !core.close_requested.load(Ordering::SeqCst))
        }))
    }

    /// Number of native windows alive
    pub fn window_count(&self) -> ManagerResult<usize> {
        self.validate_access(true)?;
        Ok(self.windows.len())
    }

    /// Process pending events and requests without blocking
    ///
    /// With a `poll_rate`, the call returns no earlier than `poll_rate` after
    /// it started, which caps the loop frequency.
    pub fn poll_events(&mut self, poll_rate: Option<Duration>) -> ManagerResult<()> {
        self.validate_access(true)?;
        let start = Instant::now();

        self.instance.platform_mut().poll_events();
        self.pump();

        if let Some(rate) = poll_rate {
            let deadline = start + rate;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
        Ok(())
    }

    /// Block until events arrive or `timeout` expires, then process them
    ///
    /// Requests filed from other threads do not wake the backend, so they
    /// are picked up at the next wakeup. Already pending requests skip the
    /// wait.
    pub fn wait_events(&mut self, timeout: Option<Duration>) -> ManagerResult<()> {
        self.validate_access(true)?;

        if self.inbox.has_pending() {
            self.instance.platform_mut().poll_events();
        } else {
            self.instance.platform_mut().wait_events(timeout);
        }
        self.pump();
        Ok(())
    }

    fn pump(&mut self) {
        self.route_events();
        self.check_monitors();
        self.check_tasks();
    }

    fn route_events(&mut self) {
        let Self { windows, interceptor, .. } = self;

        for (id, managed) in windows.iter_mut() {
            let core = managed.core.upgrade();
            managed.native.drain_events(&mut |mut event| {
                // window already dropped, deletion pending
                let Some(core) = &core else {
                    return;
                };
                core.resolve_deltas(&mut event);
                deliver(interceptor, core, id, event);
            });
        }
    }

    fn check_monitors(&mut self) {
        let current = self.instance.platform_mut().monitors();
        if current == self.monitors {
            return;
        }

        let previous = std::mem::replace(&mut self.monitors, current);
        for (name, connected) in monitor_changes(&previous, &self.monitors) {
            log::info!(
                "(WindowManager) Monitor {} {}",
                name,
                if connected { "connected" } else { "disconnected" }
            );
            for (id, managed) in &self.windows {
                if let Some(core) = managed.core.upgrade() {
                    let event = Event::MonitorConnected { name: name.clone(), connected };
                    deliver(&mut self.interceptor, &core, id, event);
                }
            }
        }
    }

    fn check_tasks(&mut self) {
        let pending = self.inbox.take();

        for id in pending.deletions {
            if let Some(managed) = self.windows.remove(id) {
                self.inbox.unregister(id);
                drop(managed);
                log::info!("(WindowManager) Window {:?} deleted", id);
            }
        }

        for (id, task) in pending.window_tasks {
            match self.windows.get_mut(id) {
                Some(managed) => {
                    let native: &mut dyn NativeWindow = &mut managed.native;
                    run_guarded("WindowManager", || task(native));
                }
                None => {
                    log::warn!("(WindowManager) Task for window {:?} dropped: window has been destroyed", id);
                }
            }
        }

        for task in pending.tasks {
            run_guarded("WindowManager", task);
        }
    }
}

impl<P: Platform> Drop for Manager<P> {
    fn drop(&mut self) {
        // queued closures may own windows; drop them outside the inbox lock
        let leftover = self.inbox.close();
        drop(leftover);

        for managed in self.windows.values() {
            if let Some(core) = managed.core.upgrade() {
                core.close_requested.store(true, Ordering::SeqCst);
            }
        }
        log::debug!("(WindowManager) Destroying {} window(s)", self.windows.len());
        self.windows.clear();
    }
}

fn deliver(
    interceptor: &mut Option<Box<dyn EventInterceptor + Send>>,
    core: &WindowShared,
    id: WindowId,
    mut event: Event,
) {
    if let Some(interceptor) = interceptor {
        if !interceptor.intercept(id, &mut event) {
            return;
        }
    }
    core.push_event(event);
}

/// Connects and disconnects between two monitor lists, disconnects first
///
/// Names are compared as a multiset: identical panels share a name, so
/// plugging a second one in is still a connect.
fn monitor_changes(previous: &[String], current: &[String]) -> Vec<(String, bool)> {
    let mut balance: HashMap<&str, isize> = HashMap::new();
    for name in previous {
        *balance.entry(name.as_str()).or_default() -= 1;
    }
    for name in current {
        *balance.entry(name.as_str()).or_default() += 1;
    }

    let mut changes = Vec::new();
    for (names, connected) in [(previous, false), (current, true)] {
        for name in names {
            let Some(delta) = balance.get_mut(name.as_str()) else {
                continue;
            };
            let count = if connected { *delta } else { -*delta };
            if count > 0 {
                changes.extend(std::iter::repeat((name.clone(), connected)).take(count.unsigned_abs()));
                *delta = 0;
            }
        }
    }
    changes
}

fn initial_properties<W: NativeWindow>(native: &W, hint: &WindowHint, title: &str) -> Properties {
    let snapshot = native.snapshot();

    let mut attributes = WindowAttributes::empty();
    attributes.set(WindowAttributes::VISIBLE, hint.visible);
    attributes.set(WindowAttributes::FOCUSED, hint.visible && hint.focused);
    attributes.set(WindowAttributes::MAXIMIZED, hint.maximized);
    attributes.set(WindowAttributes::RESIZABLE, hint.resizable);
    attributes.set(WindowAttributes::FLOATING, hint.floating);
    attributes.set(WindowAttributes::HOVERED, snapshot.hovered);

    Properties {
        title: title.to_string(),
        position: Position { x: snapshot.position.0, y: snapshot.position.1 },
        dimensions: Dimensions { width: snapshot.size.0, height: snapshot.size.1 },
        framebuffer_size: Dimensions {
            width: snapshot.framebuffer_size.0,
            height: snapshot.framebuffer_size.1,
        },
        cursor: CursorPosition { x: snapshot.cursor.0, y: snapshot.cursor.1 },
        attributes,
        ..Properties::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_monitor_changes_by_name() {
        let changes = monitor_changes(&names(&["DP-1", "HDMI-1"]), &names(&["HDMI-1", "DP-2"]));
        assert_eq!(changes, vec![("DP-1".to_string(), false), ("DP-2".to_string(), true)]);
    }

    #[test]
    fn test_monitor_changes_counts_duplicate_names() {
        let panel = names(&["Generic PnP"]);
        let pair = names(&["Generic PnP", "Generic PnP"]);

        assert_eq!(monitor_changes(&panel, &pair), vec![("Generic PnP".to_string(), true)]);
        assert_eq!(monitor_changes(&pair, &panel), vec![("Generic PnP".to_string(), false)]);
        assert_eq!(
            monitor_changes(&pair, &[]),
            vec![("Generic PnP".to_string(), false), ("Generic PnP".to_string(), false)]
        );
        assert!(monitor_changes(&pair, &pair).is_empty());
    }
}

//! Cross-thread request queues drained by the manager thread

use super::WindowId;
use crate::backend::NativeWindow;
use crate::lock;
use crate::task::Task;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Operation on a native window, run on the manager thread
pub(crate) type WindowTask = Box<dyn FnOnce(&mut dyn NativeWindow) + Send>;

/// Requests accumulated since the last drain
#[derive(Default)]
pub(crate) struct Pending {
    pub(crate) deletions: VecDeque<WindowId>,
    pub(crate) window_tasks: VecDeque<(WindowId, WindowTask)>,
    pub(crate) tasks: VecDeque<Task>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.window_tasks.is_empty() && self.tasks.is_empty()
    }
}

#[derive(Default)]
struct InboxState {
    open: bool,
    live: HashSet<WindowId>,
    pending: Pending,
}

/// The three manager inboxes behind a single mutex
///
/// Closures are never dropped while the mutex is held: a closure may own a
/// `Window`, whose drop files a deletion request through this same inbox.
pub(crate) struct Inbox {
    state: Mutex<InboxState>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(InboxState { open: true, ..InboxState::default() }),
        }
    }

    pub(crate) fn register(&self, id: WindowId) {
        lock(&self.state).live.insert(id);
    }

    pub(crate) fn unregister(&self, id: WindowId) {
        lock(&self.state).live.remove(&id);
    }

    /// Queue a deletion; only accepted for live windows, at most once
    pub(crate) fn request_delete(&self, id: WindowId) -> bool {
        let mut state = lock(&self.state);
        if state.open && state.live.contains(&id) && !state.pending.deletions.contains(&id) {
            state.pending.deletions.push_back(id);
            true
        } else {
            false
        }
    }

    pub(crate) fn push_window_task(&self, id: WindowId, task: WindowTask) {
        let rejected = {
            let mut state = lock(&self.state);
            if state.open {
                state.pending.window_tasks.push_back((id, task));
                None
            } else {
                Some(task)
            }
        };
        if rejected.is_some() {
            log::debug!("(WindowManager) Manager is gone, window task for {:?} dropped", id);
        }
    }

    pub(crate) fn push_task(&self, task: Task) {
        let rejected = {
            let mut state = lock(&self.state);
            if state.open {
                state.pending.tasks.push_back(task);
                None
            } else {
                Some(task)
            }
        };
        if rejected.is_some() {
            log::debug!("(WindowManager) Manager is gone, task dropped");
        }
    }

    /// Swap out everything queued so far
    pub(crate) fn take(&self) -> Pending {
        std::mem::take(&mut lock(&self.state).pending)
    }

    /// Stop accepting requests; returns whatever was still queued
    pub(crate) fn close(&self) -> Pending {
        let mut state = lock(&self.state);
        state.open = false;
        state.live.clear();
        std::mem::take(&mut state.pending)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !lock(&self.state).pending.is_empty()
    }
}

/// Cloneable, thread-safe access to a manager's inboxes
///
/// Everything filed here is executed by the manager thread during its next
/// `poll_events`/`wait_events`. Requests made after the manager is dropped
/// are discarded.
#[derive(Clone)]
pub struct ManagerHandle {
    inbox: Arc<Inbox>,
}

impl std::fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerHandle").finish_non_exhaustive()
    }
}

impl ManagerHandle {
    pub(crate) fn new(inbox: Arc<Inbox>) -> Self {
        Self { inbox }
    }

    /// Ask the manager to destroy a native window
    ///
    /// Ignored for windows that are unknown or already scheduled for deletion.
    pub fn request_delete_window(&self, id: WindowId) {
        if !self.inbox.request_delete(id) {
            log::debug!("(WindowManager) Delete request for {:?} ignored", id);
        }
    }

    /// Run `task` against the native window `id` on the manager thread
    ///
    /// If the window is gone by the time the task is drained, the task is
    /// dropped with a warning.
    pub fn enqueue_window_task<F>(&self, id: WindowId, task: F)
    where
        F: FnOnce(&mut dyn NativeWindow) + Send + 'static,
    {
        self.inbox.push_window_task(id, Box::new(task));
    }

    /// Run `task` on the manager thread
    pub fn enqueue_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inbox.push_task(Box::new(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<WindowId> {
        let mut map = SlotMap::<WindowId, ()>::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_delete_only_live_windows_once() {
        let inbox = Inbox::new();
        let ids = ids(2);
        inbox.register(ids[0]);

        assert!(inbox.request_delete(ids[0]));
        assert!(!inbox.request_delete(ids[0]));
        assert!(!inbox.request_delete(ids[1]));

        let pending = inbox.take();
        assert_eq!(pending.deletions, VecDeque::from(vec![ids[0]]));
        assert!(!inbox.has_pending());
    }

    #[test]
    fn test_take_preserves_order() {
        let inbox = Arc::new(Inbox::new());
        let handle = ManagerHandle::new(Arc::clone(&inbox));
        let log = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let log = Arc::clone(&log);
            handle.enqueue_task(move || log.lock().unwrap().push(n));
        }

        for task in inbox.take().tasks {
            task();
        }
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_closed_inbox_drops_requests() {
        let inbox = Arc::new(Inbox::new());
        let handle = ManagerHandle::new(Arc::clone(&inbox));
        let id = ids(1)[0];
        inbox.register(id);
        handle.enqueue_task(|| {});

        let leftover = inbox.close();
        assert_eq!(leftover.tasks.len(), 1);

        handle.enqueue_task(|| {});
        handle.enqueue_window_task(id, |_| {});
        handle.request_delete_window(id);
        assert!(!inbox.has_pending());
    }
}

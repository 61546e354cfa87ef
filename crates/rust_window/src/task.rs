//! Deferred closures shuttled between threads

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A unit of work queued for another thread
pub(crate) type Task = Box<dyn FnOnce() + Send>;

/// Run a queued closure, logging instead of unwinding if it panics
///
/// Returns whether the closure completed.
pub(crate) fn run_guarded<F: FnOnce()>(owner: &str, task: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(payload) => {
            log::error!("({}) Task panicked: {}", owner, panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_guarded_completes() {
        let mut ran = false;
        assert!(run_guarded("test", || ran = true));
        assert!(ran);
    }

    #[test]
    fn test_run_guarded_catches_panic() {
        assert!(!run_guarded("test", || panic!("boom")));
        assert!(!run_guarded("test", || panic!("{}", String::from("formatted"))));
    }
}

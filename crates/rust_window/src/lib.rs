//! # Rust Window
//!
//! A threaded windowing layer over GLFW.
//!
//! ## Features
//!
//! - **Thread Split**: native windows stay on the manager thread, rendering
//!   happens on any thread
//! - **Double-Buffered Events**: lock-light hand-off through fixed-capacity
//!   ring buffers
//! - **Cross-Thread Tasks**: closures queued to the manager or a window's
//!   render thread
//! - **Cached Properties**: position, size, focus and input state tracked from
//!   events
//! - **Headless Backend**: drive the whole stack without a display
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_window::prelude::*;
//! use std::thread;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     rust_window::logging::init();
//!     let mut manager = Manager::init(InstanceConfig::default())?;
//!
//!     let mut window = manager.create_window(&WindowHint::default(), "Demo", 800, 600, false)?;
//!     window.add_key_handler(&[KeyCode::Escape], ModifierKey::empty(), KeyAction::Callback, |w| {
//!         w.request_close();
//!     });
//!
//!     let render = thread::spawn(move || {
//!         window.run(|window| {
//!             for event in window.poll() {
//!                 log::trace!("{}", event.name());
//!             }
//!         });
//!     });
//!
//!     while !render.is_finished() {
//!         manager.poll_events(Some(std::time::Duration::from_millis(4)))?;
//!     }
//!     // the dropped window's deletion request
//!     manager.poll_events(None)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod event;
pub mod input;
pub mod instance;
pub mod logging;
pub mod manager;
pub mod window;

mod task;

#[cfg(test)]
mod tests;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a panicking task poisoned it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        backend::{GlfwPlatform, HeadlessPlatform, NativeWindow, Platform},
        config::{ApiConfig, Config, GlProfile, InstanceConfig, WindowHint},
        event::{Event, EventInterceptor, EventQueue, OverflowPolicy, ResizePolicy},
        input::{KeyCode, KeyState, ModifierKey, MouseButton, MouseButtonState},
        instance::{Instance, InstanceError},
        manager::{Manager, ManagerError, ManagerHandle, WindowId},
        window::{KeyAction, Properties, Window, WindowProxy},
    };
}

//! GLFW windowing backend
//!
//! Wraps the `glfw` crate. Native events arrive through each window's
//! receiver and are translated into [`Event`]s when the manager drains them.
//! The render surface is GLFW's render context, which is the only part of a
//! GLFW window that may leave the main thread.

use super::{BackendError, BackendResult, NativeWindow, Platform, RenderSurface, WindowSnapshot};
use crate::config::{ApiConfig, GlProfile, ProcAddress, WindowHint};
use crate::event::Event;
use crate::input::{KeyCode, KeyState, ModifierKey, MouseButton, MouseButtonState};
use glfw::Context;
use crate::lock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Numerator/denominator value GLFW reads as "don't care" once cast to a C int
const DONT_CARE: u32 = u32::MAX;

fn log_glfw_error(error: glfw::Error, description: String) {
    log::error!("GLFW error {:?}: {}", error, description);
}

/// GLFW library handle
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
}

impl GlfwPlatform {
    /// Initialise GLFW; errors reported later by GLFW are logged
    pub fn new() -> BackendResult<Self> {
        let glfw = glfw::init(log_glfw_error)
            .map_err(|e| BackendError::InitializationFailed(format!("{:?}", e)))?;
        log::info!("GLFW {} initialized", glfw::get_version_string());

        Ok(Self { glfw })
    }

    fn apply_hints(&mut self, hint: &WindowHint, api: &ApiConfig) {
        use glfw::WindowHint as Hint;

        self.glfw.default_window_hints();
        self.glfw.window_hint(Hint::Resizable(hint.resizable));
        self.glfw.window_hint(Hint::Visible(hint.visible));
        self.glfw.window_hint(Hint::Decorated(hint.decorated));
        self.glfw.window_hint(Hint::Focused(hint.focused));
        self.glfw.window_hint(Hint::Floating(hint.floating));
        self.glfw.window_hint(Hint::Maximized(hint.maximized));
        self.glfw.window_hint(Hint::AutoIconify(hint.auto_iconify));
        self.glfw.window_hint(Hint::FocusOnShow(hint.focus_on_show));
        self.glfw.window_hint(Hint::Samples(hint.samples));

        match *api {
            ApiConfig::NoApi => {
                self.glfw.window_hint(Hint::ClientApi(glfw::ClientApiHint::NoApi));
            }
            ApiConfig::OpenGl { major, minor, profile } => {
                self.glfw.window_hint(Hint::ClientApi(glfw::ClientApiHint::OpenGl));
                self.glfw.window_hint(Hint::ContextVersion(major, minor));
                let profile = match profile {
                    GlProfile::Any => glfw::OpenGlProfileHint::Any,
                    GlProfile::Core => glfw::OpenGlProfileHint::Core,
                    GlProfile::Compat => glfw::OpenGlProfileHint::Compat,
                };
                self.glfw.window_hint(Hint::OpenGlProfile(profile));
                if cfg!(target_os = "macos") {
                    self.glfw.window_hint(Hint::OpenGlForwardCompat(true));
                }
            }
            ApiConfig::OpenGlEs { major, minor } => {
                self.glfw.window_hint(Hint::ClientApi(glfw::ClientApiHint::OpenGlEs));
                self.glfw.window_hint(Hint::ContextVersion(major, minor));
            }
        }
    }
}

impl Platform for GlfwPlatform {
    type Window = GlfwWindow;

    fn create_window(
        &mut self,
        hint: &WindowHint,
        api: &ApiConfig,
        title: &str,
        width: u32,
        height: u32,
    ) -> BackendResult<GlfwWindow> {
        self.apply_hints(hint, api);

        let (mut window, events) = self
            .glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(BackendError::CreationFailed)?;
        window.set_all_polling(true);

        Ok(GlfwWindow {
            window: Some(window),
            events,
            alive: Arc::new(Mutex::new(true)),
        })
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    fn wait_events(&mut self, timeout: Option<Duration>) {
        match timeout {
            Some(timeout) => self.glfw.wait_events_timeout(timeout.as_secs_f64()),
            None => self.glfw.wait_events(),
        }
    }

    fn monitors(&mut self) -> Vec<String> {
        self.glfw.with_connected_monitors(|_, monitors| {
            monitors
                .iter()
                .map(|monitor| monitor.get_name().unwrap_or_default())
                .collect()
        })
    }
}

/// A GLFW window and its event receiver
///
/// The native window is destroyed while holding the lock its render surface
/// takes for every call, so a surface never touches a half-destroyed window.
pub struct GlfwWindow {
    window: Option<glfw::PWindow>,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    alive: Arc<Mutex<bool>>,
}

impl GlfwWindow {
    fn native(&mut self, apply: impl FnOnce(&mut glfw::PWindow)) {
        if let Some(window) = self.window.as_mut() {
            apply(window);
        }
    }
}

impl Drop for GlfwWindow {
    fn drop(&mut self) {
        let mut alive = lock(&self.alive);
        *alive = false;
        drop(self.window.take());
    }
}

impl NativeWindow for GlfwWindow {
    fn drain_events(&mut self, sink: &mut dyn FnMut(Event)) {
        for (_, event) in glfw::flush_messages(&self.events) {
            if let Some(event) = translate_event(event) {
                sink(event);
            }
        }
    }

    fn render_surface(&mut self) -> Box<dyn RenderSurface> {
        let context = self.window.as_mut().map(|window| window.render_context());
        Box::new(GlfwSurface {
            context,
            alive: Arc::clone(&self.alive),
        })
    }

    fn snapshot(&self) -> WindowSnapshot {
        self.window
            .as_ref()
            .map(|window| WindowSnapshot {
                position: window.get_pos(),
                size: window.get_size(),
                framebuffer_size: window.get_framebuffer_size(),
                cursor: window.get_cursor_pos(),
                hovered: window.is_hovered(),
            })
            .unwrap_or_default()
    }

    fn should_close(&self) -> bool {
        self.window.as_ref().map_or(true, |window| window.should_close())
    }

    fn get_proc_address(&mut self, name: &str) -> ProcAddress {
        self.window
            .as_mut()
            .map_or(std::ptr::null(), |window| window.get_proc_address(name))
    }

    fn set_title(&mut self, title: &str) {
        self.native(|window| window.set_title(title));
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.native(|window| window.set_size(width, height));
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.native(|window| window.set_pos(x, y));
    }

    fn iconify(&mut self) {
        self.native(|window| window.iconify());
    }

    fn restore(&mut self) {
        self.native(|window| window.restore());
    }

    fn maximize(&mut self) {
        self.native(|window| window.maximize());
    }

    fn show(&mut self) {
        self.native(|window| window.show());
    }

    fn hide(&mut self) {
        self.native(|window| window.hide());
    }

    fn focus(&mut self) {
        self.native(|window| window.focus());
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let mode = if captured { glfw::CursorMode::Disabled } else { glfw::CursorMode::Normal };
        self.native(|window| window.set_cursor_mode(mode));
    }

    fn set_aspect_ratio(&mut self, ratio: Option<(u32, u32)>) {
        let (numerator, denominator) = ratio.unwrap_or((DONT_CARE, DONT_CARE));
        self.native(|window| window.set_aspect_ratio(numerator, denominator));
    }
}

/// Render context of a GLFW window
///
/// Every call holds the window's liveness lock, and calls become no-ops once
/// the owning window has been destroyed.
struct GlfwSurface {
    context: Option<glfw::PRenderContext>,
    alive: Arc<Mutex<bool>>,
}

impl GlfwSurface {
    fn with_context<R>(&mut self, fallback: R, apply: impl FnOnce(&mut glfw::PRenderContext) -> R) -> R {
        let alive = lock(&self.alive);
        match self.context.as_mut() {
            Some(context) if *alive => apply(context),
            _ => fallback,
        }
    }
}

impl RenderSurface for GlfwSurface {
    fn make_current(&mut self) {
        self.with_context((), |context| context.make_current());
    }

    fn clear_current(&mut self) {
        glfw::make_context_current(None);
    }

    fn swap_buffers(&mut self) {
        self.with_context((), |context| context.swap_buffers());
    }

    fn should_close(&self) -> bool {
        let alive = lock(&self.alive);
        match self.context.as_ref() {
            Some(context) if *alive => context.should_close(),
            _ => true,
        }
    }

    fn set_should_close(&mut self, value: bool) {
        self.with_context((), |context| context.set_should_close(value));
    }
}

fn translate_modifiers(mods: glfw::Modifiers) -> ModifierKey {
    let mut result = ModifierKey::empty();
    result.set(ModifierKey::SHIFT, mods.contains(glfw::Modifiers::Shift));
    result.set(ModifierKey::CONTROL, mods.contains(glfw::Modifiers::Control));
    result.set(ModifierKey::ALT, mods.contains(glfw::Modifiers::Alt));
    result.set(ModifierKey::SUPER, mods.contains(glfw::Modifiers::Super));
    result.set(ModifierKey::CAPS_LOCK, mods.contains(glfw::Modifiers::CapsLock));
    result.set(ModifierKey::NUM_LOCK, mods.contains(glfw::Modifiers::NumLock));
    result
}

fn translate_key_state(action: glfw::Action) -> KeyState {
    match action {
        glfw::Action::Release => KeyState::Release,
        glfw::Action::Press => KeyState::Press,
        glfw::Action::Repeat => KeyState::Repeat,
    }
}

/// Convert a GLFW event; relative fields are left zero for the manager to fill
fn translate_event(event: glfw::WindowEvent) -> Option<Event> {
    use glfw::WindowEvent as E;

    let event = match event {
        E::Pos(x, y) => Event::window_moved(x, y),
        E::Size(width, height) => Event::window_resized(width, height),
        E::Close => Event::WindowClosed,
        E::Refresh => Event::WindowRefreshed,
        E::Focus(focused) => Event::WindowFocused { focused },
        E::Iconify(iconified) => Event::WindowIconified { iconified },
        E::Maximize(maximized) => Event::WindowMaximized { maximized },
        E::ContentScale(x, y) => Event::WindowScaleChanged { x, y },
        E::FramebufferSize(width, height) => Event::framebuffer_resized(width, height),
        E::MouseButton(button, action, mods) => Event::ButtonPressed {
            button: MouseButton::from_raw(button as i32)?,
            state: match action {
                glfw::Action::Release => MouseButtonState::Release,
                _ => MouseButtonState::Press,
            },
            mods: translate_modifiers(mods),
        },
        E::CursorPos(x, y) => Event::cursor_moved(x, y),
        E::CursorEnter(entered) => Event::CursorEntered { entered },
        E::Scroll(dx, dy) => Event::Scrolled { dx, dy },
        E::Key(key, scancode, action, mods) => Event::KeyPressed {
            key: KeyCode::from_raw(key as i32),
            scancode,
            state: translate_key_state(action),
            mods: translate_modifiers(mods),
        },
        E::Char(codepoint) => Event::CharInput { codepoint },
        E::FileDrop(files) => Event::FileDropped { files },
        _ => return None,
    };

    Some(event)
}

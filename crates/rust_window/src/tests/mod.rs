//! End-to-end scenarios on the headless backend

mod manager;

use crate::backend::{HeadlessController, HeadlessPlatform};
use crate::config::{InstanceConfig, WindowHint};
use crate::instance::Instance;
use crate::manager::Manager;
use crate::window::Window;
use crate::lock;
use std::sync::{Mutex, MutexGuard, Once, OnceLock};
use std::thread::{self, ThreadId};

/// env_logger output plus a per-thread record of warnings and errors
struct CaptureLogger {
    inner: env_logger::Logger,
    warnings: Mutex<Vec<(ThreadId, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if record.level() <= log::Level::Warn {
            lock(&self.warnings).push((thread::current().id(), record.args().to_string()));
        }
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();
static INSTALL: Once = Once::new();

fn install_logger() {
    INSTALL.call_once(|| {
        let logger = LOGGER.get_or_init(|| CaptureLogger {
            inner: env_logger::Builder::from_default_env().is_test(true).build(),
            warnings: Mutex::new(Vec::new()),
        });
        if log::set_logger(logger).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
}

/// Warnings and errors logged so far by the calling thread
pub(crate) fn warnings() -> Vec<String> {
    LOGGER.get().map_or_else(Vec::new, |logger| {
        let current = thread::current().id();
        lock(&logger.warnings)
            .iter()
            .filter(|(thread, _)| *thread == current)
            .map(|(_, message)| message.clone())
            .collect()
    })
}

/// A manager over a fresh headless platform
///
/// Holds the process-wide instance lock until dropped.
pub(crate) struct Harness {
    pub(crate) manager: Manager<HeadlessPlatform>,
    pub(crate) controller: HeadlessController,
    _serial: MutexGuard<'static, ()>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(InstanceConfig::no_api())
    }

    pub(crate) fn with_config(config: InstanceConfig) -> Self {
        install_logger();
        let serial = crate::instance::tests::serial();
        let platform = HeadlessPlatform::new();
        let controller = platform.controller();
        let instance = Instance::with_platform(platform, config).unwrap();

        Self {
            manager: Manager::new(instance),
            controller,
            _serial: serial,
        }
    }

    pub(crate) fn window(&mut self, bind: bool) -> Window {
        self.manager
            .create_window(&WindowHint::default(), "test", 640, 480, bind)
            .unwrap()
    }

    /// Two pumps: one runs queued native tasks, the next routes what they reported
    pub(crate) fn settle(&mut self) {
        self.manager.poll_events(None).unwrap();
        self.manager.poll_events(None).unwrap();
    }
}

//! Process-wide windowing instance
//!
//! Native windowing systems are process-global, so at most one [`Instance`]
//! may exist at a time. Dropping it shuts the backend down and allows a new
//! one to be initialised.

use crate::backend::{GlfwPlatform, Platform};
use crate::config::InstanceConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Instance errors
#[derive(Error, Debug)]
pub enum InstanceError {
    /// Another instance is still alive
    #[error("Windowing instance already initialized")]
    AlreadyInitialized,

    /// Backend could not be initialised
    #[error("Windowing instance initialization failed: {0}")]
    InitializationFailed(String),
}

/// Result type for instance operations
pub type InstanceResult<T> = Result<T, InstanceError>;

/// Claim on the process-wide instance slot, released on drop
struct InitGuard;

impl InitGuard {
    fn acquire() -> InstanceResult<Self> {
        INITIALIZED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self)
            .map_err(|_| InstanceError::AlreadyInitialized)
    }
}

impl Drop for InitGuard {
    fn drop(&mut self) {
        INITIALIZED.store(false, Ordering::Release);
        log::debug!("(Instance) Terminated");
    }
}

/// The initialised windowing system and its configuration
pub struct Instance<P: Platform = GlfwPlatform> {
    platform: P,
    config: InstanceConfig,
    // released only after the platform has shut down
    _guard: InitGuard,
}

impl<P: Platform> std::fmt::Debug for Instance<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Instance<GlfwPlatform> {
    /// Initialise GLFW
    ///
    /// Fails with [`InstanceError::AlreadyInitialized`] while another instance
    /// is alive.
    pub fn init(config: InstanceConfig) -> InstanceResult<Self> {
        let guard = InitGuard::acquire()?;
        let platform = GlfwPlatform::new().map_err(|e| {
            log::error!("(Instance) {}", e);
            InstanceError::InitializationFailed(e.to_string())
        })?;

        Ok(Self::from_parts(platform, config, guard))
    }
}

impl<P: Platform> Instance<P> {
    /// Initialise with an already constructed platform
    pub fn with_platform(platform: P, config: InstanceConfig) -> InstanceResult<Self> {
        let guard = InitGuard::acquire()?;
        Ok(Self::from_parts(platform, config, guard))
    }

    fn from_parts(platform: P, config: InstanceConfig, guard: InitGuard) -> Self {
        log::info!(
            "(Instance) Initialized: api {:?}, event queue capacity {}",
            config.api,
            config.event_queue_capacity
        );
        Self { platform, config, _guard: guard }
    }

    /// Whether an instance is currently alive in this process
    pub fn is_initialized() -> bool {
        INITIALIZED.load(Ordering::Acquire)
    }

    /// Configuration given at initialisation
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// The native windowing system
    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub(crate) fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

//! Configuration system
//!
//! Instance-wide settings and per-window creation hints. Both can be loaded
//! from and saved to TOML or RON files, picked by the file extension.

use crate::event::OverflowPolicy;
pub use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// On-disk encoding of a settings file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Settings that round-trip through a `.toml` or `.ron` file
///
/// Implemented by [`InstanceConfig`] and [`WindowHint`]. The format is
/// resolved before the file is touched, so an unknown extension never
/// reports an IO error.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from `path`
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path)?;
        log::debug!("(Config) Loading {:?} settings from {}", format, path.display());

        match format {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Write settings to `path`, replacing any existing file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Failure to load or save settings
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("settings file IO failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents do not describe these settings
    #[error("malformed settings: {0}")]
    Parse(String),

    /// The settings could not be encoded
    #[error("settings could not be encoded: {0}")]
    Serialize(String),

    /// Neither `.toml` nor `.ron`
    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),
}

/// OpenGL profile requested for desktop GL contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlProfile {
    /// Let the driver decide
    Any,
    /// Core profile
    #[default]
    Core,
    /// Compatibility profile
    Compat,
}

/// Graphics API the windows are created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiConfig {
    /// No client API; the caller brings its own (Vulkan, software)
    NoApi,
    /// Desktop OpenGL
    OpenGl {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
        /// Profile
        profile: GlProfile,
    },
    /// OpenGL ES
    OpenGlEs {
        /// Major version
        major: u32,
        /// Minor version
        minor: u32,
    },
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::OpenGl { major: 3, minor: 3, profile: GlProfile::Core }
    }
}

impl ApiConfig {
    /// Whether windows get a client API context at all
    pub fn has_context(&self) -> bool {
        !matches!(self, Self::NoApi)
    }
}

/// Raw address of a graphics API entry point
pub type ProcAddress = *const c_void;

type LoaderFn = dyn Fn(&mut dyn FnMut(&str) -> ProcAddress) + Send + Sync;

/// Graphics function loader run once per window, with its context current
///
/// The loader receives a resolver mapping a function name to its address,
/// typically forwarded to something like `gl::load_with`.
#[derive(Clone)]
pub struct GlLoader(Arc<LoaderFn>);

impl GlLoader {
    /// Wrap a loader function
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&mut dyn FnMut(&str) -> ProcAddress) + Send + Sync + 'static,
    {
        Self(Arc::new(loader))
    }

    /// Run the loader against a resolver
    pub fn load(&self, resolver: &mut dyn FnMut(&str) -> ProcAddress) {
        (self.0)(resolver);
    }
}

impl fmt::Debug for GlLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GlLoader")
    }
}

/// Settings fixed for the lifetime of an [`Instance`](crate::instance::Instance)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Graphics API for every window
    pub api: ApiConfig,
    /// Initial capacity of each window's event buffers
    pub event_queue_capacity: usize,
    /// Behaviour of each window's event buffers when full
    pub overflow_policy: OverflowPolicy,
    /// Loader invoked after each window's context is created
    #[serde(skip)]
    pub gl_loader: Option<GlLoader>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            event_queue_capacity: 128,
            overflow_policy: OverflowPolicy::default(),
            gl_loader: None,
        }
    }
}

impl InstanceConfig {
    /// Configuration for windows without a client API context
    pub fn no_api() -> Self {
        Self {
            api: ApiConfig::NoApi,
            ..Self::default()
        }
    }

    /// Attach a function loader
    pub fn with_gl_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&mut dyn FnMut(&str) -> ProcAddress) + Send + Sync + 'static,
    {
        self.gl_loader = Some(GlLoader::new(loader));
        self
    }
}

impl Config for InstanceConfig {}

/// Per-window creation hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowHint {
    /// User can resize the window
    pub resizable: bool,
    /// Window is shown on creation
    pub visible: bool,
    /// Window has a title bar and border
    pub decorated: bool,
    /// Window takes input focus on creation
    pub focused: bool,
    /// Window stays above other windows
    pub floating: bool,
    /// Window starts maximised
    pub maximized: bool,
    /// Fullscreen window minimises when it loses focus
    pub auto_iconify: bool,
    /// Window takes input focus when shown
    pub focus_on_show: bool,
    /// Multisample count, `None` for the backend default
    pub samples: Option<u32>,
}

impl Default for WindowHint {
    fn default() -> Self {
        Self {
            resizable: true,
            visible: true,
            decorated: true,
            focused: true,
            floating: false,
            maximized: false,
            auto_iconify: true,
            focus_on_show: true,
            samples: None,
        }
    }
}

impl Config for WindowHint {}

//! DeepBlue Core - Engine-independent logic for the globe viewer
//!
//! This crate holds everything the viewer does that does not need a GPU or a
//! browser:
//! - Viewer configuration (widget toggles, initial view, frozen clock, imagery)
//! - Bootstrap orchestration over the [`GlobeWidget`] seam
//! - Chrome suppression over the [`ChromeHost`] seam
//! - Model construction strategies and the [`AssetLoader`]
//! - The shared [`ViewerServices`] used by the toolbar and the loader host

pub mod bootstrap;
pub mod chrome;
pub mod clock;
pub mod config;
pub mod debug;
pub mod error;
pub mod geodesy;
pub mod input;
pub mod loader;
pub mod retry;
pub mod scene;
pub mod service;
pub mod strategy;

pub use bootstrap::{mount, BootstrapReport, GlobeWidget, Scene3dConfirmation, SetupStep};
pub use chrome::{ChromeHost, ChromeLocation, ChromeSuppressor, SuppressionReport};
pub use config::{load_config, EnvConfig, ViewerConfig};
pub use debug::{DebugSnapshot, DebugSurface, LoggingDebugSurface};
pub use error::{BlobError, ConfigError, LoadError, SetupError, StrategyFailure};
pub use input::FileFilter;
pub use loader::{
    AssetLoader, BlobStore, BlobUrl, FileInput, FramingOutcome, LoadEvent, ModelRegistry,
    ModelScene, Readiness,
};
pub use retry::{BoundedRetry, RetryState};
pub use scene::{BoundingSphere, CameraPose, Cartesian3, ModelHandle, SceneMode};
pub use service::{DialogHook, DialogOutcome, DialogRegistration, ViewerServices};
pub use strategy::{ConstructionStrategy, ModelRequest, ModelSource, SceneSelector};

//! Bevy application setup

use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;

use deepblue_core::{BlobUrl, EnvConfig, ViewerConfig, ViewerServices};
use deepblue_scene::DeepBlueScenePlugin;

use crate::blobs::MemoryBlobStore;
use crate::chrome::ChromePlugin;
use crate::file_picker::FilePickerPlugin;
use crate::globe_host::GlobeHostPlugin;
use crate::loader_host::LoaderHostPlugin;
use crate::toolbar::ToolbarPlugin;

pub const TITLE: &str = "DeepBlue";
pub const CANVAS_SELECTOR: &str = "#deepblue-canvas";

/// Configuration file looked up in the working directory on native builds
#[cfg(not(target_arch = "wasm32"))]
pub const CONFIG_FILE: &str = "viewer.toml";

const EMBEDDED_CONFIG: &str = include_str!("../assets/viewer.toml");

/// Configuration the viewer was mounted with
#[derive(Resource, Debug, Clone)]
pub struct ViewerSettings {
    pub config: ViewerConfig,
    pub env: EnvConfig,
}

impl ViewerSettings {
    pub fn load() -> Self {
        Self {
            config: read_config(),
            env: EnvConfig::from_build_env(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn read_config() -> ViewerConfig {
    parse_config(EMBEDDED_CONFIG)
}

#[cfg(not(target_arch = "wasm32"))]
fn read_config() -> ViewerConfig {
    config_from_file(std::path::Path::new(CONFIG_FILE))
}

/// A local file overrides the embedded configuration when present
#[cfg(not(target_arch = "wasm32"))]
fn config_from_file(path: &std::path::Path) -> ViewerConfig {
    if !path.exists() {
        return parse_config(EMBEDDED_CONFIG);
    }
    match deepblue_core::load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Invalid config file, using embedded configuration");
            parse_config(EMBEDDED_CONFIG)
        }
    }
}

/// Service slot shared by the toolbar and the loader host
#[derive(Resource, Clone, Default)]
pub struct SharedServices(pub ViewerServices);

/// Parse the embedded configuration, falling back to defaults
pub fn parse_config(content: &str) -> ViewerConfig {
    match ViewerConfig::from_toml_str(content) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid viewer.toml, using defaults");
            ViewerConfig::default()
        }
    }
}

pub fn run() {
    let settings = ViewerSettings::load();
    tracing::info!(
        base_url = %settings.env.base_url,
        remote_services = settings.env.remote_services_enabled(),
        "Starting viewer"
    );
    let [r, g, b] = settings.config.globe.background;
    let blobs = MemoryBlobStore::default();

    let mut app = App::new();
    // Asset sources must exist before the AssetPlugin is built
    app.register_asset_source(BlobUrl::SCHEME, blobs.asset_source());

    app.insert_resource(ClearColor(Color::srgb(r, g, b)))
        .insert_resource(WinitSettings::default())
        // Bevy 0.17+ has built-in https:// asset loading via the "https" feature
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: TITLE.to_string(),
                    canvas: Some(CANVAS_SELECTOR.to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: "".to_string(),
                // Tile servers and blob storage have no .meta files
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        .add_plugins(EguiPlugin::default())
        .insert_resource(settings)
        .insert_resource(blobs)
        .init_resource::<SharedServices>()
        .add_plugins(DeepBlueScenePlugin)
        .add_plugins(GlobeHostPlugin)
        .add_plugins(ChromePlugin)
        .add_plugins(FilePickerPlugin)
        .add_plugins(LoaderHostPlugin)
        .add_plugins(ToolbarPlugin);

    #[cfg(debug_assertions)]
    app.add_plugins(crate::debug_panel::DebugPanelPlugin);

    app.run();
}

//! Globe host: bootstraps the scene and keeps the 3D guarantee
//!
//! The bootstrap runs once in `PostStartup`, after the scene plugins have
//! spawned the globe and camera. The scene-mode confirmation is then ticked
//! every frame until it settles or the viewer shuts down.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use deepblue_core::config::{ClockConfig, GlobeAppearance, ImageryConfig, WidgetToggles};
use deepblue_core::{
    mount, BootstrapReport, CameraPose, DebugSnapshot, DebugSurface, GlobeWidget,
    Scene3dConfirmation, SceneMode, SetupError,
};
use deepblue_scene::{
    CameraFlight, CameraState, GlobeSettings, ImageryLayers, SceneClock, SceneModeState,
};

use crate::app::ViewerSettings;
use crate::loader_host::ModelLoader;

pub struct GlobeHostPlugin;

impl Plugin for GlobeHostPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveWidgets>()
            .add_systems(PostStartup, mount_globe)
            .add_systems(
                Update,
                (
                    confirm_scene_3d.run_if(resource_exists::<Bootstrap>),
                    publish_debug_snapshot.run_if(resource_exists::<DebugSurfaceSlot>),
                ),
            )
            .add_systems(Last, cancel_on_exit);
    }
}

/// Widget toggles the scene was mounted with
#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveWidgets(pub WidgetToggles);

/// Result of the bootstrap and the pending 3D confirmation
#[derive(Resource, Debug)]
pub struct Bootstrap {
    pub report: BootstrapReport,
    confirmation: Scene3dConfirmation,
}

/// Development-only inspection surface, present only when injected
#[derive(Resource)]
pub struct DebugSurfaceSlot(pub Box<dyn DebugSurface>);

/// [`GlobeWidget`] over the scene resources
#[derive(SystemParam)]
pub struct BevyGlobe<'w> {
    asset_server: Res<'w, AssetServer>,
    widgets: ResMut<'w, ActiveWidgets>,
    mode: ResMut<'w, SceneModeState>,
    camera: ResMut<'w, CameraState>,
    flight: ResMut<'w, CameraFlight>,
    clock: ResMut<'w, SceneClock>,
    globe: ResMut<'w, GlobeSettings>,
    imagery: ResMut<'w, ImageryLayers>,
}

impl GlobeWidget for BevyGlobe<'_> {
    fn apply_widgets(&mut self, widgets: &WidgetToggles) -> Result<(), SetupError> {
        self.mode.set_scene_3d_only(widgets.scene_3d_only);
        self.widgets.0 = widgets.clone();
        Ok(())
    }

    fn scene_mode(&self) -> Option<SceneMode> {
        self.mode.mode()
    }

    fn morph_to_3d(&mut self) -> Result<(), SetupError> {
        self.mode.request_morph(SceneMode::Scene3D)
    }

    fn set_camera_view(&mut self, pose: &CameraPose) -> Result<(), SetupError> {
        let values = [
            pose.longitude_deg,
            pose.latitude_deg,
            pose.height_m,
            pose.heading_rad,
            pose.pitch_rad,
            pose.roll_rad,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SetupError::Rejected("camera pose is not finite".to_string()));
        }
        self.flight.cancel();
        self.camera.set_view(pose);
        Ok(())
    }

    fn freeze_clock(&mut self, clock: &ClockConfig) -> Result<(), SetupError> {
        self.clock.freeze(clock);
        Ok(())
    }

    fn configure_globe(&mut self, globe: &GlobeAppearance) -> Result<(), SetupError> {
        self.globe.0 = globe.clone();
        Ok(())
    }

    fn remove_all_imagery(&mut self) -> Result<(), SetupError> {
        self.imagery.clear();
        Ok(())
    }

    fn add_imagery(&mut self, imagery: &ImageryConfig) -> Result<(), SetupError> {
        self.imagery.add_templated(imagery, &self.asset_server);
        Ok(())
    }

    fn imagery_layer_count(&self) -> usize {
        self.imagery.len()
    }
}

pub fn mount_globe(
    mut commands: Commands,
    mut globe: BevyGlobe,
    settings: Res<ViewerSettings>,
) {
    let config = &settings.config;
    let report = mount(&mut globe, config);
    if !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "Viewer mounted with setup failures");
    }

    if config.imagery.check_reachability {
        check_tile_reachability(config.imagery.sample_tile_url());
    }

    commands.insert_resource(Bootstrap {
        report,
        confirmation: Scene3dConfirmation::new(&config.scene_mode),
    });
}

fn confirm_scene_3d(mut bootstrap: ResMut<Bootstrap>, mut globe: BevyGlobe, time: Res<Time>) {
    if bootstrap.confirmation.state().is_finished() {
        return;
    }
    bootstrap.confirmation.tick(&mut globe, time.delta());
}

fn publish_debug_snapshot(
    mut slot: ResMut<DebugSurfaceSlot>,
    mut globe: BevyGlobe,
    loader: Option<Res<ModelLoader>>,
) {
    let registry = loader.as_ref().map(|host| host.loader.registry());
    let snapshot = DebugSnapshot {
        scene_mode: globe.scene_mode(),
        imagery_layers: globe.imagery_layer_count(),
        models: registry.map_or(0, |r| r.len()),
        last_model: registry.and_then(|r| r.last()),
    };
    slot.0.publish(&snapshot);

    if slot.0.take_force_3d() {
        match globe.morph_to_3d() {
            Ok(()) => tracing::info!("Forced morph to 3D"),
            Err(e) => tracing::warn!(error = %e, "Forced morph to 3D failed"),
        }
    }
}

fn cancel_on_exit(mut exits: MessageReader<AppExit>, bootstrap: Option<ResMut<Bootstrap>>) {
    if exits.read().next().is_none() {
        return;
    }
    if let Some(mut bootstrap) = bootstrap {
        bootstrap.confirmation.cancel();
    }
}

/// Fetch one tile and log the outcome; diagnostics only
#[cfg(target_arch = "wasm32")]
fn check_tile_reachability(url: String) {
    use wasm_bindgen_futures::spawn_local;

    spawn_local(async move {
        match gloo_net::http::Request::get(&url).send().await {
            Ok(response) if response.ok() => {
                tracing::info!(status = response.status(), %url, "Imagery tile reachable");
            }
            Ok(response) => {
                tracing::warn!(status = response.status(), %url, "Imagery tile request rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, %url, "Imagery tile fetch failed");
            }
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn check_tile_reachability(url: String) {
    tracing::debug!(%url, "Tile reachability check skipped on native");
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepblue_core::{RetryState, SetupStep, ViewerConfig};

    fn test_app(config: ViewerConfig) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_resource::<CameraState>()
            .init_resource::<CameraFlight>()
            .init_resource::<SceneClock>()
            .init_resource::<GlobeSettings>()
            .init_resource::<ImageryLayers>()
            .init_resource::<SceneModeState>()
            .insert_resource(ViewerSettings {
                config,
                env: deepblue_core::EnvConfig::from_values(None, None),
            })
            .add_plugins(GlobeHostPlugin);
        app
    }

    #[test]
    fn test_mount_applies_fixed_configuration() {
        let mut config = ViewerConfig::default();
        config.imagery.check_reachability = false;
        let mut app = test_app(config.clone());
        app.update();

        let world = app.world();
        let bootstrap = world.resource::<Bootstrap>();
        assert!(bootstrap.report.is_clean(), "{:?}", bootstrap.report.failures);
        assert_eq!(bootstrap.report.imagery_layers, 1);
        assert!(bootstrap.report.completed.contains(&SetupStep::SceneMode));

        let layers = world.resource::<ImageryLayers>();
        assert_eq!(layers.len(), 1);
        assert!(layers.top_texture().is_some());

        assert!(world.resource::<SceneModeState>().is_locked_3d());
        assert_eq!(world.resource::<SceneClock>().current, config.clock.frozen_at);
        assert_eq!(world.resource::<GlobeSettings>().0, config.globe);
    }

    #[test]
    fn test_confirmation_succeeds_once_scene_settles() {
        let mut config = ViewerConfig::default();
        config.imagery.check_reachability = false;
        config.scene_mode.interval_ms = 0;
        let mut app = test_app(config);
        app.update();
        assert_eq!(
            app.world().resource::<Bootstrap>().confirmation.state(),
            RetryState::Pending
        );

        // No camera in this world, so the mode never settles on its own
        app.world_mut().resource_mut::<SceneModeState>().settle();
        app.update();

        let bootstrap = app.world().resource::<Bootstrap>();
        assert!(matches!(
            bootstrap.confirmation.state(),
            RetryState::Succeeded { .. }
        ));
        assert_eq!(
            app.world().resource::<SceneModeState>().mode(),
            Some(SceneMode::Scene3D)
        );
    }
}

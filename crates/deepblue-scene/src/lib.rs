//! DeepBlue Scene - Bevy rendering of the globe
//!
//! This crate turns the engine-independent pieces of `deepblue-core` into a
//! live scene: the WGS84 ellipsoid with its imagery, a camera that flies in
//! ECEF space, a scene clock that positions the sun, and the projection mode
//! the bootstrap confirms.

pub mod camera;
pub mod globe;
pub mod lighting;
pub mod mode;
pub mod origin;

use bevy::prelude::*;

/// Plugin that sets up the globe scene
pub struct DeepBlueScenePlugin;

impl Plugin for DeepBlueScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<origin::WorldOrigin>()
            .add_plugins(camera::GlobeCameraPlugin)
            .add_plugins(globe::GlobePlugin)
            .add_plugins(lighting::SceneClockPlugin)
            .add_plugins(mode::SceneModePlugin);
    }
}

// Re-export commonly used types
pub use camera::{CameraFlight, CameraState, GlobeCamera, FIELD_OF_VIEW_Y};
pub use globe::{GlobeSettings, ImageryLayer, ImageryLayers};
pub use lighting::SceneClock;
pub use mode::SceneModeState;
pub use origin::WorldOrigin;

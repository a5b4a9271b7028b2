//! Scene projection mode
//!
//! The renderer only draws the 3D globe. Mode is tracked so the bootstrap
//! can confirm 3D once the scene is up, and so the 3D lock can reject
//! morphs to flat projections.

use bevy::prelude::*;

use deepblue_core::{SceneMode, SetupError};

use crate::camera::GlobeCamera;

pub struct SceneModePlugin;

impl Plugin for SceneModePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneModeState>()
            .add_systems(Update, settle_scene_mode);
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct SceneModeState {
    mode: Option<SceneMode>,
    target: Option<SceneMode>,
    scene_3d_only: bool,
}

impl SceneModeState {
    /// `None` until the scene has rendered its first frame
    pub fn mode(&self) -> Option<SceneMode> {
        self.mode
    }

    pub fn is_locked_3d(&self) -> bool {
        self.scene_3d_only
    }

    pub fn set_scene_3d_only(&mut self, locked: bool) {
        self.scene_3d_only = locked;
    }

    /// Ask for a morph; it completes on the next settle
    pub fn request_morph(&mut self, target: SceneMode) -> Result<(), SetupError> {
        if target == SceneMode::Morphing {
            return Err(SetupError::Rejected("cannot morph to a transition".to_string()));
        }
        if self.scene_3d_only && !target.is_3d() {
            return Err(SetupError::Rejected(format!(
                "scene is locked to 3D, refusing {}",
                target.label()
            )));
        }
        match self.mode {
            Some(current) if current == target => {}
            Some(_) => {
                self.mode = Some(SceneMode::Morphing);
                self.target = Some(target);
            }
            None => self.target = Some(target),
        }
        Ok(())
    }

    /// Mark the scene ready, finishing any requested morph
    pub fn settle(&mut self) {
        match self.mode {
            None => self.mode = Some(self.target.take().unwrap_or(SceneMode::Scene3D)),
            Some(SceneMode::Morphing) => {
                self.mode = Some(self.target.take().unwrap_or(SceneMode::Scene3D));
            }
            Some(_) => {}
        }
    }
}

fn settle_scene_mode(mut state: ResMut<SceneModeState>, camera: Query<(), With<GlobeCamera>>) {
    let needs_settle = matches!(state.mode, None | Some(SceneMode::Morphing));
    if needs_settle && !camera.is_empty() {
        state.settle();
        if let Some(mode) = state.mode {
            tracing::debug!(mode = mode.label(), "Scene mode settled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_unavailable_until_settled() {
        let mut state = SceneModeState::default();
        assert_eq!(state.mode(), None);
        state.settle();
        assert_eq!(state.mode(), Some(SceneMode::Scene3D));
    }

    #[test]
    fn test_locked_scene_rejects_flat_modes() {
        let mut state = SceneModeState::default();
        state.set_scene_3d_only(true);
        state.settle();

        assert!(matches!(
            state.request_morph(SceneMode::Scene2D),
            Err(SetupError::Rejected(_))
        ));
        assert!(state.request_morph(SceneMode::ColumbusView).is_err());
        assert!(state.request_morph(SceneMode::Scene3D).is_ok());
        assert_eq!(state.mode(), Some(SceneMode::Scene3D));
    }

    #[test]
    fn test_unlocked_morph_passes_through_morphing() {
        let mut state = SceneModeState::default();
        state.settle();
        state.request_morph(SceneMode::Scene2D).unwrap();
        assert_eq!(state.mode(), Some(SceneMode::Morphing));
        state.settle();
        assert_eq!(state.mode(), Some(SceneMode::Scene2D));

        state.request_morph(SceneMode::Scene3D).unwrap();
        state.settle();
        assert_eq!(state.mode(), Some(SceneMode::Scene3D));
    }

    #[test]
    fn test_settle_system_waits_for_camera() {
        let mut app = App::new();
        app.add_plugins(SceneModePlugin);

        app.update();
        assert_eq!(app.world().resource::<SceneModeState>().mode(), None);

        app.world_mut().spawn(GlobeCamera);
        app.update();
        assert_eq!(
            app.world().resource::<SceneModeState>().mode(),
            Some(SceneMode::Scene3D)
        );
    }
}

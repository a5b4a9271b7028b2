//! Development inspection window
//!
//! Only compiled into debug builds. The panel is injected as the viewer's
//! [`DebugSurface`]; release builds publish nothing.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use deepblue_core::{DebugSnapshot, DebugSurface, LoggingDebugSurface};

use crate::globe_host::DebugSurfaceSlot;

pub struct DebugPanelPlugin;

impl Plugin for DebugPanelPlugin {
    fn build(&self, app: &mut App) {
        let panel = PanelHandle::default();
        app.insert_resource(DebugSurfaceSlot(Box::new(PanelSurface::new(panel.clone()))))
            .insert_resource(panel)
            .add_systems(EguiPrimaryContextPass, debug_window);
    }
}

#[derive(Debug, Default)]
struct PanelState {
    snapshot: DebugSnapshot,
    force_3d: bool,
}

/// Shared between the surface and the egui window
#[derive(Resource, Clone, Default)]
pub struct PanelHandle(Arc<Mutex<PanelState>>);

impl PanelHandle {
    pub fn snapshot(&self) -> DebugSnapshot {
        self.0
            .lock()
            .map(|state| state.snapshot.clone())
            .unwrap_or_default()
    }

    pub fn request_force_3d(&self) {
        if let Ok(mut state) = self.0.lock() {
            state.force_3d = true;
        }
    }
}

/// [`DebugSurface`] feeding the panel, logging changes as it goes
pub struct PanelSurface {
    log: LoggingDebugSurface,
    panel: PanelHandle,
}

impl PanelSurface {
    pub fn new(panel: PanelHandle) -> Self {
        Self {
            log: LoggingDebugSurface::default(),
            panel,
        }
    }
}

impl DebugSurface for PanelSurface {
    fn publish(&mut self, snapshot: &DebugSnapshot) {
        self.log.publish(snapshot);
        if let Ok(mut state) = self.panel.0.lock() {
            state.snapshot = snapshot.clone();
        }
    }

    fn take_force_3d(&mut self) -> bool {
        self.panel
            .0
            .lock()
            .map(|mut state| std::mem::take(&mut state.force_3d))
            .unwrap_or(false)
    }
}

fn debug_window(mut contexts: EguiContexts, panel: Res<PanelHandle>) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let snapshot = panel.snapshot();
    egui::Window::new("Debug")
        .default_open(false)
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-8.0, -8.0))
        .show(ctx, |ui| {
            ui.label(snapshot.summary());
            if let Some(handle) = snapshot.last_model {
                ui.label(format!("Last model: {handle}"));
            }
            if ui.button("Force 3D").clicked() {
                panel.request_force_3d();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepblue_core::SceneMode;

    #[test]
    fn test_surface_feeds_panel() {
        let panel = PanelHandle::default();
        let mut surface = PanelSurface::new(panel.clone());
        let snapshot = DebugSnapshot {
            scene_mode: Some(SceneMode::Scene3D),
            imagery_layers: 1,
            models: 0,
            last_model: None,
        };
        surface.publish(&snapshot);
        assert_eq!(panel.snapshot(), snapshot);
    }

    #[test]
    fn test_force_3d_is_consumed_once() {
        let panel = PanelHandle::default();
        let mut surface = PanelSurface::new(panel.clone());
        assert!(!surface.take_force_3d());

        panel.request_force_3d();
        assert!(surface.take_force_3d());
        assert!(!surface.take_force_3d());
    }
}

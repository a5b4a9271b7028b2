//! Toolbar overlay using bevy_egui

use std::time::Duration;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use deepblue_core::geodesy::camera_frame;
use deepblue_core::DialogOutcome;
use deepblue_scene::camera::Flight;
use deepblue_scene::{CameraFlight, CameraState};

use crate::app::{SharedServices, ViewerSettings, TITLE};
use crate::globe_host::ActiveWidgets;
use crate::loader_host::ModelLoader;

pub struct ToolbarPlugin;

impl Plugin for ToolbarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ToolbarStatus>()
            // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, toolbar_system);
    }
}

/// Last message shown next to the Load Data button
#[derive(Resource, Debug, Default)]
pub struct ToolbarStatus(pub Option<String>);

/// Status line for a dialog request; `None` when the dialog opened
pub fn dialog_status(outcome: &DialogOutcome) -> Option<String> {
    match outcome {
        DialogOutcome::Opened => None,
        DialogOutcome::Unavailable => Some("Viewer not ready".to_string()),
        DialogOutcome::Failed(e) => Some(format!("Could not open file dialog: {e}")),
    }
}

fn toolbar_system(
    mut contexts: EguiContexts,
    services: Res<SharedServices>,
    settings: Res<ViewerSettings>,
    widgets: Res<ActiveWidgets>,
    loader: Option<Res<ModelLoader>>,
    camera: Res<CameraState>,
    mut flight: ResMut<CameraFlight>,
    mut status: ResMut<ToolbarStatus>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(TITLE);
            ui.separator();

            let busy = loader.as_ref().is_some_and(|host| host.loader.is_busy());
            // Selections made while a model is framing wait in the loader queue
            if ui
                .button("Load Data")
                .on_hover_text("Open a glTF or GLB model")
                .clicked()
            {
                status.0 = dialog_status(&services.0.open_file_dialog());
            }

            if widgets.0.home_button && ui.button("Home").clicked() {
                let duration =
                    Duration::from_secs_f64(settings.config.framing.flight_duration_secs);
                let home = camera_frame(&settings.config.camera);
                flight.start(Flight::new(camera.frame, home, duration));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if busy {
                    ui.spinner();
                } else if let Some(message) = &status.0 {
                    ui.colored_label(egui::Color32::LIGHT_RED, message);
                } else if let Some(host) = loader.as_ref() {
                    let models = host.loader.registry().len();
                    if models > 0 {
                        ui.label(format!("{models} model(s)"));
                    }
                }
            });
        });
    });
}

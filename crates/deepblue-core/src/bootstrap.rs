//! Viewer bootstrap: one-shot scene configuration and 3D confirmation
//!
//! Every step is applied independently. A failing step is logged and
//! recorded in the [`BootstrapReport`] but never prevents the others.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{
    ClockConfig, GlobeAppearance, ImageryConfig, SceneModeRetry, ViewerConfig, WidgetToggles,
};
use crate::error::SetupError;
use crate::retry::{BoundedRetry, RetryState};
use crate::scene::{CameraPose, SceneMode};

/// The embedded globe scene, as seen by the bootstrap
pub trait GlobeWidget {
    fn apply_widgets(&mut self, widgets: &WidgetToggles) -> Result<(), SetupError>;

    /// Current mode, `None` while the scene is not ready yet
    fn scene_mode(&self) -> Option<SceneMode>;

    /// Request an instant morph to 3D
    fn morph_to_3d(&mut self) -> Result<(), SetupError>;

    fn set_camera_view(&mut self, pose: &CameraPose) -> Result<(), SetupError>;

    fn freeze_clock(&mut self, clock: &ClockConfig) -> Result<(), SetupError>;

    fn configure_globe(&mut self, globe: &GlobeAppearance) -> Result<(), SetupError>;

    fn remove_all_imagery(&mut self) -> Result<(), SetupError>;

    fn add_imagery(&mut self, imagery: &ImageryConfig) -> Result<(), SetupError>;

    fn imagery_layer_count(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Widgets,
    Camera,
    Clock,
    Globe,
    SceneMode,
    Imagery,
}

impl SetupStep {
    pub fn label(self) -> &'static str {
        match self {
            SetupStep::Widgets => "widgets",
            SetupStep::Camera => "camera",
            SetupStep::Clock => "clock",
            SetupStep::Globe => "globe",
            SetupStep::SceneMode => "scene mode",
            SetupStep::Imagery => "imagery",
        }
    }
}

/// Outcome of [`mount`]
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub completed: Vec<SetupStep>,
    pub failures: Vec<(SetupStep, SetupError)>,
    pub imagery_layers: usize,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, step: SetupStep) -> bool {
        self.failures.iter().any(|(s, _)| *s == step)
    }

    fn record(&mut self, step: SetupStep, result: Result<(), SetupError>) {
        match result {
            Ok(()) => {
                debug!(step = step.label(), "Setup step applied");
                self.completed.push(step);
            }
            Err(e) => {
                error!(step = step.label(), error = %e, "Setup step failed");
                self.failures.push((step, e));
            }
        }
    }
}

/// Apply the fixed viewer configuration to a freshly created scene
pub fn mount<W: GlobeWidget>(widget: &mut W, config: &ViewerConfig) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    report.record(SetupStep::Widgets, widget.apply_widgets(&config.widgets));
    report.record(SetupStep::Camera, widget.set_camera_view(&config.camera));
    report.record(SetupStep::Clock, widget.freeze_clock(&config.clock));
    report.record(SetupStep::Globe, widget.configure_globe(&config.globe));

    let mode = match widget.scene_mode() {
        Some(mode) if mode.is_3d() => Ok(()),
        _ => widget.morph_to_3d(),
    };
    report.record(SetupStep::SceneMode, mode);

    // Exactly one imagery layer: only add once the old ones are gone
    let imagery = widget
        .remove_all_imagery()
        .and_then(|_| widget.add_imagery(&config.imagery));
    report.record(SetupStep::Imagery, imagery);

    report.imagery_layers = widget.imagery_layer_count();
    info!(
        imagery_layers = report.imagery_layers,
        failures = report.failures.len(),
        "Viewer bootstrap complete"
    );
    report
}

/// Polls the scene until it reports 3D, morphing on every miss
#[derive(Debug, Clone)]
pub struct Scene3dConfirmation {
    retry: BoundedRetry,
    reported: bool,
}

impl Scene3dConfirmation {
    pub fn new(schedule: &SceneModeRetry) -> Self {
        Self {
            retry: BoundedRetry::new(
                schedule.max_attempts,
                Duration::from_millis(schedule.interval_ms),
            ),
            reported: false,
        }
    }

    pub fn tick<W: GlobeWidget>(&mut self, widget: &mut W, delta: Duration) -> RetryState {
        let state = self.retry.tick(delta, |_| {
            if !widget.scene_mode().is_some_and(SceneMode::is_3d) {
                if let Err(e) = widget.morph_to_3d() {
                    debug!(error = %e, "Morph to 3D request failed");
                }
            }
            widget.scene_mode().is_some_and(SceneMode::is_3d)
        });

        if state.is_finished() && !self.reported {
            self.reported = true;
            match state {
                RetryState::Succeeded { attempts } => {
                    info!(attempts, "Scene is 3D");
                }
                RetryState::Exhausted { attempts } => {
                    let mode = widget
                        .scene_mode()
                        .map(|m| m.label())
                        .unwrap_or("unavailable");
                    warn!(attempts, mode, "Failed to switch to 3D after retries");
                }
                RetryState::Cancelled | RetryState::Pending => {}
            }
        }
        state
    }

    pub fn cancel(&mut self) {
        self.retry.cancel();
    }

    pub fn state(&self) -> RetryState {
        self.retry.state()
    }
}

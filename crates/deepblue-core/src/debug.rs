//! Development-only inspection surface
//!
//! Release builds never construct a [`DebugSurface`]; the viewer injects one
//! only under `debug_assertions`.

use crate::scene::{ModelHandle, SceneMode};

/// Point-in-time view of the scene for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugSnapshot {
    pub scene_mode: Option<SceneMode>,
    pub imagery_layers: usize,
    pub models: usize,
    pub last_model: Option<ModelHandle>,
}

impl DebugSnapshot {
    pub fn summary(&self) -> String {
        let mode = self.scene_mode.map(|m| m.label()).unwrap_or("unavailable");
        format!(
            "mode {mode}, {} imagery layer(s), {} model(s)",
            self.imagery_layers, self.models
        )
    }
}

pub trait DebugSurface: Send + Sync {
    fn publish(&mut self, snapshot: &DebugSnapshot);

    /// Consume a pending "force 3D" request
    fn take_force_3d(&mut self) -> bool {
        false
    }
}

/// Logs the snapshot whenever it changes
#[derive(Debug, Default)]
pub struct LoggingDebugSurface {
    last: Option<DebugSnapshot>,
}

impl DebugSurface for LoggingDebugSurface {
    fn publish(&mut self, snapshot: &DebugSnapshot) {
        if self.last.as_ref() != Some(snapshot) {
            tracing::debug!(snapshot = %snapshot.summary(), "Viewer state");
            self.last = Some(snapshot.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_mode_and_counts() {
        let snapshot = DebugSnapshot {
            scene_mode: Some(SceneMode::Scene3D),
            imagery_layers: 1,
            models: 2,
            last_model: None,
        };
        let summary = snapshot.summary();
        assert!(summary.contains(SceneMode::Scene3D.label()));
        assert!(summary.contains("1 imagery"));
        assert!(summary.contains("2 model"));
    }

    #[test]
    fn test_logging_surface_tracks_last_snapshot() {
        let mut surface = LoggingDebugSurface::default();
        let snapshot = DebugSnapshot::default();
        surface.publish(&snapshot);
        assert_eq!(surface.last, Some(snapshot));
        assert!(!surface.take_force_3d());
    }
}

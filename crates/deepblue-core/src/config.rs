//! Configuration loading and build-time environment

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::scene::CameraPose;

/// Main viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub widgets: WidgetToggles,
    #[serde(default)]
    pub camera: CameraPose,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub imagery: ImageryConfig,
    #[serde(default)]
    pub globe: GlobeAppearance,
    #[serde(default)]
    pub scene_mode: SceneModeRetry,
    #[serde(default)]
    pub framing: FramingConfig,
}

/// Built-in widget switches passed to the scene at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetToggles {
    /// Reject morphs to 2D / Columbus view
    #[serde(default = "default_true")]
    pub scene_3d_only: bool,
    #[serde(default)]
    pub timeline: bool,
    #[serde(default)]
    pub animation: bool,
    #[serde(default)]
    pub home_button: bool,
    #[serde(default)]
    pub base_layer_picker: bool,
    #[serde(default)]
    pub scene_mode_picker: bool,
    #[serde(default)]
    pub navigation_help_button: bool,
    #[serde(default)]
    pub navigation_instructions_initially_visible: bool,
    #[serde(default)]
    pub fullscreen_button: bool,
    #[serde(default = "default_true")]
    pub vr_button: bool,
    #[serde(default = "default_true")]
    pub geocoder: bool,
    #[serde(default = "default_true")]
    pub info_box: bool,
    #[serde(default = "default_true")]
    pub selection_indicator: bool,
}

impl Default for WidgetToggles {
    fn default() -> Self {
        Self {
            scene_3d_only: true,
            timeline: false,
            animation: false,
            home_button: false,
            base_layer_picker: false,
            scene_mode_picker: false,
            navigation_help_button: false,
            navigation_instructions_initially_visible: false,
            fullscreen_button: false,
            vr_button: true,
            geocoder: true,
            info_box: true,
            selection_indicator: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Scene time used for lighting instead of the wall clock
    #[serde(default = "default_frozen_at")]
    pub frozen_at: DateTime<Utc>,
    #[serde(default)]
    pub should_animate: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frozen_at: default_frozen_at(),
            should_animate: false,
        }
    }
}

fn default_frozen_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 17, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The single tiled imagery layer the viewer shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageryConfig {
    /// URL template with `{z}`, `{y}` and `{x}` placeholders
    #[serde(default = "default_imagery_url")]
    pub url_template: String,
    #[serde(default = "default_imagery_credit")]
    pub credit: String,
    /// Fetch one tile at startup and log the result
    #[serde(default = "default_true")]
    pub check_reachability: bool,
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            url_template: default_imagery_url(),
            credit: default_imagery_credit(),
            check_reachability: true,
        }
    }
}

fn default_imagery_url() -> String {
    "https://services.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
        .to_string()
}

fn default_imagery_credit() -> String {
    "Esri World Imagery".to_string()
}

impl ImageryConfig {
    pub fn tile_url(&self, z: u8, y: u32, x: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{y}", &y.to_string())
            .replace("{x}", &x.to_string())
    }

    /// Tile fetched by the startup reachability check
    pub fn sample_tile_url(&self) -> String {
        self.tile_url(1, 0, 0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for placeholder in ["{z}", "{y}", "{x}"] {
            if !self.url_template.contains(placeholder) {
                return Err(ConfigError::Invalid(format!(
                    "imagery url_template is missing {placeholder}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobeAppearance {
    #[serde(default = "default_true")]
    pub show: bool,
    #[serde(default = "default_true")]
    pub enable_lighting: bool,
    #[serde(default)]
    pub show_sky_box: bool,
    #[serde(default = "default_true")]
    pub show_sky_atmosphere: bool,
    /// Linear RGB background
    #[serde(default)]
    pub background: [f32; 3],
}

impl Default for GlobeAppearance {
    fn default() -> Self {
        Self {
            show: true,
            enable_lighting: true,
            show_sky_box: false,
            show_sky_atmosphere: true,
            background: [0.0, 0.0, 0.0],
        }
    }
}

/// Polling schedule used to confirm the scene reached 3D mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneModeRetry {
    #[serde(default = "default_retry_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
}

impl Default for SceneModeRetry {
    fn default() -> Self {
        Self {
            interval_ms: default_retry_interval(),
            max_attempts: default_retry_attempts(),
        }
    }
}

fn default_retry_interval() -> u64 {
    100
}

fn default_retry_attempts() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramingConfig {
    /// Duration of the camera flight onto a freshly loaded model
    #[serde(default = "default_flight_secs")]
    pub flight_duration_secs: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            flight_duration_secs: default_flight_secs(),
        }
    }
}

fn default_flight_secs() -> f64 {
    1.0
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.imagery.validate()?;
        if self.scene_mode.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "scene_mode.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.framing.flight_duration_secs.is_finite() || self.framing.flight_duration_secs < 0.0
        {
            return Err(ConfigError::Invalid(
                "framing.flight_duration_secs must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ViewerConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = ViewerConfig::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}

pub const DEFAULT_BASE_URL: &str = "/deepblue";

/// Values baked in from the build environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Where static viewer assets are served from
    pub base_url: String,
    /// Token for gated remote services; `None` disables them
    pub access_token: Option<String>,
}

impl EnvConfig {
    /// Read `DEEPBLUE_BASE_URL` and `DEEPBLUE_ACCESS_TOKEN` at compile time
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("DEEPBLUE_BASE_URL"),
            option_env!("DEEPBLUE_ACCESS_TOKEN"),
        )
    }

    pub fn from_values(base_url: Option<&str>, access_token: Option<&str>) -> Self {
        let base_url = base_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string();

        // An empty token would only produce rejected requests
        let access_token = access_token
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if access_token.is_none() {
            info!("No access token provided; gated remote services are disabled");
        }

        Self {
            base_url,
            access_token,
        }
    }

    pub fn remote_services_enabled(&self) -> bool {
        self.access_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_viewer_setup() {
        let config = ViewerConfig::default();
        assert!(config.widgets.scene_3d_only);
        assert!(!config.widgets.home_button);
        assert!(!config.widgets.fullscreen_button);
        assert!(config.widgets.geocoder);
        assert!(config.widgets.selection_indicator);
        assert_eq!(config.scene_mode.interval_ms, 100);
        assert_eq!(config.scene_mode.max_attempts, 20);
        assert_eq!(config.framing.flight_duration_secs, 1.0);
        assert_eq!(
            config.clock.frozen_at.to_rfc3339(),
            "2025-11-17T12:00:00+00:00"
        );
        assert!(!config.clock.should_animate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [camera]
            longitude_deg = 2.35
            latitude_deg = 48.85
            height_m = 1200.0

            [widgets]
            home_button = true
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.longitude_deg, 2.35);
        assert!(config.camera.pitch_rad < 0.0);
        assert!(config.widgets.home_button);
        assert!(config.widgets.scene_3d_only);
        assert_eq!(config.imagery.credit, "Esri World Imagery");
    }

    #[test]
    fn test_rejects_template_without_placeholders() {
        let err = ViewerConfig::from_toml_str(
            r#"
            [imagery]
            url_template = "https://tiles.example.com/static.png"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("{z}"));
    }

    #[test]
    fn test_tile_url_substitution() {
        let imagery = ImageryConfig::default();
        assert!(imagery
            .sample_tile_url()
            .ends_with("/World_Imagery/MapServer/tile/1/0/0"));
        assert!(imagery.tile_url(3, 2, 5).ends_with("/tile/3/2/5"));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("viewer.toml")).unwrap();
        assert_eq!(config.camera, CameraPose::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("viewer.toml");
        std::fs::write(&path, "[scene_mode]\nmax_attempts = 5\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.scene_mode.max_attempts, 5);
        assert_eq!(config.scene_mode.interval_ms, 100);
    }

    #[test]
    fn test_env_config_without_token() {
        let env = EnvConfig::from_values(None, Some("  "));
        assert_eq!(env.base_url, DEFAULT_BASE_URL);
        assert!(!env.remote_services_enabled());
    }

    #[test]
    fn test_env_config_with_token() {
        let env = EnvConfig::from_values(Some("/static/viewer"), Some("abc"));
        assert_eq!(env.base_url, "/static/viewer");
        assert_eq!(env.access_token.as_deref(), Some("abc"));
        assert!(env.remote_services_enabled());
    }
}

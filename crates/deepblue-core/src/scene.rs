//! Scene value types: modes, camera pose, bounds and model handles

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use uuid::Uuid;

/// Projection the scene is currently rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    Scene3D,
    Scene2D,
    ColumbusView,
    /// Transitioning between two modes
    Morphing,
}

impl SceneMode {
    pub fn is_3d(self) -> bool {
        self == SceneMode::Scene3D
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneMode::Scene3D => "3D",
            SceneMode::Scene2D => "2D",
            SceneMode::ColumbusView => "Columbus view",
            SceneMode::Morphing => "morphing",
        }
    }
}

impl std::fmt::Display for SceneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Camera destination and orientation
///
/// Longitude/latitude in degrees, height in meters above the WGS84 ellipsoid,
/// heading/pitch/roll in radians (heading clockwise from north, negative
/// pitch looks down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub height_m: f64,
    #[serde(default)]
    pub heading_rad: f64,
    #[serde(default = "default_pitch")]
    pub pitch_rad: f64,
    #[serde(default)]
    pub roll_rad: f64,
}

fn default_pitch() -> f64 {
    -std::f64::consts::FRAC_PI_6 // look down ~30 degrees
}

impl Default for CameraPose {
    fn default() -> Self {
        // Hengqin Island, Zhuhai
        Self {
            longitude_deg: 113.5535,
            latitude_deg: 22.1216,
            height_m: 5000.0,
            heading_rad: 0.0,
            pitch_rad: default_pitch(),
            roll_rad: 0.0,
        }
    }
}

/// Earth-centered, earth-fixed position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub const ZERO: Cartesian3 = Cartesian3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Cartesian3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Cartesian3) -> Cartesian3 {
        Cartesian3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalize(&self) -> Cartesian3 {
        let len = self.length();
        if len == 0.0 {
            Cartesian3::ZERO
        } else {
            *self * (1.0 / len)
        }
    }

    pub fn distance(&self, other: &Cartesian3) -> f64 {
        (*self - *other).length()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Cartesian3 {
    type Output = Cartesian3;
    fn add(self, rhs: Cartesian3) -> Cartesian3 {
        Cartesian3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Cartesian3 {
    type Output = Cartesian3;
    fn sub(self, rhs: Cartesian3) -> Cartesian3 {
        Cartesian3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Cartesian3 {
    type Output = Cartesian3;
    fn mul(self, rhs: f64) -> Cartesian3 {
        Cartesian3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Closest the camera gets when framing, so tiny or point-like models stay
/// in front of it
pub const MIN_FRAMING_DISTANCE_M: f64 = 100.0;

/// Geometric envelope used to compute a camera framing shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Cartesian3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Smallest axis-aligned-box sphere enclosing `min`..`max`
    pub fn from_corners(min: Cartesian3, max: Cartesian3) -> Self {
        let center = (min + max) * 0.5;
        Self {
            center,
            radius: center.distance(&max),
        }
    }

    /// Camera distance from the center so the whole sphere fits a vertical
    /// field of view of `fov_y` radians
    pub fn framing_distance(&self, fov_y: f64) -> f64 {
        let half = (fov_y * 0.5).max(1e-3);
        (self.radius / half.sin())
            .max(self.radius * 1.5)
            .max(MIN_FRAMING_DISTANCE_M)
    }
}

/// Opaque reference to a model placed into the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle(pub Uuid);

impl ModelHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model-{}", self.0)
    }
}

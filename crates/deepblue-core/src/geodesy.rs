//! WGS84 conversions needed to place the camera

use crate::scene::{BoundingSphere, CameraPose, Cartesian3};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic degrees + height to ECEF meters
pub fn from_degrees(longitude_deg: f64, latitude_deg: f64, height_m: f64) -> Cartesian3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Cartesian3::new(
        (n + height_m) * cos_lat * cos_lon,
        (n + height_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height_m) * sin_lat,
    )
}

/// ECEF meters to geodetic (longitude deg, latitude deg, height m)
///
/// Fixed-point iteration on latitude; converges to sub-millimeter within a
/// handful of steps for points near the surface.
pub fn to_degrees(p: Cartesian3) -> (f64, f64, f64) {
    let lon = p.y.atan2(p.x);
    let r = (p.x * p.x + p.y * p.y).sqrt();
    if r < 1e-9 {
        let lat = if p.z >= 0.0 { 90.0 } else { -90.0 };
        let b = WGS84_A * (1.0 - WGS84_F);
        return (0.0, lat, p.z.abs() - b);
    }

    let mut lat = p.z.atan2(r * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..6 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = r / lat.cos() - n;
        lat = p.z.atan2(r * (1.0 - WGS84_E2 * n / (n + height)));
    }
    (lon.to_degrees(), lat.to_degrees(), height)
}

/// Local east/north/up unit vectors at a geodetic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnuFrame {
    pub east: Cartesian3,
    pub north: Cartesian3,
    pub up: Cartesian3,
}

pub fn enu_frame(longitude_deg: f64, latitude_deg: f64) -> EnuFrame {
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
    EnuFrame {
        east: Cartesian3::new(-sin_lon, cos_lon, 0.0),
        north: Cartesian3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
        up: Cartesian3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
    }
}

/// Camera position, view direction and up vector for a pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Cartesian3,
    pub direction: Cartesian3,
    pub up: Cartesian3,
}

pub fn camera_frame(pose: &CameraPose) -> CameraFrame {
    let position = from_degrees(pose.longitude_deg, pose.latitude_deg, pose.height_m);
    let enu = enu_frame(pose.longitude_deg, pose.latitude_deg);
    let (sin_h, cos_h) = pose.heading_rad.sin_cos();
    let (sin_p, cos_p) = pose.pitch_rad.sin_cos();

    let to_ecef = |e: f64, n: f64, u: f64| enu.east * e + enu.north * n + enu.up * u;
    let direction = to_ecef(sin_h * cos_p, cos_h * cos_p, sin_p);
    let level_up = to_ecef(-sin_h * sin_p, -cos_h * sin_p, cos_p);

    // Roll rotates the up vector about the view direction
    let (sin_r, cos_r) = pose.roll_rad.sin_cos();
    let right = direction.cross(&level_up);
    let up = level_up * cos_r - right * sin_r;

    CameraFrame {
        position,
        direction: direction.normalize(),
        up: up.normalize(),
    }
}

/// Pitch of the camera when framing a bounding volume
pub const FRAMING_PITCH_RAD: f64 = -std::f64::consts::FRAC_PI_4;

/// Camera looking north and down at `sphere`, far enough back to fit a
/// vertical field of view of `fov_y` radians
pub fn frame_sphere(sphere: &BoundingSphere, fov_y: f64) -> CameraFrame {
    let (lon, lat, _) = to_degrees(sphere.center);
    let enu = enu_frame(lon, lat);
    let (sin_p, cos_p) = FRAMING_PITCH_RAD.sin_cos();

    let direction = (enu.north * cos_p + enu.up * sin_p).normalize();
    let up = (enu.north * -sin_p + enu.up * cos_p).normalize();
    let range = sphere.framing_distance(fov_y);

    CameraFrame {
        position: sphere.center - direction * range,
        direction,
        up,
    }
}

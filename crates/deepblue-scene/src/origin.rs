//! Floating origin for ECEF coordinates
//!
//! Bevy transforms are `f32`, which resolves ECEF positions to about half a
//! meter. Everything in the scene is therefore placed relative to a fixed
//! origin on the ellipsoid near the area of interest; all geodesy stays in
//! `f64` until this final subtraction.

use bevy::math::{DMat3, DQuat, DVec3};
use bevy::prelude::*;

use deepblue_core::geodesy::{enu_frame, from_degrees};
use deepblue_core::{CameraPose, Cartesian3};

pub fn to_dvec3(c: Cartesian3) -> DVec3 {
    DVec3::new(c.x, c.y, c.z)
}

pub fn from_dvec3(v: DVec3) -> Cartesian3 {
    Cartesian3::new(v.x, v.y, v.z)
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldOrigin {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    ecef: DVec3,
}

impl Default for WorldOrigin {
    fn default() -> Self {
        let pose = CameraPose::default();
        Self::from_degrees(pose.longitude_deg, pose.latitude_deg)
    }
}

impl WorldOrigin {
    /// Origin on the ellipsoid surface at the given geodetic position
    pub fn from_degrees(longitude_deg: f64, latitude_deg: f64) -> Self {
        Self {
            longitude_deg,
            latitude_deg,
            ecef: to_dvec3(from_degrees(longitude_deg, latitude_deg, 0.0)),
        }
    }

    pub fn ecef(&self) -> Cartesian3 {
        from_dvec3(self.ecef)
    }

    /// ECEF meters to scene coordinates
    pub fn to_local(&self, p: Cartesian3) -> Vec3 {
        (to_dvec3(p) - self.ecef).as_vec3()
    }

    /// Scene coordinates back to ECEF meters
    pub fn to_ecef(&self, v: Vec3) -> Cartesian3 {
        from_dvec3(v.as_dvec3() + self.ecef)
    }

    /// Rotation taking glTF axes (+Y up, +Z south) onto the local
    /// east/north/up frame at the origin
    pub fn anchor_rotation(&self) -> Quat {
        let enu = enu_frame(self.longitude_deg, self.latitude_deg);
        let east = to_dvec3(enu.east);
        let north = to_dvec3(enu.north);
        let up = to_dvec3(enu.up);
        DQuat::from_mat3(&DMat3::from_cols(east, up, -north)).as_quat()
    }

    /// Transform that sits a model on the ellipsoid at the origin
    pub fn anchor_transform(&self) -> Transform {
        Transform::from_rotation(self.anchor_rotation())
    }
}

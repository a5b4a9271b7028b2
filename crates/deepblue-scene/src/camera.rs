//! Globe camera: ECEF state, timed flights and mouse navigation

use std::time::Duration;

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::{DQuat, DVec3};
use bevy::prelude::*;

use deepblue_core::geodesy::{camera_frame, frame_sphere, to_degrees, CameraFrame};
use deepblue_core::{BoundingSphere, CameraPose};

use crate::origin::{from_dvec3, to_dvec3, WorldOrigin};

/// Vertical field of view of the globe camera
pub const FIELD_OF_VIEW_Y: f32 = std::f32::consts::FRAC_PI_3;

pub struct GlobeCameraPlugin;

impl Plugin for GlobeCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraState>()
            .init_resource::<CameraFlight>()
            .init_resource::<CameraControls>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (navigate, advance_flight, sync_camera_transform).chain(),
            );
    }
}

/// Marker for the main camera
#[derive(Component)]
pub struct GlobeCamera;

/// Where the camera is, in ECEF
#[derive(Resource, Debug, Clone, Copy)]
pub struct CameraState {
    pub frame: CameraFrame,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            frame: camera_frame(&CameraPose::default()),
        }
    }
}

impl CameraState {
    pub fn set_view(&mut self, pose: &CameraPose) {
        self.frame = camera_frame(pose);
    }

    /// Height above the ellipsoid in meters
    pub fn height(&self) -> f64 {
        to_degrees(self.frame.position).2
    }
}

/// A timed camera move between two frames
#[derive(Debug, Clone, Copy)]
pub struct Flight {
    from: CameraFrame,
    to: CameraFrame,
    duration: f64,
    elapsed: f64,
}

impl Flight {
    pub fn new(from: CameraFrame, to: CameraFrame, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: duration.as_secs_f64(),
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f64) -> CameraFrame {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };
        interpolate(&self.from, &self.to, t)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn destination(&self) -> CameraFrame {
        self.to
    }
}

/// Eased blend of two camera frames
///
/// Position is blended in geodetic space so long moves arc over the
/// ellipsoid instead of cutting through it.
pub fn interpolate(from: &CameraFrame, to: &CameraFrame, t: f64) -> CameraFrame {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return *to;
    }
    let s = t * t * (3.0 - 2.0 * t);

    let (lon0, lat0, h0) = to_degrees(from.position);
    let (lon1, lat1, h1) = to_degrees(to.position);
    let mut dlon = lon1 - lon0;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let lon = lon0 + dlon * s;
    let lat = lat0 + (lat1 - lat0) * s;

    // Climb proportionally to the ground distance covered
    let ground = from.position.distance(&to.position);
    let arc = (ground * 0.25 - h0.max(h1)).max(0.0) * (std::f64::consts::PI * s).sin();
    let height = h0 + (h1 - h0) * s + arc;

    let blend = |a: DVec3, b: DVec3| (a * (1.0 - s) + b * s).normalize_or(b);
    let direction = blend(to_dvec3(from.direction), to_dvec3(to.direction));
    let up = blend(to_dvec3(from.up), to_dvec3(to.up));
    // Keep up orthogonal to the view direction
    let up = (up - direction * up.dot(direction)).normalize_or(to_dvec3(to.up));

    CameraFrame {
        position: deepblue_core::geodesy::from_degrees(lon, lat, height),
        direction: from_dvec3(direction),
        up: from_dvec3(up),
    }
}

#[derive(Resource, Debug, Default)]
pub struct CameraFlight(Option<Flight>);

impl CameraFlight {
    pub fn start(&mut self, flight: Flight) {
        self.0 = Some(flight);
    }

    pub fn cancel(&mut self) {
        self.0 = None;
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    /// Fly from `state` to a shot that fits `sphere`
    pub fn fly_to_sphere(&mut self, state: &CameraState, sphere: &BoundingSphere, duration: Duration) {
        let to = frame_sphere(sphere, FIELD_OF_VIEW_Y as f64);
        self.start(Flight::new(state.frame, to, duration));
    }
}

/// Mouse navigation tuning
#[derive(Resource, Debug, Clone)]
pub struct CameraControls {
    pub rotate_sensitivity: f64,
    pub zoom_speed: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.002,
            zoom_speed: 0.15,
            min_height: 10.0,
            max_height: 5.0e7,
        }
    }
}

fn spawn_camera(mut commands: Commands, state: Res<CameraState>, origin: Res<WorldOrigin>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: FIELD_OF_VIEW_Y,
            near: 1.0,
            far: 2.0e9,
            ..default()
        }),
        frame_transform(&state.frame, &origin),
        GlobeCamera,
    ));
}

/// Scene transform for an ECEF camera frame
pub fn frame_transform(frame: &CameraFrame, origin: &WorldOrigin) -> Transform {
    let direction = to_dvec3(frame.direction).as_vec3();
    let up = to_dvec3(frame.up).as_vec3();
    Transform::from_translation(origin.to_local(frame.position)).looking_to(direction, up)
}

/// Rotate the whole frame about an axis through the earth center
fn rotate_frame(frame: &CameraFrame, rotation: DQuat) -> CameraFrame {
    CameraFrame {
        position: from_dvec3(rotation * to_dvec3(frame.position)),
        direction: from_dvec3(rotation * to_dvec3(frame.direction)),
        up: from_dvec3(rotation * to_dvec3(frame.up)),
    }
}

fn navigate(
    mut state: ResMut<CameraState>,
    flight: Res<CameraFlight>,
    controls: Res<CameraControls>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut contexts: bevy_egui::EguiContexts,
) {
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = mouse_wheel
        .read()
        .map(|w| match w.unit {
            MouseScrollUnit::Line => w.y,
            MouseScrollUnit::Pixel => w.y / 100.0,
        })
        .sum();

    if egui_wants_pointer || flight.is_active() {
        return;
    }

    let height = state.height().max(controls.min_height);

    // Drag spins the globe under the camera, slower when close to the ground
    if mouse_button.pressed(MouseButton::Left) && motion != Vec2::ZERO {
        let scale = controls.rotate_sensitivity * (height / deepblue_core::geodesy::WGS84_A).min(1.0);
        let spin = DQuat::from_axis_angle(DVec3::Z, -motion.x as f64 * scale);
        let frame = rotate_frame(&state.frame, spin);

        let right = to_dvec3(frame.direction).cross(to_dvec3(frame.up)).normalize_or(DVec3::X);
        let tilt = DQuat::from_axis_angle(right, -motion.y as f64 * scale);
        state.frame = rotate_frame(&frame, tilt);
    }

    if scroll != 0.0 {
        let step = height * controls.zoom_speed * scroll as f64;
        let direction = to_dvec3(state.frame.direction);
        let next = to_dvec3(state.frame.position) + direction * step;
        let next_height = to_degrees(from_dvec3(next)).2;
        if (controls.min_height..=controls.max_height).contains(&next_height) {
            state.frame.position = from_dvec3(next);
        }
    }
}

fn advance_flight(mut state: ResMut<CameraState>, mut flight: ResMut<CameraFlight>, time: Res<Time>) {
    let Some(active) = flight.0.as_mut() else {
        return;
    };
    state.frame = active.advance(time.delta_secs_f64());
    if active.is_finished() {
        tracing::debug!("Camera flight complete");
        flight.cancel();
    }
}

fn sync_camera_transform(
    state: Res<CameraState>,
    origin: Res<WorldOrigin>,
    mut camera: Query<&mut Transform, With<GlobeCamera>>,
) {
    if !state.is_changed() {
        return;
    }
    if let Ok(mut transform) = camera.single_mut() {
        *transform = frame_transform(&state.frame, &origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepblue_core::geodesy::from_degrees;

    fn pose_at(lon: f64, height: f64) -> CameraFrame {
        camera_frame(&CameraPose {
            longitude_deg: lon,
            height_m: height,
            ..CameraPose::default()
        })
    }

    #[test]
    fn test_flight_reaches_destination() {
        let from = pose_at(113.5535, 5000.0);
        let to = pose_at(113.60, 800.0);
        let mut flight = Flight::new(from, to, Duration::from_secs(1));

        let mut frame = from;
        for _ in 0..70 {
            frame = flight.advance(1.0 / 60.0);
        }

        assert!(flight.is_finished());
        assert_eq!(frame, to);
    }

    #[test]
    fn test_flight_midpoint_stays_above_ground() {
        let from = pose_at(0.0, 1000.0);
        let to = pose_at(90.0, 1000.0);
        let mid = interpolate(&from, &to, 0.5);
        let (_, _, height) = to_degrees(mid.position);
        assert!(height > 1000.0, "height {height}");
        assert!((to_dvec3(mid.direction).length() - 1.0).abs() < 1e-9);
        assert!(to_dvec3(mid.direction).dot(to_dvec3(mid.up)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_flight_jumps() {
        let from = pose_at(113.5535, 5000.0);
        let to = pose_at(113.6, 5000.0);
        let mut flight = Flight::new(from, to, Duration::ZERO);
        assert_eq!(flight.advance(0.0), to);
        assert!(flight.is_finished());
    }

    #[test]
    fn test_fly_to_sphere_targets_center() {
        let mut flight = CameraFlight::default();
        let sphere = BoundingSphere {
            center: from_degrees(113.5535, 22.1216, 10.0),
            radius: 25.0,
        };
        flight.fly_to_sphere(&CameraState::default(), &sphere, Duration::from_secs(1));

        let Some(active) = flight.0 else {
            panic!("no flight started");
        };
        let dest = active.destination();
        let to_center = (to_dvec3(sphere.center) - to_dvec3(dest.position)).normalize();
        assert!(to_center.dot(to_dvec3(dest.direction)) > 0.9999);
    }
}

//! Scene clock and sunlight

use bevy::prelude::*;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use deepblue_core::clock::sun_direction;
use deepblue_core::config::ClockConfig;

use crate::origin::to_dvec3;

const SUN_ILLUMINANCE: f32 = 10_000.0;
const AMBIENT_BRIGHTNESS: f32 = 80.0;

pub struct SceneClockPlugin;

impl Plugin for SceneClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneClock>()
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: AMBIENT_BRIGHTNESS,
                ..default()
            })
            .add_systems(Startup, spawn_sun)
            .add_systems(Update, (advance_clock, orient_sun).chain());
    }
}

/// Simulated time that drives lighting
#[derive(Resource, Debug, Clone)]
pub struct SceneClock {
    pub current: DateTime<Utc>,
    pub should_animate: bool,
    /// Simulated seconds per real second
    pub multiplier: f64,
}

impl Default for SceneClock {
    fn default() -> Self {
        Self::from_config(&ClockConfig::default())
    }
}

impl SceneClock {
    pub fn from_config(config: &ClockConfig) -> Self {
        Self {
            current: config.frozen_at,
            should_animate: config.should_animate,
            multiplier: 1.0,
        }
    }

    /// Pin the clock to the configured instant
    pub fn freeze(&mut self, config: &ClockConfig) {
        self.current = config.frozen_at;
        self.should_animate = config.should_animate;
    }

    pub fn advance(&mut self, dt: f64) {
        if !self.should_animate {
            return;
        }
        let micros = (dt * self.multiplier * 1_000_000.0) as i64;
        self.current += ChronoDuration::microseconds(micros);
    }
}

/// Marker for the directional light standing in for the sun
#[derive(Component)]
pub struct Sun;

fn spawn_sun(mut commands: Commands, clock: Res<SceneClock>) {
    commands.spawn((
        DirectionalLight {
            illuminance: SUN_ILLUMINANCE,
            shadows_enabled: false,
            ..default()
        },
        sun_transform(clock.current),
        Sun,
    ));
}

/// Light transform pointing from the sun toward the earth
pub fn sun_transform(at: DateTime<Utc>) -> Transform {
    let toward_sun = to_dvec3(sun_direction(at)).as_vec3();
    let up = if toward_sun.z.abs() > 0.99 { Vec3::X } else { Vec3::Z };
    Transform::IDENTITY.looking_to(-toward_sun, up)
}

fn advance_clock(mut clock: ResMut<SceneClock>, time: Res<Time>) {
    if clock.should_animate {
        clock.advance(time.delta_secs_f64());
    }
}

fn orient_sun(clock: Res<SceneClock>, mut sun: Query<&mut Transform, With<Sun>>) {
    if !clock.is_changed() {
        return;
    }
    for mut transform in &mut sun {
        *transform = sun_transform(clock.current);
    }
}

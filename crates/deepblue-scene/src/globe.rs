//! Globe body, imagery layers, atmosphere and sky

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageFormatSetting, ImageLoaderSettings};
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, PrimitiveTopology, TextureDimension, TextureFormat};

use deepblue_core::config::{GlobeAppearance, ImageryConfig};
use deepblue_core::geodesy::{enu_frame, from_degrees, WGS84_A};

use crate::camera::GlobeCamera;
use crate::origin::{to_dvec3, WorldOrigin};

/// Latitude where the Web Mercator tile pyramid ends
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

const LON_SEGMENTS: u32 = 128;
const LAT_SEGMENTS: u32 = 64;
const ATMOSPHERE_THICKNESS_M: f32 = 60_000.0;
const SKY_RADIUS_M: f32 = 1.0e9;
const OCEAN_COLOR: Color = Color::srgb(0.05, 0.12, 0.25);

pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeSettings>()
            .init_resource::<ImageryLayers>()
            .add_systems(Startup, spawn_globe)
            .add_systems(
                Update,
                (apply_globe_settings, apply_imagery, keep_sky_around_camera),
            );
    }
}

/// Marker for the ellipsoid mesh
#[derive(Component)]
pub struct GlobeBody;

/// Marker for the translucent atmosphere shell
#[derive(Component)]
pub struct SkyAtmosphere;

/// Marker for the star sphere
#[derive(Component)]
pub struct SkyBox;

#[derive(Resource, Debug, Clone, Default)]
pub struct GlobeSettings(pub GlobeAppearance);

/// One imagery source draped over the globe
#[derive(Debug, Clone)]
pub struct ImageryLayer {
    pub url_template: String,
    pub credit: String,
    /// The single z=0 tile covering the whole Mercator square
    pub base_tile: Option<Handle<Image>>,
}

/// Layers in draw order; the last textured layer is the one shown
#[derive(Resource, Debug, Clone)]
pub struct ImageryLayers {
    layers: Vec<ImageryLayer>,
}

impl Default for ImageryLayers {
    fn default() -> Self {
        Self {
            layers: vec![ImageryLayer {
                url_template: "builtin:ocean".to_string(),
                credit: String::new(),
                base_tile: None,
            }],
        }
    }
}

impl ImageryLayers {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageryLayer> {
        self.layers.iter()
    }

    pub fn push(&mut self, layer: ImageryLayer) {
        self.layers.push(layer);
    }

    /// Start fetching the base tile of a templated layer and append it
    pub fn add_templated(&mut self, imagery: &ImageryConfig, asset_server: &AssetServer) {
        let url = imagery.tile_url(0, 0, 0);
        // Tile URLs carry no extension, so the decoder has to sniff the bytes
        let handle = asset_server.load_with_settings::<Image, ImageLoaderSettings>(
            url.clone(),
            |settings: &mut ImageLoaderSettings| settings.format = ImageFormatSetting::Guess,
        );
        tracing::debug!(%url, "Imagery base tile requested");
        self.push(ImageryLayer {
            url_template: imagery.url_template.clone(),
            credit: imagery.credit.clone(),
            base_tile: Some(handle),
        });
    }

    pub fn top_texture(&self) -> Option<Handle<Image>> {
        self.layers.iter().rev().find_map(|l| l.base_tile.clone())
    }
}

/// Texture v coordinate of a latitude in a single Web Mercator tile
pub fn mercator_v(latitude_deg: f64) -> f32 {
    let lat = latitude_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (0.5 - y / (2.0 * std::f64::consts::PI)) as f32
}

/// WGS84 ellipsoid in scene coordinates with Mercator texture coordinates
pub fn ellipsoid_mesh(origin: &WorldOrigin, lon_segments: u32, lat_segments: u32) -> Mesh {
    let columns = lon_segments + 1;
    let rows = lat_segments + 1;
    let mut positions = Vec::with_capacity((columns * rows) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());
    let mut uvs = Vec::with_capacity(positions.capacity());

    for row in 0..rows {
        let lat = 90.0 - 180.0 * row as f64 / lat_segments as f64;
        for col in 0..columns {
            let lon = -180.0 + 360.0 * col as f64 / lon_segments as f64;
            positions.push(origin.to_local(from_degrees(lon, lat, 0.0)).to_array());
            normals.push(to_dvec3(enu_frame(lon, lat).up).as_vec3().to_array());
            uvs.push([col as f32 / lon_segments as f32, mercator_v(lat)]);
        }
    }

    let mut indices = Vec::with_capacity((lon_segments * lat_segments * 6) as usize);
    for row in 0..lat_segments {
        for col in 0..lon_segments {
            let a = row * columns + col;
            let b = a + columns;
            // Counter-clockwise seen from outside
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Deterministic star field for the sky sphere
fn starfield_image(width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 4, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );

    if let Some(data) = image.data.as_mut() {
        let mut state: u32 = 0x9e37_79b9;
        for pixel in data.chunks_exact_mut(4) {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state % 997 == 0 {
                let level = 150 + (state >> 24) as u8 % 106;
                pixel[0] = level;
                pixel[1] = level;
                pixel[2] = level.saturating_add(10);
            }
        }
    }
    image
}

fn spawn_globe(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    origin: Res<WorldOrigin>,
) {
    commands.spawn((
        Mesh3d(meshes.add(ellipsoid_mesh(&origin, LON_SEGMENTS, LAT_SEGMENTS))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: OCEAN_COLOR,
            perceptual_roughness: 0.9,
            metallic: 0.0,
            ..default()
        })),
        Transform::IDENTITY,
        GlobeBody,
    ));

    let earth_center = origin.to_local(deepblue_core::Cartesian3::ZERO);
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(64, 32))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(0.45, 0.65, 1.0, 0.15),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::from_translation(earth_center)
            .with_scale(Vec3::splat(WGS84_A as f32 + ATMOSPHERE_THICKNESS_M)),
        SkyAtmosphere,
    ));

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(32, 16))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(images.add(starfield_image(1024, 512))),
            unlit: true,
            cull_mode: None,
            ..default()
        })),
        Transform::from_scale(Vec3::splat(SKY_RADIUS_M)),
        Visibility::Hidden,
        SkyBox,
    ));

    tracing::debug!("Globe spawned");
}

fn visibility(show: bool) -> Visibility {
    if show {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn apply_globe_settings(
    settings: Res<GlobeSettings>,
    mut clear_color: ResMut<ClearColor>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut globe: Query<(&mut Visibility, &MeshMaterial3d<StandardMaterial>), With<GlobeBody>>,
    mut atmosphere: Query<&mut Visibility, (With<SkyAtmosphere>, Without<GlobeBody>)>,
    mut sky: Query<&mut Visibility, (With<SkyBox>, Without<GlobeBody>, Without<SkyAtmosphere>)>,
) {
    if !settings.is_changed() {
        return;
    }
    let appearance = &settings.0;

    let [r, g, b] = appearance.background;
    clear_color.0 = Color::srgb(r, g, b);

    for (mut vis, material) in &mut globe {
        *vis = visibility(appearance.show);
        if let Some(material) = materials.get_mut(&material.0) {
            material.unlit = !appearance.enable_lighting;
        }
    }
    for mut vis in &mut atmosphere {
        *vis = visibility(appearance.show_sky_atmosphere);
    }
    for mut vis in &mut sky {
        *vis = visibility(appearance.show_sky_box);
    }
}

fn apply_imagery(
    layers: Res<ImageryLayers>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    globe: Query<&MeshMaterial3d<StandardMaterial>, With<GlobeBody>>,
) {
    if !layers.is_changed() {
        return;
    }
    let texture = layers.top_texture();
    for material in &globe {
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color = if texture.is_some() {
                Color::WHITE
            } else {
                OCEAN_COLOR
            };
            material.base_color_texture = texture.clone();
        }
    }
}

fn keep_sky_around_camera(
    camera: Query<&Transform, (With<GlobeCamera>, Changed<Transform>)>,
    mut sky: Query<&mut Transform, (With<SkyBox>, Without<GlobeCamera>)>,
) {
    let Ok(camera) = camera.single() else { return };
    for mut transform in &mut sky {
        transform.translation = camera.translation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_v_covers_tile() {
        assert!((mercator_v(0.0) - 0.5).abs() < 1e-6);
        assert!(mercator_v(MERCATOR_MAX_LAT_DEG).abs() < 1e-4);
        assert!((mercator_v(-MERCATOR_MAX_LAT_DEG) - 1.0).abs() < 1e-4);
        // Poles clamp to the tile edge
        assert_eq!(mercator_v(90.0), mercator_v(MERCATOR_MAX_LAT_DEG));
    }

    #[test]
    fn test_ellipsoid_mesh_layout() {
        let mesh = ellipsoid_mesh(&WorldOrigin::default(), 8, 4);
        assert_eq!(mesh.count_vertices(), 9 * 5);
        match mesh.indices() {
            Some(Indices::U32(indices)) => assert_eq!(indices.len(), 8 * 4 * 6),
            other => panic!("unexpected indices {other:?}"),
        }
    }

    #[test]
    fn test_imagery_layers_replace() {
        let mut layers = ImageryLayers::default();
        assert_eq!(layers.len(), 1);
        assert!(layers.top_texture().is_none());
        layers.clear();
        assert!(layers.is_empty());
        layers.push(ImageryLayer {
            url_template: "https://tiles.example.com/{z}/{y}/{x}".to_string(),
            credit: "Example".to_string(),
            base_tile: Some(Handle::default()),
        });
        assert_eq!(layers.len(), 1);
        assert!(layers.top_texture().is_some());
    }

    #[test]
    fn test_starfield_has_stars() {
        let image = starfield_image(256, 256);
        let data = image.data.as_ref().unwrap();
        assert!(data.chunks_exact(4).any(|p| p[0] > 100));
    }
}

//! Loader host: runs the asset loader against the Bevy world
//!
//! Owns the dialog registration for the "Load Data" button, feeds selections
//! from the viewer services into the [`AssetLoader`], and implements
//! [`ModelScene`] on top of the asset server and the globe camera.

use std::collections::HashMap;
use std::time::Duration;

use bevy::asset::LoadState;
use bevy::ecs::system::SystemParam;
use bevy::gltf::{Gltf, GltfAssetLabel};
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy::transform::TransformSystems;

use deepblue_core::geodesy::frame_sphere;
use deepblue_core::{
    AssetLoader, BoundingSphere, DialogRegistration, LoadEvent, ModelHandle, ModelRequest,
    ModelScene, ModelSource, Readiness, SceneSelector,
};
use deepblue_scene::{CameraFlight, CameraState, WorldOrigin, FIELD_OF_VIEW_Y};

use crate::app::{SharedServices, ViewerSettings};
use crate::blobs::MemoryBlobStore;
use crate::file_picker::{dialog_hook, PickerInput};

pub struct LoaderHostPlugin;

impl Plugin for LoaderHostPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadedModels>()
            .add_systems(Startup, mount_loader)
            .add_systems(
                Update,
                (track_model_assets, drive_loader)
                    .chain()
                    .run_if(resource_exists::<ModelLoader>),
            )
            // Scene instances spawn after Update; their transforms are valid
            // once propagation has run
            .add_systems(
                PostUpdate,
                mark_spawned_models.after(TransformSystems::Propagate),
            )
            .add_systems(Last, teardown_on_exit);
    }
}

/// The mounted asset loader and its dialog registration
#[derive(Resource)]
pub struct ModelLoader {
    pub loader: AssetLoader,
    registration: DialogRegistration,
}

enum ModelAsset {
    /// First scene of a binary glTF, addressed by label
    Scene(Handle<Scene>),
    /// Whole glTF document; the scene is picked once it has loaded
    Document(Handle<Gltf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryState {
    Loading,
    Spawning,
    Spawned,
    Failed(String),
}

struct ModelEntry {
    entity: Entity,
    asset: ModelAsset,
    state: EntryState,
}

/// Bevy-side state of every model the loader added
#[derive(Resource, Default)]
pub struct LoadedModels {
    entries: HashMap<ModelHandle, ModelEntry>,
}

impl LoadedModels {
    fn readiness(&self, handle: ModelHandle) -> Readiness {
        match self.entries.get(&handle).map(|e| &e.state) {
            Some(EntryState::Spawned) => Readiness::Ready,
            Some(EntryState::Failed(reason)) => Readiness::Failed(reason.clone()),
            Some(EntryState::Loading | EntryState::Spawning) => Readiness::Pending,
            None => Readiness::Failed("unknown model".to_string()),
        }
    }
}

/// [`ModelScene`] over the asset server, the model entities and the camera
#[derive(SystemParam)]
pub struct BevyModelScene<'w, 's> {
    commands: Commands<'w, 's>,
    asset_server: Res<'w, AssetServer>,
    models: ResMut<'w, LoadedModels>,
    origin: Res<'w, WorldOrigin>,
    camera: ResMut<'w, CameraState>,
    flight: ResMut<'w, CameraFlight>,
    meshes: Res<'w, Assets<Mesh>>,
    children: Query<'w, 's, &'static Children>,
    mesh_query: Query<'w, 's, (&'static Mesh3d, &'static GlobalTransform)>,
    roots: Query<'w, 's, &'static GlobalTransform>,
}

impl BevyModelScene<'_, '_> {
    /// Stand-in bounds around the model root for models without geometry
    fn anchor_sphere(&self, handle: ModelHandle) -> Result<BoundingSphere, String> {
        let entry = self
            .models
            .entries
            .get(&handle)
            .ok_or_else(|| format!("unknown model {handle}"))?;
        let translation = self
            .roots
            .get(entry.entity)
            .map(|global| global.translation())
            .unwrap_or(self.origin.anchor_transform().translation);
        Ok(anchor_sphere(translation, &self.origin))
    }
}

impl ModelScene for BevyModelScene<'_, '_> {
    fn add_model(&mut self, request: &ModelRequest) -> Result<ModelHandle, String> {
        if request.asset_path.is_empty() {
            return Err("empty asset path".to_string());
        }

        let handle = ModelHandle::new();
        let root = (
            self.origin.anchor_transform(),
            Visibility::default(),
            Name::new(handle.to_string()),
        );

        let (entity, asset, state) = match request.scene {
            SceneSelector::FirstScene => {
                let scene: Handle<Scene> = self
                    .asset_server
                    .load(GltfAssetLabel::Scene(0).from_asset(request.asset_path.clone()));
                let entity = self.commands.spawn((SceneRoot(scene.clone()), root)).id();
                (entity, ModelAsset::Scene(scene), EntryState::Spawning)
            }
            SceneSelector::DefaultScene => {
                let document: Handle<Gltf> = self.asset_server.load(request.asset_path.clone());
                let entity = self.commands.spawn(root).id();
                (entity, ModelAsset::Document(document), EntryState::Loading)
            }
        };

        tracing::debug!(%handle, path = %request.asset_path, "Model entity spawned");
        self.models.entries.insert(
            handle,
            ModelEntry {
                entity,
                asset,
                state,
            },
        );
        Ok(handle)
    }

    fn readiness(&self, handle: ModelHandle) -> Readiness {
        self.models.readiness(handle)
    }

    fn bounding_sphere(&self, handle: ModelHandle) -> Option<BoundingSphere> {
        let entry = self.models.entries.get(&handle)?;

        let mut points = Vec::new();
        let mut stack = vec![entry.entity];
        while let Some(entity) = stack.pop() {
            if let Ok(children) = self.children.get(entity) {
                stack.extend(children.iter());
            }
            let Ok((mesh, global)) = self.mesh_query.get(entity) else {
                continue;
            };
            let Some(mesh) = self.meshes.get(&mesh.0) else {
                continue;
            };
            if let Some(VertexAttributeValues::Float32x3(positions)) =
                mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            {
                points.extend(
                    positions
                        .iter()
                        .map(|p| global.transform_point(Vec3::from(*p))),
                );
            }
        }

        sphere_from_points(points, &self.origin)
    }

    fn fly_to_bounding_sphere(
        &mut self,
        sphere: &BoundingSphere,
        duration: Duration,
    ) -> Result<(), String> {
        if !sphere.radius.is_finite() || sphere.radius <= 0.0 {
            return Err(format!("degenerate bounding sphere (radius {})", sphere.radius));
        }
        self.flight.fly_to_sphere(&self.camera, sphere, duration);
        Ok(())
    }

    fn zoom_to(&mut self, handle: ModelHandle) -> Result<(), String> {
        let sphere = match self.bounding_sphere(handle) {
            Some(sphere) => sphere,
            None => self.anchor_sphere(handle)?,
        };
        self.flight.cancel();
        self.camera.frame = frame_sphere(&sphere, FIELD_OF_VIEW_Y as f64);
        Ok(())
    }
}

/// Smallest axis-aligned box around `points` in scene space, as a sphere in
/// ECEF
fn sphere_from_points(
    points: impl IntoIterator<Item = Vec3>,
    origin: &WorldOrigin,
) -> Option<BoundingSphere> {
    let mut points = points.into_iter().peekable();
    points.peek()?;

    let (min, max) = points.fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(p), max.max(p)),
    );
    let center = (min + max) * 0.5;
    Some(BoundingSphere {
        center: origin.to_ecef(center),
        radius: ((max - min).length() * 0.5) as f64,
    })
}

/// Bounds used when a model has no measurable geometry
const ANCHOR_RADIUS_M: f64 = 50.0;

fn anchor_sphere(translation: Vec3, origin: &WorldOrigin) -> BoundingSphere {
    BoundingSphere {
        center: origin.to_ecef(translation),
        radius: ANCHOR_RADIUS_M,
    }
}

fn mount_loader(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    services: Res<SharedServices>,
) {
    let registration = services.0.register_dialog(dialog_hook());
    let loader = AssetLoader::with_default_strategies(&settings.config.framing);

    if let Some(url) = initial_model_url(&settings.env.base_url) {
        tracing::info!(%url, "Loading model from URL parameter");
        services.0.submit(ModelSource::Url(url));
    }

    commands.insert_resource(ModelLoader {
        loader,
        registration,
    });
}

/// Follow asset loads and attach document scenes once they are available
fn track_model_assets(
    mut commands: Commands,
    mut models: ResMut<LoadedModels>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    for (handle, entry) in models.entries.iter_mut() {
        if !matches!(entry.state, EntryState::Loading | EntryState::Spawning) {
            continue;
        }

        let id = match &entry.asset {
            ModelAsset::Scene(scene) => scene.id().untyped(),
            ModelAsset::Document(document) => document.id().untyped(),
        };
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(id) {
            tracing::error!(%handle, error = %err, "Failed to load model");
            entry.state = EntryState::Failed(err.to_string());
            continue;
        }

        let ModelAsset::Document(document) = &entry.asset else {
            continue;
        };
        if entry.state != EntryState::Loading {
            continue;
        }
        let Some(gltf) = gltf_assets.get(document) else {
            continue;
        };

        // Use the default scene, or the first one if the document has none
        match gltf
            .default_scene
            .clone()
            .or_else(|| gltf.scenes.first().cloned())
        {
            Some(scene) => {
                commands.entity(entry.entity).insert(SceneRoot(scene));
                entry.state = EntryState::Spawning;
            }
            None => {
                tracing::error!(%handle, "glTF document has no scenes");
                entry.state = EntryState::Failed("glTF document has no scenes".to_string());
            }
        }
    }
}

fn mark_spawned_models(mut models: ResMut<LoadedModels>, children: Query<&Children>) {
    for entry in models.entries.values_mut() {
        if entry.state == EntryState::Spawning
            && children.get(entry.entity).is_ok_and(|c| !c.is_empty())
        {
            entry.state = EntryState::Spawned;
        }
    }
}

fn drive_loader(
    mut host: ResMut<ModelLoader>,
    services: Res<SharedServices>,
    mut scene: BevyModelScene,
    mut blobs: ResMut<MemoryBlobStore>,
) {
    for source in services.0.drain_requests() {
        host.loader.submit(source);
    }
    if !host.loader.is_busy() && host.loader.queued() == 0 {
        return;
    }

    for event in host.loader.update(&mut scene, &mut *blobs, &mut PickerInput) {
        match event {
            LoadEvent::Added { handle, strategy } => {
                tracing::debug!(%handle, strategy, "Waiting for model to load");
            }
            LoadEvent::Framed { handle, outcome } => {
                tracing::info!(%handle, ?outcome, "Model framed");
            }
            // Logged by the loader where the failure happened
            LoadEvent::Failed(_) => {}
        }
    }
}

fn teardown_on_exit(
    mut exits: MessageReader<AppExit>,
    host: Option<ResMut<ModelLoader>>,
    services: Res<SharedServices>,
    mut blobs: ResMut<MemoryBlobStore>,
) {
    if exits.read().next().is_none() {
        return;
    }
    let Some(mut host) = host else { return };
    services.0.clear_dialog(host.registration);
    host.loader.teardown(&mut *blobs);
}

/// Model URL passed as `?model=` on the page URL
#[cfg(target_arch = "wasm32")]
fn initial_model_url(base_url: &str) -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    let value = web_sys::UrlSearchParams::new_with_str(&search)
        .ok()?
        .get("model")
        .filter(|value| !value.is_empty())?;
    Some(resolve_model_url(base_url, &value))
}

#[cfg(not(target_arch = "wasm32"))]
fn initial_model_url(_base_url: &str) -> Option<String> {
    None
}

/// Absolute URLs pass through; relative ones resolve under the base URL
///
/// The result for relative paths has no leading slash, so the asset server
/// resolves it against the page origin.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn resolve_model_url(base_url: &str, value: &str) -> String {
    if value.contains("://") {
        return value.to_string();
    }
    let base = base_url.trim_matches('/');
    let path = value.trim_start_matches('/');
    if base.is_empty() || path.starts_with(&format!("{base}/")) {
        path.to_string()
    } else {
        format!("{base}/{path}")
    }
}

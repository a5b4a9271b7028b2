//! Asset loader: strategies, scene insertion and camera framing
//!
//! A load runs in two phases. [`AssetLoader::load`] stages the payload,
//! walks the construction strategies in order and inserts the first model
//! that builds. Framing happens later from [`AssetLoader::update`], once the
//! scene reports the model ready. Selections arriving while a model is still
//! being framed wait in a FIFO queue.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::FramingConfig;
use crate::error::{BlobError, LoadError, StrategyFailure};
use crate::input::FileFilter;
use crate::scene::{BoundingSphere, ModelHandle};
use crate::strategy::{
    default_strategies, ConstructionStrategy, ModelRequest, ModelSource, ResolvedSource,
    GLB_MAGIC,
};

/// Model readiness as reported by the scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// The scene's model API, as seen by the loader
pub trait ModelScene {
    fn add_model(&mut self, request: &ModelRequest) -> Result<ModelHandle, String>;

    fn readiness(&self, handle: ModelHandle) -> Readiness;

    /// World-space bounds, `None` when the model has no geometry yet
    fn bounding_sphere(&self, handle: ModelHandle) -> Option<BoundingSphere>;

    fn fly_to_bounding_sphere(
        &mut self,
        sphere: &BoundingSphere,
        duration: Duration,
    ) -> Result<(), String>;

    /// Unanimated zoom-to-fit
    fn zoom_to(&mut self, handle: ModelHandle) -> Result<(), String>;
}

/// Address of an in-memory payload, `memory://<uuid>/<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl {
    id: Uuid,
    name: String,
}

impl BlobUrl {
    pub const SCHEME: &'static str = "memory";

    pub fn new(name: &str) -> Self {
        let name: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '#' | '?') { '_' } else { c })
            .collect();
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }

    /// Path inside the memory source, without the scheme
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.id, self.name)
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", Self::SCHEME, self.id, self.name)
    }
}

/// Storage for transient model payloads
pub trait BlobStore {
    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<BlobUrl, BlobError>;

    fn release(&mut self, url: &BlobUrl);
}

/// The file input control that produced a selection
pub trait FileInput {
    /// Clear the selection so the same file can be picked again
    fn reset(&mut self);
}

/// How the camera ended up after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingOutcome {
    Flew { duration: Duration },
    ZoomedToFit,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Added {
        handle: ModelHandle,
        strategy: &'static str,
    },
    Framed {
        handle: ModelHandle,
        outcome: FramingOutcome,
    },
    Failed(LoadError),
}

/// Models added to the scene, in insertion order
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    handles: Vec<ModelHandle>,
}

impl ModelRegistry {
    fn push(&mut self, handle: ModelHandle) {
        self.handles.push(handle);
    }

    pub fn handles(&self) -> &[ModelHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn last(&self) -> Option<ModelHandle> {
        self.handles.last().copied()
    }

    pub fn contains(&self, handle: ModelHandle) -> bool {
        self.handles.contains(&handle)
    }
}

pub struct AssetLoader {
    strategies: Vec<Box<dyn ConstructionStrategy>>,
    filter: FileFilter,
    flight_duration: Duration,
    registry: ModelRegistry,
    blobs: Vec<BlobUrl>,
    queue: VecDeque<ModelSource>,
    framing: Option<ModelHandle>,
    torn_down: bool,
}

impl AssetLoader {
    pub fn new(strategies: Vec<Box<dyn ConstructionStrategy>>, framing: &FramingConfig) -> Self {
        Self {
            strategies,
            filter: FileFilter::gltf_models(),
            flight_duration: Duration::from_secs_f64(framing.flight_duration_secs.max(0.0)),
            registry: ModelRegistry::default(),
            blobs: Vec::new(),
            queue: VecDeque::new(),
            framing: None,
            torn_down: false,
        }
    }

    pub fn with_default_strategies(framing: &FramingConfig) -> Self {
        Self::new(default_strategies(), framing)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Blob URLs currently held by loaded models
    pub fn tracked_blobs(&self) -> &[BlobUrl] {
        &self.blobs
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_busy(&self) -> bool {
        self.framing.is_some()
    }

    /// Queue a selection; it starts once earlier loads are framed
    pub fn submit(&mut self, source: ModelSource) {
        if self.torn_down {
            debug!(name = source.name(), "Viewer torn down, ignoring selection");
            return;
        }
        self.queue.push_back(source);
    }

    /// Build and insert a model, leaving framing to [`Self::update`]
    ///
    /// Refused with [`LoadError::Busy`] while an earlier model is still
    /// waiting to be framed. On error nothing has been added to the scene
    /// and any blob staged for this call has been released.
    pub fn load<S, B>(
        &mut self,
        source: ModelSource,
        scene: &mut S,
        blobs: &mut B,
    ) -> Result<ModelHandle, LoadError>
    where
        S: ModelScene + ?Sized,
        B: BlobStore + ?Sized,
    {
        if let Some(handle) = self.framing {
            warn!(%handle, name = source.name(), "Load refused while a model is being framed");
            return Err(LoadError::Busy(handle));
        }
        self.construct(source, scene, blobs).map(|(handle, _)| handle)
    }

    fn construct<S, B>(
        &mut self,
        source: ModelSource,
        scene: &mut S,
        blobs: &mut B,
    ) -> Result<(ModelHandle, &'static str), LoadError>
    where
        S: ModelScene + ?Sized,
        B: BlobStore + ?Sized,
    {
        let staged = match &source {
            ModelSource::File { name, mime, bytes } => {
                if !self.filter.accepts(name, mime.as_deref()) {
                    warn!(%name, "Ignoring unsupported selection");
                    return Err(LoadError::Unsupported(name.clone()));
                }
                let staged = if bytes.is_empty() {
                    Err(BlobError::Empty(name.clone()))
                } else {
                    blobs.stage(&staged_name(name, bytes), bytes)
                };
                match staged {
                    Ok(blob) => Some(blob),
                    Err(e) => {
                        error!(%name, error = %e, "Model load failed");
                        return Err(e.into());
                    }
                }
            }
            ModelSource::Url(_) => None,
        };

        let asset_path = match (&staged, &source) {
            (Some(blob), _) => blob.to_string(),
            (None, ModelSource::Url(url)) => url.clone(),
            (None, ModelSource::File { name, .. }) => name.clone(),
        };
        let resolved = ResolvedSource {
            asset_path: &asset_path,
            name: source.name(),
            mime: match &source {
                ModelSource::File { mime, .. } => mime.as_deref(),
                ModelSource::Url(_) => None,
            },
            payload: match &source {
                ModelSource::File { bytes, .. } => Some(bytes.as_slice()),
                ModelSource::Url(_) => None,
            },
        };

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let request = match strategy.try_construct(&resolved) {
                Ok(request) => request,
                Err(reason) => {
                    debug!(strategy = strategy.name(), %reason, "Construction strategy declined");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason,
                    });
                    continue;
                }
            };

            match scene.add_model(&request) {
                Ok(handle) => {
                    self.registry.push(handle);
                    self.framing = Some(handle);
                    if let Some(blob) = staged {
                        self.blobs.push(blob);
                    }
                    info!(
                        %handle,
                        strategy = request.strategy,
                        name = resolved.name,
                        "Model added to scene"
                    );
                    return Ok((handle, request.strategy));
                }
                Err(reason) => {
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: format!("scene rejected model: {reason}"),
                    });
                }
            }
        }

        if let Some(blob) = staged {
            blobs.release(&blob);
        }
        let err = LoadError::AllStrategiesFailed(failures);
        error!(name = resolved.name, error = %err, "Model load failed");
        Err(err)
    }

    /// Advance pending work by one frame
    ///
    /// Frames the model in flight once it is ready, then starts the next
    /// queued selection. The input is reset after every load attempt.
    pub fn update<S, B, I>(&mut self, scene: &mut S, blobs: &mut B, input: &mut I) -> Vec<LoadEvent>
    where
        S: ModelScene + ?Sized,
        B: BlobStore + ?Sized,
        I: FileInput + ?Sized,
    {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        if let Some(handle) = self.framing {
            match scene.readiness(handle) {
                Readiness::Pending => return events,
                Readiness::Ready => {}
                Readiness::Failed(reason) => {
                    warn!(%handle, %reason, "Model did not become ready, framing anyway");
                }
            }
            self.framing = None;
            let outcome = self.frame(handle, scene);
            events.push(LoadEvent::Framed { handle, outcome });
        }

        if let Some(source) = self.queue.pop_front() {
            let result = self.construct(source, scene, blobs);
            input.reset();
            events.push(match result {
                Ok((handle, strategy)) => LoadEvent::Added { handle, strategy },
                Err(err) => LoadEvent::Failed(err),
            });
        }
        events
    }

    /// Move the camera onto a model, degrading instead of failing
    pub fn frame<S: ModelScene + ?Sized>(&self, handle: ModelHandle, scene: &mut S) -> FramingOutcome {
        if let Some(sphere) = scene.bounding_sphere(handle) {
            match scene.fly_to_bounding_sphere(&sphere, self.flight_duration) {
                Ok(()) => {
                    return FramingOutcome::Flew {
                        duration: self.flight_duration,
                    }
                }
                Err(e) => debug!(%handle, error = %e, "Fly-to failed, zooming instead"),
            }
        } else {
            debug!(%handle, "No bounding volume, zooming instead");
        }

        match scene.zoom_to(handle) {
            Ok(()) => FramingOutcome::ZoomedToFit,
            Err(e) => {
                debug!(%handle, error = %e, "Zoom-to failed, camera unchanged");
                FramingOutcome::Unchanged
            }
        }
    }

    /// Release every blob and drop queued work
    pub fn teardown<B: BlobStore + ?Sized>(&mut self, blobs: &mut B) {
        for blob in self.blobs.drain(..) {
            blobs.release(&blob);
        }
        self.queue.clear();
        self.framing = None;
        self.torn_down = true;
        debug!(models = self.registry.len(), "Asset loader torn down");
    }
}

/// Name under which a payload is staged; keeps a glTF extension so the
/// engine picks the right loader
fn staged_name(name: &str, bytes: &[u8]) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".glb") || lower.ends_with(".gltf") {
        name.to_string()
    } else if bytes.starts_with(GLB_MAGIC) {
        format!("{name}.glb")
    } else {
        format!("{name}.gltf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Cartesian3;
    use crate::strategy::tests::minimal_glb;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeScene {
        models: Vec<ModelRequest>,
        handles: Vec<ModelHandle>,
        readiness: HashMap<ModelHandle, Readiness>,
        bounds: Option<BoundingSphere>,
        flights: Vec<Duration>,
        zooms: Vec<ModelHandle>,
        fail_add: bool,
        fail_fly: bool,
        fail_zoom: bool,
        /// Models stay pending until flipped by the test
        hold_pending: bool,
    }

    impl ModelScene for FakeScene {
        fn add_model(&mut self, request: &ModelRequest) -> Result<ModelHandle, String> {
            if self.fail_add {
                return Err("primitive collection locked".to_string());
            }
            let handle = ModelHandle::new();
            self.models.push(request.clone());
            self.handles.push(handle);
            let state = if self.hold_pending {
                Readiness::Pending
            } else {
                Readiness::Ready
            };
            self.readiness.insert(handle, state);
            Ok(handle)
        }

        fn readiness(&self, handle: ModelHandle) -> Readiness {
            self.readiness
                .get(&handle)
                .cloned()
                .unwrap_or(Readiness::Failed("unknown".to_string()))
        }

        fn bounding_sphere(&self, _handle: ModelHandle) -> Option<BoundingSphere> {
            self.bounds
        }

        fn fly_to_bounding_sphere(
            &mut self,
            _sphere: &BoundingSphere,
            duration: Duration,
        ) -> Result<(), String> {
            if self.fail_fly {
                return Err("camera busy".to_string());
            }
            self.flights.push(duration);
            Ok(())
        }

        fn zoom_to(&mut self, handle: ModelHandle) -> Result<(), String> {
            if self.fail_zoom {
                return Err("no camera".to_string());
            }
            self.zooms.push(handle);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBlobs {
        live: Vec<BlobUrl>,
        released: Vec<BlobUrl>,
        issued: usize,
    }

    impl BlobStore for FakeBlobs {
        fn stage(&mut self, name: &str, _bytes: &[u8]) -> Result<BlobUrl, BlobError> {
            let url = BlobUrl::new(name);
            self.issued += 1;
            self.live.push(url.clone());
            Ok(url)
        }

        fn release(&mut self, url: &BlobUrl) {
            self.live.retain(|u| u != url);
            self.released.push(url.clone());
        }
    }

    #[derive(Default)]
    struct FakeInput {
        resets: usize,
    }

    impl FileInput for FakeInput {
        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    struct Declines(&'static str);

    impl ConstructionStrategy for Declines {
        fn name(&self) -> &'static str {
            self.0
        }

        fn try_construct(&self, _source: &ResolvedSource<'_>) -> Result<ModelRequest, String> {
            Err(format!("{} cannot build this", self.0))
        }
    }

    struct Builds(&'static str);

    impl ConstructionStrategy for Builds {
        fn name(&self) -> &'static str {
            self.0
        }

        fn try_construct(&self, source: &ResolvedSource<'_>) -> Result<ModelRequest, String> {
            Ok(ModelRequest {
                asset_path: source.asset_path.to_string(),
                scene: crate::strategy::SceneSelector::FirstScene,
                strategy: self.0,
            })
        }
    }

    fn sphere() -> BoundingSphere {
        BoundingSphere {
            center: Cartesian3::new(-2.4e6, 5.4e6, 2.4e6),
            radius: 40.0,
        }
    }

    fn glb_file() -> ModelSource {
        ModelSource::file("harbour.glb", minimal_glb())
    }

    #[test]
    fn test_first_success_after_failures_wins() {
        let mut loader = AssetLoader::new(
            vec![
                Box::new(Declines("a")),
                Box::new(Declines("b")),
                Box::new(Builds("c")),
                Box::new(Builds("d")),
            ],
            &FramingConfig::default(),
        );
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();

        let handle = loader.load(glb_file(), &mut scene, &mut blobs).unwrap();

        assert_eq!(scene.handles, vec![handle]);
        assert_eq!(scene.models[0].strategy, "c");
        assert_eq!(loader.registry().handles(), &[handle]);
        assert_eq!(blobs.live.len(), 1);
        assert!(blobs.released.is_empty());
        assert_eq!(loader.tracked_blobs(), blobs.live.as_slice());
    }

    #[test]
    fn test_all_failures_leave_no_state() {
        let mut loader = AssetLoader::new(
            vec![Box::new(Declines("a")), Box::new(Declines("b"))],
            &FramingConfig::default(),
        );
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();

        let err = loader.load(glb_file(), &mut scene, &mut blobs).unwrap_err();

        assert_eq!(err.attempts().len(), 2);
        assert!(scene.models.is_empty());
        assert!(loader.registry().is_empty());
        assert!(blobs.live.is_empty());
        assert_eq!(blobs.released.len(), 1);
        assert!(loader.tracked_blobs().is_empty());
        assert!(!loader.is_busy());

        // A retry stages a fresh blob instead of reusing the released one
        let _ = loader.load(glb_file(), &mut scene, &mut blobs);
        assert_eq!(blobs.issued, 2);
        assert_ne!(blobs.released[0], blobs.released[1]);
    }

    #[test]
    fn test_scene_rejection_counts_as_strategy_failure() {
        let mut loader = AssetLoader::new(vec![Box::new(Builds("only"))], &FramingConfig::default());
        let mut scene = FakeScene {
            fail_add: true,
            ..Default::default()
        };
        let mut blobs = FakeBlobs::default();

        let err = loader.load(glb_file(), &mut scene, &mut blobs).unwrap_err();

        assert!(err.attempts()[0].reason.contains("scene rejected"));
        assert!(blobs.live.is_empty());
    }

    #[test]
    fn test_unsupported_file_is_rejected_before_staging() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();

        let err = loader
            .load(ModelSource::file("notes.txt", b"hello".to_vec()), &mut scene, &mut blobs)
            .unwrap_err();

        assert_eq!(err, LoadError::Unsupported("notes.txt".to_string()));
        assert_eq!(blobs.issued, 0);
    }

    #[test]
    fn test_missing_bounds_falls_back_to_zoom() {
        let loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let handle = ModelHandle::new();

        let mut scene = FakeScene::default();
        assert_eq!(loader.frame(handle, &mut scene), FramingOutcome::ZoomedToFit);
        assert_eq!(scene.zooms, vec![handle]);

        let mut scene = FakeScene {
            bounds: Some(sphere()),
            fail_fly: true,
            ..Default::default()
        };
        assert_eq!(loader.frame(handle, &mut scene), FramingOutcome::ZoomedToFit);

        let mut scene = FakeScene {
            fail_zoom: true,
            ..Default::default()
        };
        assert_eq!(loader.frame(handle, &mut scene), FramingOutcome::Unchanged);
    }

    #[test]
    fn test_valid_glb_end_to_end() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene {
            bounds: Some(sphere()),
            hold_pending: true,
            ..Default::default()
        };
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        loader.submit(glb_file());
        let events = loader.update(&mut scene, &mut blobs, &mut input);
        let handle = match events.as_slice() {
            [LoadEvent::Added { handle, strategy }] => {
                assert_eq!(*strategy, "binary-gltf-scene");
                *handle
            }
            other => panic!("unexpected events {other:?}"),
        };
        assert_eq!(input.resets, 1);
        assert!(blobs.live[0].to_string().starts_with("memory://"));

        // Still loading: no framing yet
        assert!(loader.update(&mut scene, &mut blobs, &mut input).is_empty());
        assert!(scene.flights.is_empty());

        scene.readiness.insert(handle, Readiness::Ready);
        let events = loader.update(&mut scene, &mut blobs, &mut input);

        assert_eq!(
            events,
            vec![LoadEvent::Framed {
                handle,
                outcome: FramingOutcome::Flew {
                    duration: Duration::from_secs(1)
                }
            }]
        );
        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.flights, vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_garbage_file_end_to_end() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        loader.submit(ModelSource::file("broken.glb", vec![0xde, 0xad, 0xbe, 0xef]));
        let events = loader.update(&mut scene, &mut blobs, &mut input);

        match events.as_slice() {
            [LoadEvent::Failed(err)] => assert_eq!(err.attempts().len(), 3),
            other => panic!("unexpected events {other:?}"),
        }
        assert!(scene.models.is_empty());
        assert!(loader.registry().is_empty());
        assert!(blobs.live.is_empty());
        assert_eq!(input.resets, 1);
    }

    #[test]
    fn test_overlapping_loads_are_serialized() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene {
            hold_pending: true,
            ..Default::default()
        };
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        loader.submit(glb_file());
        loader.submit(ModelSource::Url("https://cdn.example.com/pier.gltf".to_string()));

        loader.update(&mut scene, &mut blobs, &mut input);
        loader.update(&mut scene, &mut blobs, &mut input);
        assert_eq!(scene.models.len(), 1);
        assert_eq!(loader.queued(), 1);

        let first = scene.handles[0];
        scene.readiness.insert(first, Readiness::Ready);
        let events = loader.update(&mut scene, &mut blobs, &mut input);

        assert!(matches!(events[0], LoadEvent::Framed { handle, .. } if handle == first));
        assert!(matches!(
            events[1],
            LoadEvent::Added {
                strategy: "gltf-document-scene",
                ..
            }
        ));
        assert_eq!(loader.registry().len(), 2);
        assert_eq!(input.resets, 2);
    }

    #[test]
    fn test_empty_file_fails_without_staging() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        loader.submit(ModelSource::file("empty.glb", Vec::new()));
        let events = loader.update(&mut scene, &mut blobs, &mut input);

        assert_eq!(
            events,
            vec![LoadEvent::Failed(LoadError::Blob(BlobError::Empty(
                "empty.glb".to_string()
            )))]
        );
        assert_eq!(blobs.issued, 0);
        assert!(scene.models.is_empty());
        assert_eq!(input.resets, 1);
    }

    #[test]
    fn test_direct_load_waits_for_framing() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene::default();
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        let first = loader.load(glb_file(), &mut scene, &mut blobs).unwrap();
        let err = loader.load(glb_file(), &mut scene, &mut blobs).unwrap_err();
        assert_eq!(err, LoadError::Busy(first));
        assert_eq!(scene.models.len(), 1);
        assert_eq!(blobs.issued, 1);

        let events = loader.update(&mut scene, &mut blobs, &mut input);
        assert_eq!(
            events,
            vec![LoadEvent::Framed {
                handle: first,
                outcome: FramingOutcome::ZoomedToFit
            }]
        );
        assert!(loader.load(glb_file(), &mut scene, &mut blobs).is_ok());
    }

    #[test]
    fn test_failed_readiness_still_frames() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene {
            hold_pending: true,
            ..Default::default()
        };
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        let handle = loader.load(glb_file(), &mut scene, &mut blobs).unwrap();
        scene
            .readiness
            .insert(handle, Readiness::Failed("texture decode".to_string()));

        let events = loader.update(&mut scene, &mut blobs, &mut input);
        assert_eq!(
            events,
            vec![LoadEvent::Framed {
                handle,
                outcome: FramingOutcome::ZoomedToFit
            }]
        );
    }

    #[test]
    fn test_teardown_releases_blobs_and_stops_work() {
        let mut loader = AssetLoader::with_default_strategies(&FramingConfig::default());
        let mut scene = FakeScene {
            hold_pending: true,
            ..Default::default()
        };
        let mut blobs = FakeBlobs::default();
        let mut input = FakeInput::default();

        loader.load(glb_file(), &mut scene, &mut blobs).unwrap();
        loader.submit(glb_file());
        loader.teardown(&mut blobs);
        loader.submit(glb_file());

        assert!(blobs.live.is_empty());
        assert_eq!(loader.queued(), 0);
        assert!(loader.update(&mut scene, &mut blobs, &mut input).is_empty());
        assert_eq!(input.resets, 0);
        // Registry is append-only; teardown does not rewrite history
        assert_eq!(loader.registry().len(), 1);
    }

    #[test]
    fn test_staged_name_keeps_loader_extension() {
        assert_eq!(staged_name("a.GLB", &minimal_glb()), "a.GLB");
        assert_eq!(staged_name("download", &minimal_glb()), "download.glb");
        assert_eq!(staged_name("download", b"{}"), "download.gltf");
        assert!(BlobUrl::new("dir/x.glb").relative_path().ends_with("/dir_x.glb"));
    }
}

//! Model construction strategies
//!
//! A selected asset can be turned into a scene model in several ways. Each
//! [`ConstructionStrategy`] either produces a [`ModelRequest`] the scene knows
//! how to spawn, or explains why it declined. The loader tries them in order.

use serde_json::Value;

/// Asset handed to the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A user-selected file held in memory
    File {
        name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
    /// A remote or server-relative URL
    Url(String),
}

impl ModelSource {
    pub fn file(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ModelSource::File {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    /// Display name: the file name, or the last URL path segment
    pub fn name(&self) -> &str {
        match self {
            ModelSource::File { name, .. } => name,
            ModelSource::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
            }
        }
    }
}

/// A source once its payload, if any, has been staged under an asset path
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSource<'a> {
    pub asset_path: &'a str,
    pub name: &'a str,
    pub mime: Option<&'a str>,
    /// In-memory bytes; `None` for URL sources
    pub payload: Option<&'a [u8]>,
}

impl ResolvedSource<'_> {
    fn has_extension(&self, ext: &str) -> bool {
        std::path::Path::new(self.name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Which scene of a glTF document to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSelector {
    /// The first scene, addressed by label (`#Scene0`)
    FirstScene,
    /// The document's default scene, falling back to its first one
    DefaultScene,
}

/// What the scene should spawn for a successful construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub asset_path: String,
    pub scene: SceneSelector,
    pub strategy: &'static str,
}

pub trait ConstructionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_construct(&self, source: &ResolvedSource<'_>) -> Result<ModelRequest, String>;
}

pub const GLB_MAGIC: &[u8; 4] = b"glTF";
pub const GLB_HEADER_LEN: usize = 12;

/// Parsed binary glTF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub version: u32,
    pub length: u32,
}

pub fn parse_glb_header(bytes: &[u8]) -> Result<GlbHeader, String> {
    if bytes.len() < GLB_HEADER_LEN {
        return Err(format!(
            "payload is {} bytes, shorter than the GLB header",
            bytes.len()
        ));
    }
    if &bytes[0..4] != GLB_MAGIC {
        return Err("missing glTF magic".to_string());
    }
    let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    let header = GlbHeader {
        version: word(4),
        length: word(8),
    };
    if header.version != 2 {
        return Err(format!("unsupported GLB version {}", header.version));
    }
    if (header.length as usize) < GLB_HEADER_LEN || header.length as usize > bytes.len() {
        return Err(format!(
            "declared length {} does not fit payload of {} bytes",
            header.length,
            bytes.len()
        ));
    }
    Ok(header)
}

/// Binary glTF, instantiated through its first scene label
pub struct BinaryGltfScene;

impl ConstructionStrategy for BinaryGltfScene {
    fn name(&self) -> &'static str {
        "binary-gltf-scene"
    }

    fn try_construct(&self, source: &ResolvedSource<'_>) -> Result<ModelRequest, String> {
        let binary_mime = source.mime == Some("model/gltf-binary");
        match source.payload {
            Some(bytes) => {
                parse_glb_header(bytes)?;
            }
            None if source.has_extension("glb") || binary_mime => {}
            None => return Err("URL does not name a .glb asset".to_string()),
        }
        Ok(ModelRequest {
            asset_path: source.asset_path.to_string(),
            scene: SceneSelector::FirstScene,
            strategy: self.name(),
        })
    }
}

/// JSON glTF document, instantiated through its default scene
pub struct GltfDocumentScene;

impl ConstructionStrategy for GltfDocumentScene {
    fn name(&self) -> &'static str {
        "gltf-document-scene"
    }

    fn try_construct(&self, source: &ResolvedSource<'_>) -> Result<ModelRequest, String> {
        match source.payload {
            Some(bytes) => {
                let doc: Value =
                    serde_json::from_slice(bytes).map_err(|e| format!("not a glTF document: {e}"))?;
                if doc.pointer("/asset/version").and_then(Value::as_str).is_none() {
                    return Err("glTF document has no asset.version".to_string());
                }
            }
            None if source.has_extension("gltf") => {}
            None => return Err("URL does not name a .gltf asset".to_string()),
        }
        Ok(ModelRequest {
            asset_path: source.asset_path.to_string(),
            scene: SceneSelector::DefaultScene,
            strategy: self.name(),
        })
    }
}

/// Last resort for URLs: hand them to the engine without inspection
pub struct UntypedGltf;

impl ConstructionStrategy for UntypedGltf {
    fn name(&self) -> &'static str {
        "untyped-gltf"
    }

    fn try_construct(&self, source: &ResolvedSource<'_>) -> Result<ModelRequest, String> {
        if source.payload.is_some() {
            return Err("in-memory payloads must pass a typed strategy".to_string());
        }
        Ok(ModelRequest {
            asset_path: source.asset_path.to_string(),
            scene: SceneSelector::DefaultScene,
            strategy: self.name(),
        })
    }
}

/// Strategies in priority order
pub fn default_strategies() -> Vec<Box<dyn ConstructionStrategy>> {
    vec![
        Box::new(BinaryGltfScene),
        Box::new(GltfDocumentScene),
        Box::new(UntypedGltf),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest valid GLB: header only, declared length 12
    pub fn minimal_glb() -> Vec<u8> {
        let mut bytes = GLB_MAGIC.to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes
    }

    fn resolved<'a>(name: &'a str, payload: Option<&'a [u8]>) -> ResolvedSource<'a> {
        ResolvedSource {
            asset_path: "memory://staged/model",
            name,
            mime: None,
            payload,
        }
    }

    #[test]
    fn test_glb_header_validation() {
        assert_eq!(
            parse_glb_header(&minimal_glb()),
            Ok(GlbHeader {
                version: 2,
                length: 12
            })
        );
        assert!(parse_glb_header(b"glTF").is_err());
        assert!(parse_glb_header(b"PK\x03\x04\x00\x00\x00\x00\x00\x00\x00\x00").is_err());

        let mut v1 = minimal_glb();
        v1[4] = 1;
        assert!(parse_glb_header(&v1).unwrap_err().contains("version 1"));

        let mut too_long = minimal_glb();
        too_long[8] = 200;
        assert!(parse_glb_header(&too_long).is_err());
    }

    #[test]
    fn test_binary_strategy_accepts_valid_payload() {
        let glb = minimal_glb();
        let req = BinaryGltfScene
            .try_construct(&resolved("boat.glb", Some(&glb)))
            .unwrap();
        assert_eq!(req.scene, SceneSelector::FirstScene);
        assert_eq!(req.asset_path, "memory://staged/model");
    }

    #[test]
    fn test_document_strategy_checks_asset_version() {
        let good = br#"{"asset":{"version":"2.0"},"scenes":[]}"#;
        let bad = br#"{"scenes":[]}"#;
        assert!(GltfDocumentScene
            .try_construct(&resolved("a.gltf", Some(good)))
            .is_ok());
        assert!(GltfDocumentScene
            .try_construct(&resolved("a.gltf", Some(bad)))
            .is_err());
    }

    #[test]
    fn test_url_sources_follow_extension() {
        let glb = resolved("tower.GLB", None);
        let gltf = resolved("tower.gltf", None);
        assert!(BinaryGltfScene.try_construct(&glb).is_ok());
        assert!(BinaryGltfScene.try_construct(&gltf).is_err());
        assert!(GltfDocumentScene.try_construct(&gltf).is_ok());
        assert!(UntypedGltf.try_construct(&resolved("tower", None)).is_ok());
    }

    #[test]
    fn test_untyped_refuses_payloads() {
        let junk = [0u8; 32];
        assert!(UntypedGltf
            .try_construct(&resolved("junk.glb", Some(&junk)))
            .is_err());
    }

    #[test]
    fn test_source_name_from_url() {
        assert_eq!(
            ModelSource::Url("https://cdn.example.com/models/ship.glb?v=2".to_string()).name(),
            "ship.glb"
        );
        assert_eq!(ModelSource::file("local.glb", Vec::new()).name(), "local.glb");
    }
}

//! In-memory asset source for selected model files
//!
//! Payloads are written into a `memory://` asset source so the regular
//! glTF loader can read them, then removed once the loader no longer needs
//! them.

use std::path::Path;

use bevy::asset::io::memory::{Dir, MemoryAssetReader};
use bevy::asset::io::{AssetSource, AssetSourceBuilder};
use bevy::prelude::*;

use deepblue_core::{BlobError, BlobStore, BlobUrl};

#[derive(Resource, Clone, Default)]
pub struct MemoryBlobStore {
    root: Dir,
}

impl MemoryBlobStore {
    /// Builder for the `memory://` source, sharing this store's directory
    pub fn asset_source(&self) -> AssetSourceBuilder {
        let root = self.root.clone();
        AssetSource::build().with_reader(move || {
            Box::new(MemoryAssetReader { root: root.clone() })
        })
    }

    pub fn contains(&self, url: &BlobUrl) -> bool {
        self.root
            .get_asset(Path::new(&url.relative_path()))
            .is_some()
    }
}

impl BlobStore for MemoryBlobStore {
    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<BlobUrl, BlobError> {
        if bytes.is_empty() {
            return Err(BlobError::Empty(name.to_string()));
        }
        let url = BlobUrl::new(name);
        self.root
            .insert_asset(Path::new(&url.relative_path()), bytes.to_vec());
        tracing::debug!(%url, size = bytes.len(), "Blob staged");
        Ok(url)
    }

    fn release(&mut self, url: &BlobUrl) {
        if self
            .root
            .remove_asset(Path::new(&url.relative_path()))
            .is_some()
        {
            tracing::debug!(%url, "Blob released");
        }
    }
}

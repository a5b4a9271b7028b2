//! File selection filter for the model picker

/// Extensions and MIME types accepted by a file input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub extensions: &'static [&'static str],
    pub mime_types: &'static [&'static str],
}

impl FileFilter {
    /// Binary and JSON glTF models
    pub const fn gltf_models() -> Self {
        Self {
            extensions: &["glb", "gltf"],
            mime_types: &["model/gltf-binary"],
        }
    }

    /// Value for the `accept` attribute of an `<input type=file>`
    pub fn to_accept_string(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .chain(self.mime_types.iter().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether a selected file passes the filter
    ///
    /// Browsers report an empty MIME type for unknown files, so the
    /// extension alone is enough.
    pub fn accepts(&self, name: &str, mime: Option<&str>) -> bool {
        let ext_ok = name
            .rsplit_once('.')
            .map(|(_, ext)| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);
        let mime_ok = mime.is_some_and(|m| self.mime_types.contains(&m));
        ext_ok || mime_ok
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::gltf_models()
    }
}

//! Where definition files and their textures live.

use std::fs;
use std::path::{Path, PathBuf};

/// Prefix marking a path inside the application's own resources.
pub const RESOURCE_PREFIX: char = '*';

/// Name of the built-in placeholder texture within the resources directory.
pub const FALLBACK_TEXTURE: &str = "fallback.png";

const CUSTOM_OBJECTS: &str = "custom objects";
const CUSTOM_OBJECT_TEXTURES: &str = "custom object textures";

/// Filesystem locations used while loading definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    /// Directory holding the application's bundled resources.
    pub resources: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            resources: PathBuf::from("Resources"),
        }
    }
}

impl AssetPaths {
    #[must_use]
    pub fn new(resources: impl Into<PathBuf>) -> Self {
        Self {
            resources: resources.into(),
        }
    }

    /// The file a definition path refers to, and whether it is a bundled
    /// resource rather than a user asset.
    #[must_use]
    pub fn locate(&self, path: &Path) -> (PathBuf, bool) {
        match path.to_str().and_then(|s| s.strip_prefix(RESOURCE_PREFIX)) {
            Some(name) => (self.resources.join(name), true),
            None => (path.to_path_buf(), false),
        }
    }

    #[must_use]
    pub fn fallback_texture(&self) -> PathBuf {
        self.resources.join(FALLBACK_TEXTURE)
    }
}

/// Directory searched for the textures of the definition at `file`.
///
/// Normally the file's own directory. Files somewhere under a
/// `custom objects` directory use a sibling `custom object textures`
/// directory instead, when one exists. Both names match case-insensitively.
#[must_use]
pub fn texture_dir(file: &Path) -> PathBuf {
    let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut base = PathBuf::new();
    for component in dir.components() {
        if component
            .as_os_str()
            .to_string_lossy()
            .eq_ignore_ascii_case(CUSTOM_OBJECTS)
        {
            if let Some(textures) = find_case_insensitive(&base, CUSTOM_OBJECT_TEXTURES) {
                return textures;
            }
            break;
        }
        base.push(component);
    }
    dir
}

fn find_case_insensitive(dir: &Path, name: &str) -> Option<PathBuf> {
    let listing = if dir.as_os_str().is_empty() {
        fs::read_dir(".")
    } else {
        fs::read_dir(dir)
    };
    listing
        .ok()?
        .filter_map(Result::ok)
        .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| dir.join(entry.file_name()))
}

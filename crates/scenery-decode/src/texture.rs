//! Texture name resolution and the texture cache.
//!
//! Definition files name textures by stem, and the extension they declare is
//! often not the one shipped. [`resolve`] probes a fixed list of candidate
//! extensions next to the definition; [`bind`] then hands the result to a
//! [`TextureCache`], turning load failures into a deferred [`TextureError`].

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::error::TextureError;

/// Extensions probed, in order, after the declared one.
pub const CANDIDATE_EXTENSIONS: [&str; 6] = [".dds", ".DDS", ".png", ".PNG", ".bmp", ".BMP"];

/// Opaque texture reference. Zero means untextured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// How a texture repeats across its geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    /// Tiled in both directions.
    #[default]
    Repeat,
    /// Not tiled, e.g. orthophotos.
    Clamp,
    /// Tiled along the length of a line only.
    Vertical,
}

/// Sampling options requested alongside a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureOptions {
    pub wrap: TextureWrap,
    pub alpha: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            wrap: TextureWrap::Repeat,
            alpha: true,
        }
    }
}

/// Maps resolved texture paths to handles.
pub trait TextureCache {
    /// Load (or reuse) the texture at `path`.
    fn get(&mut self, path: &Path, options: TextureOptions) -> Result<TextureHandle, TextureError>;
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTexture {
    /// Deliberately untextured (`none`, or nothing declared).
    None,
    /// A candidate file that exists, relative to the texture directory.
    Found(PathBuf),
    /// No candidate exists; the bare stem is bound and will fail on load.
    Deferred(PathBuf),
}

/// Split a declared texture into normalized stem and extension.
///
/// Trailing `#` and `//` comments are removed and both `:` and `/` are taken
/// as path separators.
#[must_use]
pub fn split_declared(declared: &str) -> (String, String) {
    let declared = declared
        .split('#')
        .next()
        .and_then(|s| s.split("//").next())
        .unwrap_or_default()
        .trim();
    let normalized: String = declared
        .chars()
        .map(|c| if c == ':' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect();
    let name_start = normalized.rfind(MAIN_SEPARATOR).map_or(0, |i| i + 1);
    match normalized[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = name_start + dot;
            (normalized[..split].to_owned(), normalized[split..].to_owned())
        }
        _ => (normalized, String::new()),
    }
}

/// Find the file a declared texture refers to within `dir`.
#[must_use]
pub fn resolve(dir: &Path, declared: &str) -> ResolvedTexture {
    let (stem, extension) = split_declared(declared);
    if stem.is_empty() {
        return ResolvedTexture::None;
    }
    let found = std::iter::once(extension.as_str())
        .chain(CANDIDATE_EXTENSIONS)
        .map(|ext| format!("{stem}{ext}"))
        .find(|candidate| dir.join(candidate).exists());
    match found {
        Some(name) => ResolvedTexture::Found(PathBuf::from(name)),
        None if stem.eq_ignore_ascii_case("none") => ResolvedTexture::None,
        None => ResolvedTexture::Deferred(PathBuf::from(stem)),
    }
}

/// A texture as bound to a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureBinding {
    pub handle: TextureHandle,
    /// Load failure, kept for later reporting.
    pub error: Option<TextureError>,
}

impl TextureBinding {
    /// Bind the texture at `path` (relative names are reported as given).
    pub fn load(
        textures: &mut dyn TextureCache,
        dir: &Path,
        name: &Path,
        options: TextureOptions,
    ) -> Self {
        match textures.get(&dir.join(name), options) {
            Ok(handle) => Self {
                handle,
                error: None,
            },
            Err(err) => {
                tracing::warn!("{err}");
                Self {
                    handle: TextureHandle::NONE,
                    error: Some(TextureError {
                        filename: name.display().to_string(),
                        reason: err.reason,
                    }),
                }
            }
        }
    }
}

/// Resolve `declared` within `dir` and bind it through `textures`.
pub fn bind(
    textures: &mut dyn TextureCache,
    dir: &Path,
    declared: &str,
    options: TextureOptions,
) -> TextureBinding {
    match resolve(dir, declared) {
        ResolvedTexture::None => TextureBinding::default(),
        ResolvedTexture::Found(name) | ResolvedTexture::Deferred(name) => {
            TextureBinding::load(textures, dir, &name, options)
        }
    }
}

/// A decoded texture held by [`MemoryTextureCache`].
#[derive(Debug)]
pub struct Texture {
    pub path: PathBuf,
    pub options: TextureOptions,
    pub image: image::RgbaImage,
}

/// In-memory [`TextureCache`] that decodes with the `image` crate.
///
/// Handles are 1-based indices into the loaded textures; each path is
/// decoded at most once per set of options.
#[derive(Debug, Default)]
pub struct MemoryTextureCache {
    by_path: HashMap<(PathBuf, TextureOptions), TextureHandle>,
    textures: Vec<Texture>,
}

impl MemoryTextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        let index = usize::try_from(handle.0).ok()?.checked_sub(1)?;
        self.textures.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureCache for MemoryTextureCache {
    fn get(&mut self, path: &Path, options: TextureOptions) -> Result<TextureHandle, TextureError> {
        let key = (path.to_path_buf(), options);
        if let Some(&handle) = self.by_path.get(&key) {
            return Ok(handle);
        }
        let error = |reason: String| TextureError {
            filename: path.display().to_string(),
            reason,
        };
        let mut image = image::open(path).map_err(|e| error(e.to_string()))?.to_rgba8();
        if !options.alpha {
            for pixel in image.pixels_mut() {
                pixel.0[3] = u8::MAX;
            }
        }
        let handle = u32::try_from(self.textures.len() + 1)
            .map(TextureHandle)
            .map_err(|_| error("texture cache is full".to_owned()))?;
        self.textures.push(Texture {
            path: path.to_path_buf(),
            options,
            image,
        });
        self.by_path.insert(key, handle);
        tracing::debug!("loaded texture {} as {}", path.display(), handle.0);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sep(s: &str) -> String {
        s.replace('/', &MAIN_SEPARATOR.to_string())
    }

    #[test]
    fn split_normalizes_separators_and_comments() {
        assert_eq!(
            split_declared("textures:road.png // asphalt"),
            (sep("textures/road"), ".png".to_owned())
        );
        assert_eq!(split_declared("rwy"), ("rwy".to_owned(), String::new()));
        assert_eq!(
            split_declared("dir.v2/tex # note"),
            (sep("dir.v2/tex"), String::new())
        );
    }

    #[test]
    fn probes_candidates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rwy.dds"), b"").unwrap();
        fs::write(dir.path().join("rwy.bmp"), b"").unwrap();
        assert_eq!(
            resolve(dir.path(), "rwy.png"),
            ResolvedTexture::Found(PathBuf::from("rwy.dds"))
        );
    }

    #[test]
    fn declared_extension_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rwy.dds"), b"").unwrap();
        fs::write(dir.path().join("rwy.png"), b"").unwrap();
        assert_eq!(
            resolve(dir.path(), "rwy.png"),
            ResolvedTexture::Found(PathBuf::from("rwy.png"))
        );
    }

    #[test]
    fn unresolved_names() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve(dir.path(), "NONE"), ResolvedTexture::None);
        assert_eq!(resolve(dir.path(), ""), ResolvedTexture::None);
        assert_eq!(
            resolve(dir.path(), "missing.png"),
            ResolvedTexture::Deferred(PathBuf::from("missing"))
        );
    }

    #[test]
    fn cache_loads_once_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");
        image::RgbaImage::new(2, 2).save(&path).unwrap();

        let mut cache = MemoryTextureCache::new();
        let first = cache.get(&path, TextureOptions::default()).unwrap();
        let second = cache.get(&path, TextureOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, TextureHandle(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.texture(first).unwrap().image.dimensions(), (2, 2));
        assert!(cache.texture(TextureHandle::NONE).is_none());

        let binding = bind(&mut cache, dir.path(), "absent.png", TextureOptions::default());
        assert!(binding.handle.is_none());
        assert_eq!(binding.error.unwrap().filename, "absent");
    }

    #[test]
    fn opaque_textures_drop_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clear.png");
        image::RgbaImage::new(1, 1).save(&path).unwrap();

        let mut cache = MemoryTextureCache::new();
        let options = TextureOptions {
            wrap: TextureWrap::Clamp,
            alpha: false,
        };
        let handle = cache.get(&path, options).unwrap();
        assert_eq!(cache.texture(handle).unwrap().image.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn options_are_part_of_the_cache_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        image::RgbaImage::new(1, 1).save(&path).unwrap();

        let mut cache = MemoryTextureCache::new();
        let clamped = TextureOptions {
            wrap: TextureWrap::Clamp,
            alpha: false,
        };
        let photo = cache.get(&path, clamped).unwrap();
        let tiled = cache.get(&path, TextureOptions::default()).unwrap();
        assert_ne!(photo, tiled);
        assert_eq!(cache.len(), 2);

        let texture = cache.texture(tiled).unwrap();
        assert_eq!(texture.options, TextureOptions::default());
        assert_eq!(texture.image.get_pixel(0, 0).0[3], 0);
        assert_eq!(cache.get(&path, clamped).unwrap(), photo);
    }
}

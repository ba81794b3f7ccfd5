//! Draped polygons (`.pol`) plus the pieces every polygon kind shares: the
//! three-line header, the common records, and the inert exclusion/unknown
//! definitions.

use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::definition::LoadContext;
use crate::error::DecodeResult;
use crate::layer::Layer;
use crate::lines::{Lines, Record, read_latin1, strip_comment};
use crate::paths::texture_dir;
use crate::texture::{TextureBinding, TextureOptions, TextureWrap, bind};

/// A polygon definition file read into memory.
pub(crate) struct PolygonFile {
    pub(crate) source: Option<PathBuf>,
    pub(crate) texture_dir: PathBuf,
    pub(crate) text: String,
}

impl PolygonFile {
    pub(crate) fn read(path: &Path, ctx: &LoadContext<'_>) -> DecodeResult<Self> {
        let (file, is_resource) = ctx.paths.locate(path);
        Ok(Self {
            source: (!is_resource).then(|| path.to_path_buf()),
            texture_dir: texture_dir(&file),
            text: read_latin1(&file)?,
        })
    }

    /// Check the `I`/`A`, version and format-name lines, returning a cursor
    /// positioned at the first record.
    pub(crate) fn records(&self, version: &str, format: &str) -> DecodeResult<Lines<'_>> {
        let mut lines = Lines::new(&self.text);
        lines.expect_marker()?;
        if strip_comment(lines.continuation()?).trim() != version {
            return Err(lines.error(format!("expected {format} version {version}")));
        }
        if lines.continuation()?.trim() != format {
            return Err(lines.error(format!("expected {format}")));
        }
        Ok(lines)
    }

    pub(crate) fn bind(
        &self,
        ctx: &mut LoadContext<'_>,
        declared: Option<&str>,
        options: TextureOptions,
    ) -> TextureBinding {
        match declared {
            Some(declared) => bind(ctx.textures, &self.texture_dir, declared, options),
            None => TextureBinding::default(),
        }
    }
}

/// Records understood by every polygon kind.
#[derive(Debug, Default)]
pub(crate) struct CommonRecords {
    /// Last declared texture.
    pub(crate) texture: Option<String>,
    /// Whether any texture was declared with `TEXTURE_NOWRAP`.
    pub(crate) no_wrap: bool,
    pub(crate) scale: Option<Vec2>,
    pub(crate) layer: Option<Layer>,
}

impl CommonRecords {
    /// Consume `record` if it is a common one.
    pub(crate) fn accept(&mut self, record: &Record<'_>) -> DecodeResult<bool> {
        match record.keyword() {
            keyword @ ("TEXTURE" | "TEXTURE_NOWRAP") => {
                if record.len() > 1 {
                    self.no_wrap |= keyword == "TEXTURE_NOWRAP";
                    self.texture = Some(record.rest().to_owned());
                }
            }
            "SCALE" => self.scale = Some(Vec2::new(record.f32(1)?, record.f32(2)?)),
            "LAYER_GROUP" => self.layer = Some(Layer::new(record.token(1)?, record.parse(2)?)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// A texture draped over terrain.
#[derive(Debug, Clone)]
pub struct DrapedPolygon {
    pub source: Option<PathBuf>,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    /// Untiled texture, e.g. an aerial photo.
    pub orthophoto: bool,
    /// Metres covered by one repeat of the texture.
    pub scale: Vec2,
    pub alpha: bool,
}

impl DrapedPolygon {
    pub fn load(path: &Path, ctx: &mut LoadContext<'_>) -> DecodeResult<Self> {
        let file = PolygonFile::read(path, ctx)?;
        let mut lines = file.records("850", "DRAPED_POLYGON")?;
        let mut common = CommonRecords::default();
        let mut alpha = true;
        while let Some(record) = lines.record(true) {
            if !common.accept(&record)? && record.keyword() == "NO_ALPHA" {
                alpha = false;
            }
        }

        let orthophoto = common.no_wrap;
        let options = TextureOptions {
            wrap: if orthophoto {
                TextureWrap::Clamp
            } else {
                TextureWrap::Repeat
            },
            alpha,
        };
        let texture = file.bind(ctx, common.texture.as_deref(), options);
        // A zero scale would divide by zero downstream.
        let scale = common
            .scale
            .map_or(Vec2::splat(100.0), |s| Vec2::select(s.cmpeq(Vec2::ZERO), Vec2::ONE, s));
        Ok(Self {
            source: file.source,
            texture,
            layer: common.layer.unwrap_or(Layer::DEFAULT),
            previewable: true,
            orthophoto,
            scale,
            alpha,
        })
    }
}

/// Marker prefix of exclusion zone names.
pub const EXCLUSION_PREFIX: &str = "Exclude:";

/// A region in which default scenery of some type is suppressed.
///
/// Named rather than backed by a file; carries no texture or geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionZone {
    pub name: String,
}

impl ExclusionZone {
    pub const LAYER: Layer = Layer::OUTLINE;

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A polygon of a type this crate does not decode. Keeps the path and a
/// default layer so it can still be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolygon {
    pub source: Option<PathBuf>,
    pub layer: Layer,
}

impl UnknownPolygon {
    #[must_use]
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            source,
            layer: Layer::DEFAULT,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::arena::VertexArena;
    use crate::paths::AssetPaths;
    use crate::texture::MemoryTextureCache;
    use std::fs;

    /// Temporary asset directory with helpers for loading from it.
    pub(crate) struct Fixture {
        pub(crate) dir: tempfile::TempDir,
        pub(crate) arena: VertexArena,
        pub(crate) textures: MemoryTextureCache,
        pub(crate) paths: AssetPaths,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let paths = AssetPaths::new(dir.path().join("Resources"));
            fs::create_dir_all(&paths.resources).unwrap();
            image::RgbaImage::new(1, 1)
                .save(paths.fallback_texture())
                .unwrap();
            Self {
                dir,
                arena: VertexArena::new(),
                textures: MemoryTextureCache::new(),
                paths,
            }
        }

        pub(crate) fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, contents).unwrap();
            path
        }

        pub(crate) fn texture(&self, name: &str) {
            image::RgbaImage::new(1, 1)
                .save(self.dir.path().join(name))
                .unwrap();
        }

        pub(crate) fn ctx(&mut self) -> LoadContext<'_> {
            LoadContext {
                arena: &mut self.arena,
                textures: &mut self.textures,
                paths: &self.paths,
            }
        }
    }

    #[test]
    fn draped_with_texture_and_layer() {
        let mut fx = Fixture::new();
        fx.texture("asphalt.png");
        let path = fx.write(
            "road.pol",
            "A\n850 # version\nDRAPED_POLYGON\n\n\
             TEXTURE asphalt.dds\nSCALE 25 0 # metres\nLAYER_GROUP runways 1\nNO_ALPHA\n",
        );
        let draped = DrapedPolygon::load(&path, &mut fx.ctx()).unwrap();
        assert!(!draped.texture.handle.is_none());
        assert_eq!(draped.texture.error, None);
        assert_eq!(draped.scale, Vec2::new(25.0, 1.0));
        assert_eq!(draped.layer.to_string(), "runways +1");
        assert!(!draped.alpha);
        assert!(!draped.orthophoto);
        assert_eq!(draped.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn draped_nowrap_is_orthophoto() {
        let mut fx = Fixture::new();
        let path = fx.write("photo.pol", "I\n850\nDRAPED_POLYGON\nTEXTURE_NOWRAP photo.png\n");
        let draped = DrapedPolygon::load(&path, &mut fx.ctx()).unwrap();
        assert!(draped.orthophoto);
        assert_eq!(draped.scale, Vec2::splat(100.0));
        // Missing texture is deferred, not fatal.
        assert!(draped.texture.handle.is_none());
        assert_eq!(draped.texture.error.unwrap().filename, "photo");
    }

    #[test]
    fn draped_header_is_checked() {
        let mut fx = Fixture::new();
        let path = fx.write("bad.pol", "I\n800\nDRAPED_POLYGON\n");
        assert!(DrapedPolygon::load(&path, &mut fx.ctx()).is_err());
        let path = fx.write("bad2.pol", "I\n850\nFACADE\n");
        assert!(DrapedPolygon::load(&path, &mut fx.ctx()).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut fx = Fixture::new();
        let path = fx.dir.path().join("absent.pol");
        assert!(matches!(
            DrapedPolygon::load(&path, &mut fx.ctx()),
            Err(crate::DecodeError::Io { .. })
        ));
    }
}

//! The definition sum type, its shared capabilities, and the factory that
//! picks a variant from a path.

use std::path::Path;
use std::time::Instant;

use glam::Vec3;

use crate::arena::VertexArena;
use crate::bbox::BoundingBox;
use crate::cache::DefinitionCache;
use crate::error::{DecodeResult, TextureError};
use crate::facade::Facade;
use crate::forest::{Forest, TexRect};
use crate::layer::Layer;
use crate::line::LineMarking;
use crate::network::RoadNetwork;
use crate::object::ObjectMesh;
use crate::paths::AssetPaths;
use crate::polygon::{DrapedPolygon, EXCLUSION_PREFIX, ExclusionZone, UnknownPolygon};
use crate::texture::{TextureBinding, TextureCache, TextureHandle};

/// Everything a definition needs from its surroundings while loading.
pub struct LoadContext<'a> {
    pub arena: &'a mut VertexArena,
    pub textures: &'a mut dyn TextureCache,
    pub paths: &'a AssetPaths,
}

/// What the renderer needs to draw one allocated definition.
///
/// `culled` vertices starting at `base` are drawn with back-face culling,
/// then `no_cull` vertices directly after them without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub base: usize,
    pub culled: usize,
    pub no_cull: usize,
    pub texture: TextureHandle,
    pub layer: Layer,
}

/// Kind of definition, for lock and filter masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Object,
    Unknown,
    Draped,
    Orthophoto,
    Facade,
    Forest,
    Line,
    Network,
    Exclusion,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Object,
        Self::Unknown,
        Self::Draped,
        Self::Orthophoto,
        Self::Facade,
        Self::Forest,
        Self::Line,
        Self::Network,
        Self::Exclusion,
    ];

    /// This category's bit in a mask.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// What a preview of a definition would show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preview {
    /// An orthographic view of a mesh, centred on its bounding box.
    Mesh { half_extent: f32, offset: Vec3 },
    /// A rectangle of the definition's texture.
    Texture {
        texture: TextureHandle,
        rect: TexRect,
        /// Horizontal stretch of the rectangle.
        aspect: f32,
    },
    /// A few lengths of a network, raised to its deck height.
    Network { half_extent: f32, height: f32 },
}

/// Capabilities shared by every kind of definition.
pub trait GeometryDefinition {
    fn category(&self) -> Category;

    /// Source file, or `None` for bundled resources and exclusions.
    fn source(&self) -> Option<&Path>;

    fn layer(&self) -> Layer;

    fn texture_binding(&self) -> Option<&TextureBinding>;

    fn texture(&self) -> TextureHandle {
        self.texture_binding()
            .map_or(TextureHandle::NONE, |binding| binding.handle)
    }

    fn texture_error(&self) -> Option<&TextureError> {
        self.texture_binding()?.error.as_ref()
    }

    fn is_previewable(&self) -> bool;

    /// Horizontal extent, for definitions with geometry of their own.
    fn bbox(&self) -> Option<BoundingBox> {
        None
    }

    /// Make sure any geometry is in the current arena.
    fn allocate(&mut self, _ctx: &mut LoadContext<'_>, _defs: &mut DefinitionCache) {}

    /// Forget arena allocations, keeping everything parsed.
    fn flush(&mut self) {}

    fn draw_call(&self, _arena: &VertexArena) -> Option<DrawCall> {
        None
    }

    fn preview(&self) -> Option<Preview>;
}

impl GeometryDefinition for ObjectMesh {
    fn category(&self) -> Category {
        Category::Object
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn bbox(&self) -> Option<BoundingBox> {
        Some(self.bbox)
    }

    fn allocate(&mut self, ctx: &mut LoadContext<'_>, _defs: &mut DefinitionCache) {
        ObjectMesh::allocate(self, ctx.arena);
    }

    fn flush(&mut self) {
        ObjectMesh::flush(self);
    }

    fn draw_call(&self, arena: &VertexArena) -> Option<DrawCall> {
        ObjectMesh::draw_call(self, arena)
    }

    fn preview(&self) -> Option<Preview> {
        if !self.previewable || self.bbox.is_empty() {
            return None;
        }
        let size_x = (self.bbox.max_x - self.bbox.min_x) * 0.5;
        let size_z = (self.bbox.max_z - self.bbox.min_z) * 0.5;
        // Height, then width and depth as seen from 30 degrees up.
        let half_extent = (self.height * 0.7)
            .max(size_z * 0.88 + size_x * 0.51)
            .max(size_z * 0.255 + size_x * 0.44);
        Some(Preview::Mesh {
            half_extent,
            offset: Vec3::new(size_x - self.bbox.max_x, 0.0, size_z - self.bbox.max_z),
        })
    }
}

/// Texture preview of a polygon kind, when it has a texture to show.
fn texture_preview(
    previewable: bool,
    texture: &TextureBinding,
    rect: TexRect,
    aspect: f32,
) -> Option<Preview> {
    (previewable && !texture.handle.is_none()).then_some(Preview::Texture {
        texture: texture.handle,
        rect,
        aspect,
    })
}

const UNIT_RECT: TexRect = (0.0, 0.0, 1.0, 1.0);

impl GeometryDefinition for DrapedPolygon {
    fn category(&self) -> Category {
        if self.orthophoto {
            Category::Orthophoto
        } else {
            Category::Draped
        }
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn preview(&self) -> Option<Preview> {
        texture_preview(self.previewable, &self.texture, UNIT_RECT, 1.0)
    }
}

impl GeometryDefinition for Facade {
    fn category(&self) -> Category {
        Category::Facade
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn preview(&self) -> Option<Preview> {
        let (&(left, _), &(_, right)) = (self.horizontal.first()?, self.horizontal.last()?);
        let (&(bottom, _), &(_, top)) = (self.vertical.first()?, self.vertical.last()?);
        texture_preview(
            self.previewable,
            &self.texture,
            (left, bottom, right, top),
            1.0,
        )
    }
}

impl GeometryDefinition for Forest {
    fn category(&self) -> Category {
        Category::Forest
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn preview(&self) -> Option<Preview> {
        texture_preview(self.previewable, &self.texture, self.tree?, 1.0)
    }
}

impl GeometryDefinition for LineMarking {
    fn category(&self) -> Category {
        Category::Line
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn preview(&self) -> Option<Preview> {
        let [left, _, right] = self.offsets;
        texture_preview(
            self.previewable,
            &self.texture,
            (left, 0.0, right, 1.0),
            self.scale.y / self.scale.x,
        )
    }
}

impl GeometryDefinition for ExclusionZone {
    fn category(&self) -> Category {
        Category::Exclusion
    }

    fn source(&self) -> Option<&Path> {
        None
    }

    fn layer(&self) -> Layer {
        Self::LAYER
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        None
    }

    fn is_previewable(&self) -> bool {
        false
    }

    fn preview(&self) -> Option<Preview> {
        None
    }
}

impl GeometryDefinition for UnknownPolygon {
    fn category(&self) -> Category {
        Category::Unknown
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        None
    }

    fn is_previewable(&self) -> bool {
        false
    }

    fn preview(&self) -> Option<Preview> {
        None
    }
}

impl GeometryDefinition for RoadNetwork {
    fn category(&self) -> Category {
        Category::Network
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn layer(&self) -> Layer {
        self.layer
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        Some(&self.texture)
    }

    fn is_previewable(&self) -> bool {
        self.previewable
    }

    fn allocate(&mut self, ctx: &mut LoadContext<'_>, defs: &mut DefinitionCache) {
        RoadNetwork::allocate(self, ctx, defs);
    }

    fn flush(&mut self) {
        RoadNetwork::flush(self);
    }

    fn preview(&self) -> Option<Preview> {
        self.previewable.then(|| Preview::Network {
            half_extent: self.preview_extent(),
            height: self.height.unwrap_or(0.0),
        })
    }
}

/// Any decoded definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Object(ObjectMesh),
    Draped(DrapedPolygon),
    Facade(Facade),
    Forest(Forest),
    Line(LineMarking),
    Exclusion(ExclusionZone),
    Network(RoadNetwork),
    Unknown(UnknownPolygon),
}

impl Definition {
    #[must_use]
    pub fn as_dyn(&self) -> &dyn GeometryDefinition {
        match self {
            Self::Object(d) => d,
            Self::Draped(d) => d,
            Self::Facade(d) => d,
            Self::Forest(d) => d,
            Self::Line(d) => d,
            Self::Exclusion(d) => d,
            Self::Network(d) => d,
            Self::Unknown(d) => d,
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn GeometryDefinition {
        match self {
            Self::Object(d) => d,
            Self::Draped(d) => d,
            Self::Facade(d) => d,
            Self::Forest(d) => d,
            Self::Line(d) => d,
            Self::Exclusion(d) => d,
            Self::Network(d) => d,
            Self::Unknown(d) => d,
        }
    }

    /// Remove the recorded texture failure, for batched reporting.
    pub fn take_texture_error(&mut self) -> Option<TextureError> {
        let binding = match self {
            Self::Object(d) => &mut d.texture,
            Self::Draped(d) => &mut d.texture,
            Self::Facade(d) => &mut d.texture,
            Self::Forest(d) => &mut d.texture,
            Self::Line(d) => &mut d.texture,
            Self::Network(d) => &mut d.texture,
            Self::Exclusion(_) | Self::Unknown(_) => return None,
        };
        binding.error.take()
    }
}

impl GeometryDefinition for Definition {
    fn category(&self) -> Category {
        self.as_dyn().category()
    }

    fn source(&self) -> Option<&Path> {
        self.as_dyn().source()
    }

    fn layer(&self) -> Layer {
        self.as_dyn().layer()
    }

    fn texture_binding(&self) -> Option<&TextureBinding> {
        self.as_dyn().texture_binding()
    }

    fn is_previewable(&self) -> bool {
        self.as_dyn().is_previewable()
    }

    fn bbox(&self) -> Option<BoundingBox> {
        self.as_dyn().bbox()
    }

    fn allocate(&mut self, ctx: &mut LoadContext<'_>, defs: &mut DefinitionCache) {
        self.as_dyn_mut().allocate(ctx, defs);
    }

    fn flush(&mut self) {
        self.as_dyn_mut().flush();
    }

    fn draw_call(&self, arena: &VertexArena) -> Option<DrawCall> {
        self.as_dyn().draw_call(arena)
    }

    fn preview(&self) -> Option<Preview> {
        self.as_dyn().preview()
    }
}

/// Extensions offered when browsing a library.
pub const KNOWN_EXTENSIONS: [&str; 7] = [".obj", ".fac", ".for", ".pol", ".lin", ".str", ".agp"];

/// Recognized extensions without a dedicated parser by default.
pub const UNKNOWN_EXTENSIONS: [&str; 3] = [".lin", ".str", ".agp"];

/// Extensions ignored entirely when scanning a library.
pub const SKIP_EXTENSIONS: [&str; 2] = [".bch", ".net"];

/// Factory switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Decode `.lin` files instead of treating them as unknown polygons.
    pub line_markings: bool,
}

/// Result of [`create`] for a path that did not fail to decode.
#[derive(Debug, Clone)]
pub enum Outcome {
    Loaded(Definition),
    /// An extension that is deliberately not loaded; skip it quietly.
    Unsupported(String),
}

/// The last four characters of `path`, lowercased, e.g. `".obj"`.
#[must_use]
pub fn extension(path: &Path) -> String {
    let name = path.to_string_lossy().to_lowercase();
    match name.char_indices().rev().nth(3) {
        Some((start, _)) => name[start..].to_owned(),
        None => name,
    }
}

/// Decode the definition at `path`, choosing the variant from its name.
///
/// Names starting with [`EXCLUSION_PREFIX`] are exclusions and never touch
/// the filesystem. Anything with an unrecognized extension becomes an
/// [`UnknownPolygon`].
pub fn create(
    path: &Path,
    ctx: &mut LoadContext<'_>,
    options: FactoryOptions,
) -> DecodeResult<Outcome> {
    let name = path.to_string_lossy();
    if name.starts_with(EXCLUSION_PREFIX) {
        return Ok(Outcome::Loaded(Definition::Exclusion(ExclusionZone::new(
            name,
        ))));
    }

    let started = Instant::now();
    let definition = match extension(path).as_str() {
        ".obj" | ".agp" => Definition::Object(ObjectMesh::load(path, ctx)?),
        ".pol" => Definition::Draped(DrapedPolygon::load(path, ctx)?),
        ".fac" => Definition::Facade(Facade::load(path, ctx)?),
        ".for" => Definition::Forest(Forest::load(path, ctx)?),
        ".lin" if options.line_markings => Definition::Line(LineMarking::load(path, ctx)?),
        skipped if SKIP_EXTENSIONS.contains(&skipped) => {
            return Ok(Outcome::Unsupported(skipped.to_owned()));
        }
        _ => {
            let (_, is_resource) = ctx.paths.locate(path);
            Definition::Unknown(UnknownPolygon::new(
                (!is_resource).then(|| path.to_path_buf()),
            ))
        }
    };
    tracing::debug!(
        "{:6.3}s {} as {:?}",
        started.elapsed().as_secs_f32(),
        path.display(),
        definition.category()
    );
    Ok(Outcome::Loaded(definition))
}

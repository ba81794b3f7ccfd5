//! Road, railway and powerline networks.
//!
//! Networks are not parsed from their own files here. Their attributes come
//! from an already-decoded network table; this module realizes the pieces
//! that need the asset library: the texture, the attached object meshes, and
//! the deck height derived from them.

use std::path::{Path, PathBuf};

use crate::cache::DefinitionCache;
use crate::definition::LoadContext;
use crate::layer::Layer;
use crate::paths::{AssetPaths, texture_dir};
use crate::texture::{TextureBinding, TextureOptions};

/// Segments dipping further than this below the roadway are foundations,
/// so the roadway is a bridge deck.
pub const FOUNDATION_DEPTH: f32 = 2.0;

/// One edge of a network segment's cross-section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentEdge {
    pub lateral: f32,
    pub vertical: f32,
    /// Horizontal texture coordinate.
    pub s: f32,
}

/// A textured quad strip running the length of the network.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkSegment {
    pub from: SegmentEdge,
    pub to: SegmentEdge,
}

/// An object repeated along the network, e.g. a pylon or street light.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedObject {
    pub path: PathBuf,
    pub lateral: f32,
    /// Sits on the terrain rather than on the roadway.
    pub on_ground: bool,
    /// Repeat distance, or zero for once per preview length.
    pub frequency: f32,
    /// Distance along the network of the first instance.
    pub offset: f32,
}

#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub source: Option<PathBuf>,
    pub name: String,
    pub index: u32,
    pub width: f32,
    pub length: f32,
    /// Deck height above the terrain, when the network is raised.
    pub height: Option<f32>,
    pub texture_name: String,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    pub poly_offset: u32,
    pub color: Option<[f32; 3]>,
    pub segments: Vec<NetworkSegment>,
    pub objects: Vec<AttachedObject>,
    texture_dir: PathBuf,
}

impl RoadNetwork {
    /// An untextured, flat network type from the network table at `path`.
    #[must_use]
    pub fn new(path: &Path, paths: &AssetPaths, name: impl Into<String>, index: u32) -> Self {
        let (file, is_resource) = paths.locate(path);
        Self {
            source: (!is_resource).then(|| path.to_path_buf()),
            name: name.into(),
            index,
            width: 0.0,
            length: 0.0,
            height: None,
            texture_name: String::new(),
            texture: TextureBinding::default(),
            layer: Layer::NETWORK,
            previewable: true,
            poly_offset: 0,
            color: None,
            segments: Vec::new(),
            objects: Vec::new(),
            texture_dir: texture_dir(&file),
        }
    }

    /// Placeholder for a network type whose definition could not be used.
    #[must_use]
    pub fn placeholder(path: &Path, paths: &AssetPaths, name: impl Into<String>, index: u32) -> Self {
        Self {
            previewable: false,
            ..Self::new(path, paths, name, index)
        }
    }

    /// Bind the texture, load and allocate every attached object through
    /// `defs`, and derive the deck height if none was given.
    pub fn allocate(&mut self, ctx: &mut LoadContext<'_>, defs: &mut DefinitionCache) {
        if self.texture.handle.is_none()
            && self.texture.error.is_none()
            && !self.texture_name.is_empty()
        {
            self.texture = TextureBinding::load(
                ctx.textures,
                &self.texture_dir,
                Path::new(&self.texture_name),
                TextureOptions::default(),
            );
        }

        let mut last = None;
        for object in &self.objects {
            if let Some(mesh) = defs.object(&object.path, ctx) {
                last = Some((object.on_ground, mesh.vertical_extent()));
            }
        }

        if self.height.is_some() {
            return;
        }
        if let Some((on_ground, (lowest, highest))) = last {
            let height = if on_ground { highest } else { -lowest };
            if height != 0.0 {
                self.height = Some(round1(height));
            }
        } else if self.objects.is_empty() {
            self.height = height_from_segments(&self.segments);
        }
        if let Some(height) = self.height {
            tracing::debug!("{} {}: deck height {height}", self.name, self.index);
        }
    }

    /// Nothing to release: attached meshes are owned by the definition
    /// cache and are invalidated with the arena.
    pub fn flush(&mut self) {}

    /// Orthographic half-extent that fits four lengths of the network.
    #[must_use]
    pub fn preview_extent(&self) -> f32 {
        self.length * 2.0 + self.width / 4.0
    }
}

/// Height implied by segments reaching down past [`FOUNDATION_DEPTH`].
#[must_use]
pub fn height_from_segments(segments: &[NetworkSegment]) -> Option<f32> {
    let lowest = segments
        .iter()
        .flat_map(|segment| [segment.from.vertical, segment.to.vertical])
        .fold(0.0f32, f32::min);
    (lowest < -FOUNDATION_DEPTH).then(|| round1(-lowest))
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

//! Forests (`.for`). Only the representative tree is kept, for previews.

use std::path::{Path, PathBuf};

use crate::definition::LoadContext;
use crate::error::{DecodeError, DecodeResult};
use crate::layer::Layer;
use crate::polygon::{CommonRecords, PolygonFile};
use crate::texture::{TextureBinding, TextureOptions};

/// Trees narrower or shorter than this fraction of the atlas are taken to be
/// placeholders.
pub const MIN_TREE_SIZE: f32 = 0.02;

/// A rectangle `(left, bottom, right, top)` in normalized texture space.
pub type TexRect = (f32, f32, f32, f32);

#[derive(Debug, Clone)]
pub struct Forest {
    pub source: Option<PathBuf>,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    /// Atlas rectangle of the most frequent usable tree, if any.
    pub tree: Option<TexRect>,
}

impl Forest {
    pub fn load(path: &Path, ctx: &mut LoadContext<'_>) -> DecodeResult<Self> {
        let file = PolygonFile::read(path, ctx)?;
        let mut lines = file.records("800", "FOREST")?;
        let mut common = CommonRecords::default();
        let (mut scale_x, mut scale_y) = (1.0f32, 1.0f32);
        let mut best = 0.0f32;
        let mut tree = None;

        while let Some(record) = lines.record(true) {
            match record.keyword() {
                "SCALE_X" => scale_x = record.divisor(1)?,
                "SCALE_Y" => scale_y = record.divisor(1)?,
                // TREE s t w h offset frequency min max quad type name
                "TREE" if record.len() > 10 => {
                    let [s, t, w, h] = [
                        record.f32(1)?,
                        record.f32(2)?,
                        record.f32(3)?,
                        record.f32(4)?,
                    ];
                    let frequency = record.f32(6)?;
                    if frequency > best
                        && w / scale_x > MIN_TREE_SIZE
                        && h / scale_y > MIN_TREE_SIZE
                    {
                        best = frequency;
                        tree = Some((
                            s / scale_x,
                            t / scale_y,
                            (s + w) / scale_x,
                            (t + h) / scale_y,
                        ));
                    }
                }
                _ => {
                    common.accept(&record)?;
                }
            }
        }

        if tree.is_none() {
            return Err(DecodeError::format(lines.line(), "forest has no usable TREE"));
        }
        Ok(Self {
            texture: file.bind(ctx, common.texture.as_deref(), TextureOptions::default()),
            source: file.source,
            layer: common.layer.unwrap_or(Layer::OUTLINE),
            previewable: true,
            tree,
        })
    }

    /// Placeholder for a forest that failed to load. Never textured.
    pub(crate) fn placeholder(source: Option<PathBuf>) -> Self {
        Self {
            source,
            texture: TextureBinding::default(),
            layer: Layer::OUTLINE,
            previewable: false,
            tree: None,
        }
    }
}

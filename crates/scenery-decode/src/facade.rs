//! Facades (`.fac`): walls extruded along a polygon, optionally roofed.
//!
//! Only the first wall of the first LOD is decoded; that is enough to
//! describe the wall's texture layout.

use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::definition::LoadContext;
use crate::error::{DecodeError, DecodeResult};
use crate::layer::Layer;
use crate::lines::Lines;
use crate::polygon::{CommonRecords, PolygonFile};
use crate::texture::{TextureBinding, TextureOptions};

/// A `(start, end)` span in texture space.
pub type Span = (f32, f32);

#[derive(Debug, Clone)]
pub struct Facade {
    pub source: Option<PathBuf>,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    /// Whether the walls close into a loop.
    pub ring: bool,
    pub two_sided: bool,
    pub roof_slope: f32,
    /// Metres per texture repeat, horizontally and vertically.
    pub scale: Vec2,
    /// Roof texture corners: none, or exactly four.
    pub roof: Vec<Vec2>,
    /// Horizontal wall segments, left to right.
    pub horizontal: Vec<Span>,
    /// Vertical wall segments, bottom to top.
    pub vertical: Vec<Span>,
    /// Number of `LEFT` and `RIGHT` end caps.
    pub horizontal_ends: (usize, usize),
    /// Number of `BOTTOM` and `TOP` end caps.
    pub vertical_ends: (usize, usize),
}

impl Facade {
    fn empty(source: Option<PathBuf>) -> Self {
        Self {
            source,
            texture: TextureBinding::default(),
            layer: Layer::DEFAULT,
            previewable: true,
            ring: false,
            two_sided: false,
            roof_slope: 0.0,
            scale: Vec2::splat(100.0),
            roof: Vec::new(),
            horizontal: Vec::new(),
            vertical: Vec::new(),
            horizontal_ends: (0, 0),
            vertical_ends: (0, 0),
        }
    }

    pub fn load(path: &Path, ctx: &mut LoadContext<'_>) -> DecodeResult<Self> {
        let file = PolygonFile::read(path, ctx)?;
        let mut lines = file.records("800", "FACADE")?;
        let mut facade = Self::empty(file.source.clone());
        let mut common = CommonRecords::default();

        while let Some(record) = lines.record(true) {
            match record.keyword() {
                "RING" => facade.ring = record.parse::<i32>(1)? != 0,
                "TWO_SIDED" => facade.two_sided = record.parse::<i32>(1)? != 0,
                "LOD" => {
                    facade.first_lod(&mut lines)?;
                    break;
                }
                _ => {
                    common.accept(&record)?;
                }
            }
        }

        if facade.horizontal.is_empty() || facade.vertical.is_empty() {
            return Err(DecodeError::format(lines.line(), "facade has no wall segments"));
        }
        facade.texture = file.bind(ctx, common.texture.as_deref(), TextureOptions::default());
        if let Some(layer) = common.layer {
            facade.layer = layer;
        }
        Ok(facade)
    }

    /// Roof points, then the first wall. Stops at the next LOD.
    fn first_lod(&mut self, lines: &mut Lines<'_>) -> DecodeResult<()> {
        let mut roof = Vec::new();
        while let Some(record) = lines.record(true) {
            match record.keyword() {
                "LOD" => break,
                "ROOF" => roof.push(Vec2::new(record.f32(1)?, record.f32(2)?)),
                "WALL" => {
                    self.roof = match roof.len() {
                        0 | 4 => roof,
                        _ => vec![roof[0]; 4],
                    };
                    self.first_wall(lines)?;
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn first_wall(&mut self, lines: &mut Lines<'_>) -> DecodeResult<()> {
        while let Some(record) = lines.record(true) {
            let keyword = record.keyword();
            match keyword {
                "LOD" | "WALL" => break,
                "SCALE" => self.scale = Vec2::new(record.f32(1)?, record.f32(2)?),
                "ROOF_SLOPE" => self.roof_slope = record.f32(1)?,
                "LEFT" | "CENTER" | "RIGHT" => {
                    self.horizontal.push((record.f32(1)?, record.f32(2)?));
                    match keyword {
                        "LEFT" => self.horizontal_ends.0 += 1,
                        "RIGHT" => self.horizontal_ends.1 += 1,
                        _ => {}
                    }
                }
                "BOTTOM" | "MIDDLE" | "TOP" => {
                    self.vertical.push((record.f32(1)?, record.f32(2)?));
                    match keyword {
                        "BOTTOM" => self.vertical_ends.0 += 1,
                        "TOP" => self.vertical_ends.1 += 1,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Placeholder for a facade that failed to load: one full-width span on
    /// each axis, closed and two-sided.
    pub(crate) fn placeholder(source: Option<PathBuf>, texture: TextureBinding) -> Self {
        Self {
            texture,
            previewable: false,
            ring: true,
            two_sided: true,
            scale: Vec2::ONE,
            horizontal: vec![(0.0, 1.0)],
            vertical: vec![(0.0, 1.0)],
            ..Self::empty(source)
        }
    }
}

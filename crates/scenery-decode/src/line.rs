//! Painted line markings (`.lin`).

use std::path::{Path, PathBuf};

use glam::Vec2;

use crate::definition::LoadContext;
use crate::error::DecodeResult;
use crate::layer::Layer;
use crate::polygon::{CommonRecords, PolygonFile};
use crate::texture::{TextureBinding, TextureOptions, TextureWrap};

#[derive(Debug, Clone)]
pub struct LineMarking {
    pub source: Option<PathBuf>,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    /// Left edge, centre and right edge of the line, normalized to the
    /// texture width.
    pub offsets: [f32; 3],
    pub scale: Vec2,
}

impl LineMarking {
    pub fn load(path: &Path, ctx: &mut LoadContext<'_>) -> DecodeResult<Self> {
        let file = PolygonFile::read(path, ctx)?;
        let mut lines = file.records("850", "LINE_PAINT")?;
        let mut common = CommonRecords::default();
        let mut width = 1.0f32;
        let mut offsets = None;

        while let Some(record) = lines.record(true) {
            match record.keyword() {
                "TEX_WIDTH" => width = record.divisor(1)?,
                // S_OFFSET layer left centre right
                "S_OFFSET" => offsets = Some([record.f32(2)?, record.f32(3)?, record.f32(4)?]),
                _ => {
                    common.accept(&record)?;
                }
            }
        }

        let Some(offsets) = offsets else {
            return Err(lines.error("line has no S_OFFSET"));
        };
        let options = TextureOptions {
            wrap: TextureWrap::Vertical,
            alpha: true,
        };
        Ok(Self {
            texture: file.bind(ctx, common.texture.as_deref(), options),
            source: file.source,
            layer: common.layer.unwrap_or(Layer::MARKINGS),
            previewable: true,
            offsets: offsets.map(|offset| offset / width),
            scale: common.scale.unwrap_or(Vec2::ONE),
        })
    }

    pub(crate) fn placeholder(source: Option<PathBuf>, texture: TextureBinding) -> Self {
        Self {
            source,
            texture,
            layer: Layer::MARKINGS,
            previewable: false,
            offsets: [0.0, 0.5, 1.0],
            scale: Vec2::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;
    use crate::polygon::tests::Fixture;

    #[test]
    fn offsets_are_normalized_by_width() {
        let mut fx = Fixture::new();
        fx.texture("lines.png");
        let path = fx.write(
            "yellow.lin",
            "I\n850\nLINE_PAINT\nTEXTURE lines.png\nTEX_WIDTH 256\nSCALE 8 32\n\
             S_OFFSET 0 32 64 96\n",
        );
        let line = LineMarking::load(&path, &mut fx.ctx()).unwrap();
        assert_eq!(line.offsets, [0.125, 0.25, 0.375]);
        assert_eq!(line.scale, Vec2::new(8.0, 32.0));
        assert_eq!(line.layer, Layer::MARKINGS);
        let handle = line.texture.handle;
        assert_eq!(
            fx.textures.texture(handle).unwrap().options.wrap,
            TextureWrap::Vertical
        );
    }

    #[test]
    fn zero_width_fails() {
        let mut fx = Fixture::new();
        let path = fx.write(
            "thin.lin",
            "I\n850\nLINE_PAINT\nTEX_WIDTH 0\nS_OFFSET 0 32 64 96\n",
        );
        assert!(matches!(
            LineMarking::load(&path, &mut fx.ctx()),
            Err(DecodeError::Format { line: 4, .. })
        ));
    }

    #[test]
    fn missing_offsets_fail() {
        let mut fx = Fixture::new();
        let path = fx.write("bare.lin", "I\n850\nLINE_PAINT\nTEX_WIDTH 256\n");
        assert!(matches!(
            LineMarking::load(&path, &mut fx.ctx()),
            Err(DecodeError::Format { .. })
        ));
    }
}

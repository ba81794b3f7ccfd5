//! Object meshes (`.obj`, `.agp`).
//!
//! Three incompatible text formats share the extension, distinguished by the
//! version token on the second line:
//!
//! - `2`: typed numeric records with inline corner UVs.
//! - `700`: named primitive records (`tri`, `quad_strip`, ...) followed by
//!   one or two vertices per line.
//! - `800`: a vertex table (`VT`), an index table (`IDX`/`IDX10`) and
//!   `TRIS` ranges, optionally offset by nested `ANIM_trans` translations.
//!
//! All three are flattened into two triangle lists, one drawn with back-face
//! culling and one without. Bounding box and height are tracked as vertices
//! are read.

use std::path::{Path, PathBuf};
use std::time::Instant;

use glam::{Vec2, Vec3};

use crate::arena::{BufferHandle, VertexArena};
use crate::bbox::BoundingBox;
use crate::definition::{DrawCall, LoadContext};
use crate::error::{DecodeError, DecodeResult};
use crate::fallback;
use crate::layer::Layer;
use crate::lines::{Lines, Record, read_latin1};
use crate::paths::texture_dir;
use crate::strips::{QUAD, TRIANGLE, quad_strip, triangle_fan, triangle_strip};
use crate::texture::{ResolvedTexture, TextureBinding, TextureOptions, resolve};

/// Minimum reported height, so that flat objects still have some extent.
pub const MIN_HEIGHT: f32 = 0.5;

/// A decoded object mesh.
#[derive(Debug, Clone)]
pub struct ObjectMesh {
    /// Source file, or `None` for bundled resources.
    pub source: Option<PathBuf>,
    pub texture: TextureBinding,
    pub layer: Layer,
    pub previewable: bool,
    /// Highest `ATTR_poly_os` level seen.
    pub poly_offset: u32,
    pub bbox: BoundingBox,
    /// Highest vertex, never below [`MIN_HEIGHT`].
    pub height: f32,
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    culled: usize,
    buffer: Option<BufferHandle>,
}

impl ObjectMesh {
    /// Parse the object at `path`, binding its texture and allocating it.
    ///
    /// A file that parses but contains no triangles yields the placeholder
    /// mesh from [`fallback::object_mesh`], keeping the parsed layer.
    pub fn load(path: &Path, ctx: &mut LoadContext<'_>) -> DecodeResult<Self> {
        let started = Instant::now();
        let (file, is_resource) = ctx.paths.locate(path);
        let source = (!is_resource).then(|| path.to_path_buf());
        let text = read_latin1(&file)?;
        let parsed = parse(&text)?;
        let dir = texture_dir(&file);
        let resolved = parsed.texture.as_deref().map(|declared| resolve(&dir, declared));

        let mut mesh = if parsed.is_empty() {
            tracing::debug!(
                "{}: no triangles, using placeholder (texture {resolved:?} unused)",
                file.display()
            );
            let mut mesh = fallback::object_mesh(source, ctx);
            mesh.layer = parsed.layer();
            mesh
        } else {
            let texture = match resolved {
                Some(ResolvedTexture::Found(name) | ResolvedTexture::Deferred(name)) => {
                    TextureBinding::load(ctx.textures, &dir, &name, TextureOptions::default())
                }
                Some(ResolvedTexture::None) | None => TextureBinding::default(),
            };
            parsed.finish(source, texture)
        };
        mesh.allocate(ctx.arena);
        tracing::debug!(
            "{:6.3}s {} ({} culled, {} no-cull vertices)",
            started.elapsed().as_secs_f32(),
            file.display(),
            mesh.culled_count(),
            mesh.no_cull_count()
        );
        Ok(mesh)
    }

    pub(crate) fn from_parts(
        source: Option<PathBuf>,
        texture: TextureBinding,
        vertices: Vec<Vec3>,
        uvs: Vec<Vec2>,
        bbox: BoundingBox,
        height: f32,
    ) -> Self {
        let culled = vertices.len();
        Self {
            source,
            texture,
            layer: Layer::DEFAULT,
            previewable: true,
            poly_offset: 0,
            bbox,
            height,
            vertices,
            uvs,
            culled,
            buffer: None,
        }
    }

    /// Culled triangles, then no-cull triangles, three vertices each.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// UVs, index-aligned with [`Self::vertices`].
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Vertices drawn with back-face culling.
    #[must_use]
    pub fn culled_count(&self) -> usize {
        self.culled
    }

    /// Vertices drawn without culling, following the culled ones.
    #[must_use]
    pub fn no_cull_count(&self) -> usize {
        self.vertices.len() - self.culled
    }

    #[must_use]
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Append into `arena` unless already holding a current allocation.
    pub fn allocate(&mut self, arena: &mut VertexArena) {
        if self.buffer.is_some_and(|handle| arena.is_current(handle)) {
            return;
        }
        self.buffer = Some(arena.allocate(&self.vertices, &self.uvs));
    }

    pub fn flush(&mut self) {
        self.buffer = None;
    }

    /// Draw parameters, if allocated in `arena`.
    #[must_use]
    pub fn draw_call(&self, arena: &VertexArena) -> Option<DrawCall> {
        let handle = self.buffer.filter(|&handle| arena.is_current(handle))?;
        Some(DrawCall {
            base: handle.base,
            culled: self.culled_count(),
            no_cull: self.no_cull_count(),
            texture: self.texture.handle,
            layer: self.layer,
        })
    }

    /// Lowest and highest vertex, each clamped towards zero.
    #[must_use]
    pub(crate) fn vertical_extent(&self) -> (f32, f32) {
        self.vertices
            .iter()
            .fold((0.0f32, 0.0f32), |(lo, hi), v| (lo.min(v.y), hi.max(v.y)))
    }
}

/// One triangle list.
#[derive(Debug, Default)]
struct Run {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
}

/// What an attribute record means for the body loop.
enum Flow {
    Continue,
    Stop,
    /// Not an attribute this parser knows.
    Ignored,
}

/// Parser state threaded through every record of an object body.
#[derive(Debug, Default)]
struct MeshBuilder {
    culled: Run,
    no_cull: Run,
    cull_disabled: bool,
    /// Cumulative translations of the open `ANIM_begin` blocks.
    anim: Vec<Vec3>,
    bbox: BoundingBox,
    height: f32,
    poly_offset: u32,
    layer: Option<Layer>,
    /// Declared texture, before resolution.
    texture: Option<String>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            height: MIN_HEIGHT,
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.culled.vertices.is_empty() && self.no_cull.vertices.is_empty()
    }

    /// Layer set by `ATTR_layer_group`, else the default for objects. Meshes
    /// with a polygon offset are decals and sit just beneath other objects.
    fn layer(&self) -> Layer {
        match self.layer {
            Some(layer) => layer,
            None if self.poly_offset > 0 => Layer::BELOW_DEFAULT,
            None => Layer::DEFAULT,
        }
    }

    fn track(&mut self, v: Vec3) {
        self.bbox.include(v.x, v.z);
        self.height = self.height.max(v.y);
    }

    fn active(&mut self) -> &mut Run {
        if self.cull_disabled {
            &mut self.no_cull
        } else {
            &mut self.culled
        }
    }

    fn emit(&mut self, vertex: Vec3, uv: Vec2) {
        let run = self.active();
        run.vertices.push(vertex);
        run.uvs.push(uv);
    }

    fn emit_indexed(&mut self, vertices: &[Vec3], uvs: &[Vec2], sequence: &[usize]) {
        for &i in sequence {
            self.emit(vertices[i], uvs[i]);
        }
    }

    /// Attribute records shared by versions 700 and 800.
    fn attribute(&mut self, record: &Record<'_>) -> DecodeResult<Flow> {
        match record.keyword() {
            // Only the nearest LOD is kept.
            "ATTR_LOD" => {
                if record.f32(1)? != 0.0 {
                    return Ok(Flow::Stop);
                }
            }
            "ATTR_poly_os" => {
                let level = u32::try_from(record.truncated(1)?).unwrap_or(0);
                self.poly_offset = self.poly_offset.max(level);
            }
            "ATTR_cull" => self.cull_disabled = false,
            "ATTR_no_cull" => self.cull_disabled = true,
            "ATTR_layer_group" => {
                self.layer = Some(Layer::new(record.token(1)?, record.parse(2)?)?);
            }
            _ => return Ok(Flow::Ignored),
        }
        Ok(Flow::Continue)
    }

    fn finish(self, source: Option<PathBuf>, texture: TextureBinding) -> ObjectMesh {
        let layer = self.layer();
        let culled = self.culled.vertices.len();
        let mut vertices = self.culled.vertices;
        vertices.extend(self.no_cull.vertices);
        let mut uvs = self.culled.uvs;
        uvs.extend(self.no_cull.uvs);
        ObjectMesh {
            source,
            texture,
            layer,
            previewable: true,
            poly_offset: self.poly_offset,
            bbox: self.bbox,
            height: self.height,
            vertices,
            uvs,
            culled,
            buffer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V2,
    V700,
    V800,
}

/// Parse object text into builder state. Texture binding and fallback
/// substitution are left to the caller.
fn parse(text: &str) -> DecodeResult<MeshBuilder> {
    let mut lines = Lines::new(text);
    lines.expect_marker()?;
    let version = match lines.continuation_record()?.keyword() {
        "2" => Version::V2,
        "700" => Version::V700,
        "800" => Version::V800,
        other => return Err(lines.error(format!("unsupported object version {other:?}"))),
    };
    if version != Version::V2 && lines.continuation_record()?.keyword() != "OBJ" {
        return Err(lines.error("missing OBJ marker"));
    }

    let mut builder = MeshBuilder::new();
    match version {
        Version::V2 => {
            builder.texture = Some(texture_line(&mut lines)?.to_owned());
            parse_v2(&mut lines, &mut builder)?;
        }
        Version::V700 => {
            builder.texture = Some(texture_line(&mut lines)?.to_owned());
            parse_v700(&mut lines, &mut builder)?;
        }
        Version::V800 => parse_v800(&mut lines, &mut builder)?,
    }
    Ok(builder)
}

/// First non-blank line, naming the texture in versions 2 and 700.
fn texture_line<'a>(lines: &mut Lines<'a>) -> DecodeResult<&'a str> {
    loop {
        let line = lines.continuation()?.trim();
        if !line.is_empty() {
            return Ok(line);
        }
    }
}

fn vertex_line(lines: &mut Lines<'_>, builder: &mut MeshBuilder) -> DecodeResult<Vec3> {
    let v = lines.continuation_record()?.vec3(0)?;
    builder.track(v);
    Ok(v)
}

fn parse_v2(lines: &mut Lines<'_>, builder: &mut MeshBuilder) -> DecodeResult<()> {
    while let Some(record) = lines.record(false) {
        match record.keyword() {
            "99" => break,
            // Lights, lines and smoke carry no triangles.
            "1" => skip(lines, 1)?,
            "2" => skip(lines, 2)?,
            "6" | "7" => skip(lines, 4)?,
            "3" => {
                let [u0, u1, v0, v1] = corner_uvs(&record)?;
                let mut vertices = [Vec3::ZERO; 3];
                for v in &mut vertices {
                    *v = vertex_line(lines, builder)?;
                }
                let uvs = [Vec2::new(u0, v1), Vec2::new(u1, v0), Vec2::new(u1, v1)];
                builder.emit_indexed(&vertices, &uvs, &TRIANGLE);
            }
            keyword => {
                let kind: i32 = record.parse(0)?;
                if kind < 0 {
                    quad_strip_v2(lines, builder, kind.unsigned_abs() as usize)?;
                } else if (4..=8).contains(&kind) {
                    let [u0, u1, v0, v1] = corner_uvs(&record)?;
                    let mut vertices = [Vec3::ZERO; 4];
                    for v in &mut vertices {
                        *v = vertex_line(lines, builder)?;
                    }
                    // Clockwise from top right.
                    let uvs = [
                        Vec2::new(u1, v1),
                        Vec2::new(u1, v0),
                        Vec2::new(u0, v0),
                        Vec2::new(u0, v1),
                    ];
                    builder.emit_indexed(&vertices, &uvs, &QUAD);
                } else {
                    return Err(DecodeError::format(
                        record.line,
                        format!("unknown record type {keyword}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// The four inline texture coordinates `s1 s2 t1 t2` of a version 2 record.
fn corner_uvs(record: &Record<'_>) -> DecodeResult<[f32; 4]> {
    Ok([record.f32(1)?, record.f32(2)?, record.f32(3)?, record.f32(4)?])
}

/// Version 2 quad strip: each line holds a left/right vertex pair followed
/// by their UVs as `s_left s_right t_left t_right`.
fn quad_strip_v2(
    lines: &mut Lines<'_>,
    builder: &mut MeshBuilder,
    pairs: usize,
) -> DecodeResult<()> {
    let mut vertices = Vec::new();
    let mut uvs = Vec::new();
    for _ in 0..pairs {
        let record = lines.continuation_record()?;
        for (position, s, t) in [(0, 6, 8), (3, 7, 9)] {
            let v = record.vec3(position)?;
            builder.track(v);
            vertices.push(v);
            uvs.push(Vec2::new(record.f32(s)?, record.f32(t)?));
        }
    }
    builder.emit_indexed(&vertices, &uvs, &quad_strip(pairs * 2));
    Ok(())
}

fn skip(lines: &mut Lines<'_>, count: usize) -> DecodeResult<()> {
    for _ in 0..count {
        lines.continuation()?;
    }
    Ok(())
}

/// Index sequence for a primitive of the given vertex count.
type Sequence = fn(usize) -> Vec<usize>;

fn parse_v700(lines: &mut Lines<'_>, builder: &mut MeshBuilder) -> DecodeResult<()> {
    while let Some(record) = lines.record(false) {
        let primitive = match record.keyword() {
            "tri" => Some((3, (|_| TRIANGLE.to_vec()) as Sequence)),
            "quad" | "quad_hard" | "quad_movie" => Some((4, (|_| QUAD.to_vec()) as Sequence)),
            "polygon" | "tri_fan" => Some((record.parse(1)?, triangle_fan as Sequence)),
            "quad_strip" => Some((record.parse(1)?, quad_strip as Sequence)),
            "tri_strip" => Some((record.parse(1)?, triangle_strip as Sequence)),
            "end" => break,
            _ => None,
        };
        match primitive {
            Some((count, sequence)) => {
                // The sequence is only built once `count` vertices exist.
                let (vertices, uvs) = vertices_v700(lines, builder, count)?;
                builder.emit_indexed(&vertices, &uvs, &sequence(count));
            }
            None => {
                if let Flow::Stop = builder.attribute(&record)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Read `count` vertices, each line holding `x y z s t` and optionally a
/// second vertex in the same layout.
fn vertices_v700(
    lines: &mut Lines<'_>,
    builder: &mut MeshBuilder,
    count: usize,
) -> DecodeResult<(Vec<Vec3>, Vec<Vec2>)> {
    let mut vertices = Vec::new();
    let mut uvs = Vec::new();
    while vertices.len() < count {
        let record = lines.continuation_record()?;
        let per_line = if record.len() > 5 { 2 } else { 1 };
        for k in 0..per_line {
            let v = record.vec3(k * 5)?;
            builder.track(v);
            vertices.push(v);
            uvs.push(Vec2::new(record.f32(k * 5 + 3)?, record.f32(k * 5 + 4)?));
        }
    }
    Ok((vertices, uvs))
}

fn parse_v800(lines: &mut Lines<'_>, builder: &mut MeshBuilder) -> DecodeResult<()> {
    let mut table_vertices: Vec<Vec3> = Vec::new();
    let mut table_uvs: Vec<Vec2> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();

    while let Some(record) = lines.record(false) {
        match record.keyword() {
            "VT" => {
                // VT x y z nx ny nz s t
                let v = record.vec3(1)?;
                builder.track(v);
                table_vertices.push(v);
                table_uvs.push(Vec2::new(record.f32(7)?, record.f32(8)?));
            }
            "IDX10" => {
                for i in 1..record.len().min(11) {
                    indices.push(record.parse(i)?);
                }
            }
            "IDX" => indices.push(record.parse(1)?),
            "TEXTURE" => {
                if record.len() > 1 {
                    builder.texture = Some(record.rest().to_owned());
                }
            }
            "ANIM_begin" => {
                let top = builder.anim.last().copied().unwrap_or(Vec3::ZERO);
                builder.anim.push(top);
            }
            "ANIM_end" => {
                if builder.anim.pop().is_none() {
                    return Err(DecodeError::format(record.line, "ANIM_end without ANIM_begin"));
                }
            }
            "ANIM_trans" => {
                let offset = record.vec3(1)?;
                match builder.anim.last_mut() {
                    Some(top) => *top += offset,
                    None => {
                        return Err(DecodeError::format(
                            record.line,
                            "ANIM_trans outside ANIM_begin",
                        ));
                    }
                }
            }
            "TRIS" => {
                let start: usize = record.parse(1)?;
                let count: usize = record.parse(2)?;
                let end = start
                    .checked_add(count)
                    .filter(|&end| end <= indices.len())
                    .ok_or_else(|| {
                        DecodeError::format(
                            record.line,
                            format!("TRIS {start} {count} exceeds {} indices", indices.len()),
                        )
                    })?;
                let offset = builder.anim.last().copied().unwrap_or(Vec3::ZERO);
                for i in start..end {
                    let vertex = indices
                        .get(i)
                        .filter(|&&vertex| vertex < table_vertices.len())
                        .copied()
                        .ok_or_else(|| {
                            DecodeError::format(record.line, format!("index {i} out of range"))
                        })?;
                    builder.emit(table_vertices[vertex] + offset, table_uvs[vertex]);
                }
            }
            _ => {
                if let Flow::Stop = builder.attribute(&record)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

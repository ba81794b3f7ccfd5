//! Placeholder definitions for assets that are missing, empty or malformed.
//!
//! Every placeholder is a complete definition of the requested kind, so it
//! can be placed, drawn and selected like the real thing. None of them are
//! previewable.

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};

use crate::bbox::BoundingBox;
use crate::definition::{Definition, LoadContext};
use crate::facade::Facade;
use crate::forest::Forest;
use crate::layer::Layer;
use crate::line::LineMarking;
use crate::network::RoadNetwork;
use crate::object::ObjectMesh;
use crate::paths::AssetPaths;
use crate::polygon::{DrapedPolygon, EXCLUSION_PREFIX, ExclusionZone, UnknownPolygon};
use crate::texture::{TextureBinding, TextureHandle, TextureOptions};

/// Positions of the placeholder marker: an inverted pyramid with its apex
/// at the origin and a unit square top at height one.
const MARKER_VERTICES: [[f32; 3]; 18] = [
    [0.5, 1.0, -0.5],
    [-0.5, 1.0, 0.5],
    [-0.5, 1.0, -0.5],
    [0.5, 1.0, 0.5],
    [-0.5, 1.0, 0.5],
    [0.5, 1.0, -0.5],
    [0.0, 0.0, 0.0],
    [-0.5, 1.0, 0.5],
    [0.5, 1.0, 0.5],
    [0.0, 0.0, 0.0],
    [-0.5, 1.0, -0.5],
    [-0.5, 1.0, 0.5],
    [0.0, 0.0, 0.0],
    [0.5, 1.0, -0.5],
    [-0.5, 1.0, -0.5],
    [0.5, 1.0, -0.5],
    [0.0, 0.0, 0.0],
    [0.5, 1.0, 0.5],
];

const MARKER_UVS: [[f32; 2]; 18] = [
    [1.0, 1.0],
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [0.5, 0.0],
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 0.5],
    [0.0, 1.0],
    [0.0, 0.0],
    [0.5, 1.0],
    [1.0, 1.0],
    [0.0, 1.0],
    [1.0, 1.0],
    [1.0, 0.5],
    [1.0, 0.0],
];

/// Scale of the placeholder draped texture.
const DRAPED_SCALE: f32 = 10.0;

/// Bind the bundled placeholder texture.
pub fn texture(ctx: &mut LoadContext<'_>) -> TextureBinding {
    let path = ctx.paths.fallback_texture();
    match ctx.textures.get(&path, TextureOptions::default()) {
        Ok(handle) => TextureBinding {
            handle,
            error: None,
        },
        Err(err) => {
            tracing::warn!("{err}");
            TextureBinding {
                handle: TextureHandle::NONE,
                error: Some(err),
            }
        }
    }
}

/// The placeholder marker mesh. Not allocated.
pub fn object_mesh(source: Option<PathBuf>, ctx: &mut LoadContext<'_>) -> ObjectMesh {
    let mut mesh = ObjectMesh::from_parts(
        source,
        texture(ctx),
        MARKER_VERTICES.iter().copied().map(Vec3::from).collect(),
        MARKER_UVS.iter().copied().map(Vec2::from).collect(),
        BoundingBox::new(-0.5, 0.5, -0.5, 0.5),
        1.0,
    );
    mesh.previewable = false;
    mesh
}

/// A placeholder of the kind `path` would have loaded as.
///
/// Exclusions have no file and cannot fail, so they come back as real
/// exclusions. Network tables have no per-file placeholder and come back as
/// an unknown polygon; use [`network`] for individual network types.
pub fn for_path(path: &Path, ctx: &mut LoadContext<'_>) -> Definition {
    let name = path.to_string_lossy();
    if name.starts_with(EXCLUSION_PREFIX) {
        return Definition::Exclusion(ExclusionZone::new(name));
    }
    let (_, is_resource) = ctx.paths.locate(path);
    let source = (!is_resource).then(|| path.to_path_buf());
    let extension = crate::definition::extension(path);
    tracing::warn!("using placeholder for {}", path.display());
    match extension.as_str() {
        ".obj" | ".agp" => {
            let mut mesh = object_mesh(source, ctx);
            mesh.allocate(ctx.arena);
            Definition::Object(mesh)
        }
        ".pol" => Definition::Draped(DrapedPolygon {
            source,
            texture: texture(ctx),
            layer: Layer::DEFAULT,
            previewable: false,
            orthophoto: false,
            scale: Vec2::splat(DRAPED_SCALE),
            alpha: true,
        }),
        ".fac" => Definition::Facade(Facade::placeholder(source, texture(ctx))),
        ".for" => Definition::Forest(Forest::placeholder(source)),
        ".lin" => Definition::Line(LineMarking::placeholder(source, texture(ctx))),
        _ => Definition::Unknown(UnknownPolygon::new(source)),
    }
}

/// Placeholder for one network type of the table at `path`.
#[must_use]
pub fn network(path: &Path, paths: &AssetPaths, name: &str, index: u32) -> RoadNetwork {
    RoadNetwork::placeholder(path, paths, name, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::GeometryDefinition;
    use crate::polygon::tests::Fixture;

    #[test]
    fn marker_mesh_shape() {
        let mut fx = Fixture::new();
        let mesh = object_mesh(None, &mut fx.ctx());
        assert_eq!(mesh.vertices().len(), 18);
        assert_eq!(mesh.uvs().len(), 18);
        assert_eq!(mesh.culled_count(), 18);
        assert_eq!(mesh.no_cull_count(), 0);
        assert_eq!(mesh.bbox, BoundingBox::new(-0.5, 0.5, -0.5, 0.5));
        assert_eq!(mesh.height, 1.0);
        assert!(!mesh.previewable);
        assert!(!mesh.texture.handle.is_none());
        assert!(mesh.buffer().is_none());
        // Every vertex lies within the reported box.
        assert!(mesh.vertices().iter().all(|v| v.x.abs() <= 0.5 && v.z.abs() <= 0.5));
    }

    #[test]
    fn empty_object_becomes_marker() {
        let mut fx = Fixture::new();
        let path = fx.write(
            "empty.obj",
            "I\n700\nOBJ\ntex\nATTR_layer_group runways 2\nend\n",
        );
        let mesh = ObjectMesh::load(&path, &mut fx.ctx()).unwrap();
        let marker = object_mesh(None, &mut fx.ctx());
        assert_eq!(mesh.vertices(), marker.vertices());
        assert_eq!(mesh.uvs(), marker.uvs());
        assert!(!mesh.previewable);
        assert_eq!(mesh.layer.to_string(), "runways +2");
        assert!(mesh.buffer().is_some());
    }

    #[test]
    fn placeholder_per_extension() {
        let mut fx = Fixture::new();
        let mut ctx = fx.ctx();
        let cases = [
            ("a.obj", Layer::DEFAULT),
            ("b.POL", Layer::DEFAULT),
            ("c.fac", Layer::DEFAULT),
            ("d.for", Layer::OUTLINE),
            ("e.lin", Layer::MARKINGS),
            ("f.str", Layer::DEFAULT),
        ];
        for (name, layer) in cases {
            let definition = for_path(Path::new(name), &mut ctx);
            assert_eq!(definition.layer(), layer, "{name}");
            assert!(!definition.is_previewable(), "{name}");
        }
        match for_path(Path::new("b.pol"), &mut ctx) {
            Definition::Draped(draped) => assert_eq!(draped.scale, Vec2::splat(10.0)),
            other => panic!("unexpected {other:?}"),
        }
        match for_path(Path::new("c.fac"), &mut ctx) {
            Definition::Facade(facade) => {
                assert!(facade.ring && facade.two_sided);
                assert_eq!(facade.horizontal, vec![(0.0, 1.0)]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(for_path(Path::new("d.for"), &mut ctx).texture().is_none());
        assert!(matches!(
            for_path(Path::new("Exclude:Objects"), &mut ctx),
            Definition::Exclusion(_)
        ));
    }

    #[test]
    fn resource_placeholders_have_no_source() {
        let mut fx = Fixture::new();
        let definition = for_path(Path::new("*missing.obj"), &mut fx.ctx());
        assert_eq!(definition.source(), None);
    }

    #[test]
    fn network_placeholder() {
        let paths = AssetPaths::default();
        let network = network(Path::new("roads.net"), &paths, "Primary", 4);
        assert_eq!((network.name.as_str(), network.index), ("Primary", 4));
        assert!(network.texture.handle.is_none());
        assert!(!network.previewable);
        assert_eq!(network.layer, Layer::NETWORK);
    }
}

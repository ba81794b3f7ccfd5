//! Path-keyed store of loaded definitions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::definition::{Definition, GeometryDefinition, LoadContext};
use crate::error::TextureError;
use crate::fallback;
use crate::object::ObjectMesh;

/// Definitions loaded so far, at most one per path.
///
/// Networks are not stored here: they borrow the cache to share their
/// attached objects.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    definitions: HashMap<PathBuf, Definition>,
}

impl DefinitionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.definitions.contains_key(path)
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Definition> {
        self.definitions.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Definition> {
        self.definitions.get_mut(path)
    }

    /// Store `definition`, returning whatever was there before.
    pub fn insert(&mut self, path: PathBuf, definition: Definition) -> Option<Definition> {
        self.definitions.insert(path, definition)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Definition)> {
        self.definitions
            .iter()
            .map(|(path, definition)| (path.as_path(), definition))
    }

    /// The object mesh at `path`, loaded on first use and allocated in the
    /// current arena.
    ///
    /// An object that fails to load is replaced by the placeholder marker.
    /// Returns `None` if `path` already holds something other than an object.
    pub fn object(&mut self, path: &Path, ctx: &mut LoadContext<'_>) -> Option<&ObjectMesh> {
        if !self.definitions.contains_key(path) {
            let mesh = match ObjectMesh::load(path, ctx) {
                Ok(mesh) => mesh,
                Err(err) => {
                    tracing::warn!("{}: {err}", path.display());
                    let (_, is_resource) = ctx.paths.locate(path);
                    fallback::object_mesh((!is_resource).then(|| path.to_path_buf()), ctx)
                }
            };
            self.definitions
                .insert(path.to_path_buf(), Definition::Object(mesh));
        }
        match self.definitions.get_mut(path)? {
            Definition::Object(mesh) => {
                mesh.allocate(ctx.arena);
                Some(&*mesh)
            }
            _ => None,
        }
    }

    /// Allocate every stored definition into the current arena.
    pub fn allocate_all(&mut self, ctx: &mut LoadContext<'_>) {
        for definition in self.definitions.values_mut() {
            if let Definition::Object(mesh) = definition {
                mesh.allocate(ctx.arena);
            }
        }
    }

    /// Forget every arena allocation.
    pub fn flush(&mut self) {
        for definition in self.definitions.values_mut() {
            definition.flush();
        }
    }

    /// Remove and return every recorded texture failure.
    pub fn take_texture_errors(&mut self) -> Vec<(PathBuf, TextureError)> {
        let mut errors: Vec<_> = self
            .definitions
            .iter_mut()
            .filter_map(|(path, definition)| {
                definition
                    .take_texture_error()
                    .map(|error| (path.clone(), error))
            })
            .collect();
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::tests::Fixture;

    const TRIANGLE: &str = "I\n700\nOBJ\nmissing_tex\ntri\n0 0 0 0 0\n1 0 0 0 0\n0 0 1 0 0\nend\n";

    #[test]
    fn objects_load_once() {
        let mut fx = Fixture::new();
        let path = fx.write("tri.obj", TRIANGLE);
        let mut cache = DefinitionCache::new();
        assert_eq!(cache.object(&path, &mut fx.ctx()).unwrap().culled_count(), 3);
        assert_eq!(cache.object(&path, &mut fx.ctx()).unwrap().culled_count(), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(fx.arena.len(), 3);
    }

    #[test]
    fn broken_objects_become_markers() {
        let mut fx = Fixture::new();
        let path = fx.write("broken.obj", "I\n900\nOBJ\n");
        let mut cache = DefinitionCache::new();
        let mesh = cache.object(&path, &mut fx.ctx()).unwrap();
        assert_eq!(mesh.vertices().len(), 18);
        assert!(!mesh.previewable);
        assert_eq!(mesh.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn non_objects_are_not_returned_as_objects() {
        let mut fx = Fixture::new();
        let mut cache = DefinitionCache::new();
        let path = PathBuf::from("Exclude:Objects");
        cache.insert(
            path.clone(),
            Definition::Exclusion(crate::polygon::ExclusionZone::new("Exclude:Objects")),
        );
        assert!(cache.object(&path, &mut fx.ctx()).is_none());
    }

    #[test]
    fn flush_and_reallocate() {
        let mut fx = Fixture::new();
        let path = fx.write("tri.obj", TRIANGLE);
        let mut cache = DefinitionCache::new();
        cache.object(&path, &mut fx.ctx());
        fx.arena.flush();
        cache.flush();
        assert!(cache.get(&path).unwrap().draw_call(&fx.arena).is_none());
        cache.allocate_all(&mut fx.ctx());
        let call = cache.get(&path).unwrap().draw_call(&fx.arena).unwrap();
        assert_eq!((call.base, call.culled), (0, 3));
    }

    #[test]
    fn texture_errors_are_drained() {
        let mut fx = Fixture::new();
        let path = fx.write("tri.obj", TRIANGLE);
        let mut cache = DefinitionCache::new();
        cache.object(&path, &mut fx.ctx());
        let errors = cache.take_texture_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, path);
        assert_eq!(errors[0].1.filename, "missing_tex");
        assert!(cache.take_texture_errors().is_empty());
    }
}

//! Batch loading of scenery asset libraries.
//!
//! [`Library`] owns everything [`scenery_decode`] needs to turn definition
//! files into drawable geometry: the vertex arena, the texture cache and the
//! path-keyed definition cache. Loading never fails as a whole. Files that
//! cannot be decoded are replaced by placeholders, unsupported kinds are
//! skipped, and every problem ends up in one [`LoadReport`].
//!
//! # Example
//!
//! ```no_run
//! use scenery::Library;
//! use scenery_decode::AssetPaths;
//!
//! let mut library = Library::new(AssetPaths::new("Resources"));
//! let files = Library::scan("Custom Scenery/KSEA".as_ref())?;
//! let report = library.load_batch(&files);
//! if let Some(summary) = report.summary() {
//!     eprintln!("{summary}");
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

mod report;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use scenery_decode::definition::{KNOWN_EXTENSIONS, extension};
use scenery_decode::{
    AssetPaths, DecodeError, Definition, DefinitionCache, DrawCall, FactoryOptions,
    GeometryDefinition, LoadContext, MemoryTextureCache, Outcome, RoadNetwork, TextureError,
    VertexArena, create, fallback,
};

pub use report::LoadReport;

/// What happened to one path passed to [`Library::load`].
#[derive(Debug)]
pub enum LoadStatus {
    /// Decoded and stored.
    Loaded,
    /// Already in the library; nothing was read.
    Cached,
    /// Failed to decode; a placeholder was stored instead.
    Placeholder(DecodeError),
    /// Deliberately not loaded, e.g. a `.net` table.
    Skipped(String),
}

/// A set of loaded definitions and the resources they are drawn from.
#[derive(Debug)]
pub struct Library {
    paths: AssetPaths,
    options: FactoryOptions,
    arena: VertexArena,
    textures: MemoryTextureCache,
    definitions: DefinitionCache,
    networks: Vec<RoadNetwork>,
}

impl Library {
    #[must_use]
    pub fn new(paths: AssetPaths) -> Self {
        Self {
            paths,
            options: FactoryOptions::default(),
            arena: VertexArena::new(),
            textures: MemoryTextureCache::new(),
            definitions: DefinitionCache::new(),
            networks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FactoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Every file under `dir` with a definition extension, sorted. Symbolic
    /// links to directories are not followed.
    pub fn scan(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if KNOWN_EXTENSIONS.contains(&extension(&path).as_str()) {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }

    /// Load the definition at `path` unless it is already loaded.
    pub fn load(&mut self, path: &Path) -> LoadStatus {
        if self.definitions.contains(path) {
            return LoadStatus::Cached;
        }
        let mut ctx = LoadContext {
            arena: &mut self.arena,
            textures: &mut self.textures,
            paths: &self.paths,
        };
        match create(path, &mut ctx, self.options) {
            Ok(Outcome::Loaded(definition)) => {
                self.definitions.insert(path.to_path_buf(), definition);
                LoadStatus::Loaded
            }
            Ok(Outcome::Unsupported(extension)) => {
                tracing::debug!("skipping {}", path.display());
                LoadStatus::Skipped(extension)
            }
            Err(err) => {
                tracing::warn!("can't read {}: {err}", path.display());
                let placeholder = fallback::for_path(path, &mut ctx);
                self.definitions.insert(path.to_path_buf(), placeholder);
                LoadStatus::Placeholder(err)
            }
        }
    }

    /// Load every path, collecting failures into one report.
    pub fn load_batch<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> LoadReport {
        let started = Instant::now();
        let mut report = LoadReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.load(path) {
                LoadStatus::Loaded => report.loaded += 1,
                LoadStatus::Cached => report.cached += 1,
                LoadStatus::Placeholder(err) => report.unreadable.push((path.to_path_buf(), err)),
                LoadStatus::Skipped(_) => report.skipped.push(path.to_path_buf()),
            }
        }
        report.textures = self.take_texture_errors();
        tracing::info!(
            "loaded {} definitions in {:.3}s ({} placeholders, {} skipped, {} texture errors)",
            report.loaded,
            started.elapsed().as_secs_f32(),
            report.unreadable.len(),
            report.skipped.len(),
            report.textures.len()
        );
        report
    }

    /// Add a network type. Its geometry is realized by [`Self::allocate_all`].
    pub fn add_network(&mut self, network: RoadNetwork) {
        self.networks.push(network);
    }

    #[must_use]
    pub fn networks(&self) -> &[RoadNetwork] {
        &self.networks
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Definition> {
        self.definitions.get(path)
    }

    #[must_use]
    pub fn definitions(&self) -> &DefinitionCache {
        &self.definitions
    }

    #[must_use]
    pub fn arena(&self) -> &VertexArena {
        &self.arena
    }

    #[must_use]
    pub fn textures(&self) -> &MemoryTextureCache {
        &self.textures
    }

    /// Draw parameters for the definition at `path`, if it is allocated.
    #[must_use]
    pub fn draw_call(&self, path: &Path) -> Option<DrawCall> {
        self.definitions.get(path)?.draw_call(&self.arena)
    }

    /// Allocate every definition and network into the arena.
    pub fn allocate_all(&mut self) {
        let mut ctx = LoadContext {
            arena: &mut self.arena,
            textures: &mut self.textures,
            paths: &self.paths,
        };
        self.definitions.allocate_all(&mut ctx);
        for network in &mut self.networks {
            network.allocate(&mut ctx, &mut self.definitions);
        }
    }

    /// Discard all geometry from the arena, e.g. when moving to another
    /// tile. Parsed definitions are kept.
    pub fn flush(&mut self) {
        self.arena.flush();
        self.definitions.flush();
        for network in &mut self.networks {
            network.flush();
        }
        tracing::debug!("flushed arena, now generation {}", self.arena.generation());
    }

    /// Remove and return every texture failure recorded on loaded
    /// definitions. Networks keep theirs on [`RoadNetwork::texture`].
    pub fn take_texture_errors(&mut self) -> Vec<(PathBuf, TextureError)> {
        self.definitions.take_texture_errors()
    }
}

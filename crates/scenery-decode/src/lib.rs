//! Decode scenery object, polygon and network definitions into triangle
//! buffers.
//!
//! Definition files are small line-oriented text formats. This crate reads
//! them into normalized geometry (positions, UVs, bounding box, height, draw
//! layer and texture) for a renderer and an editor to consume. It never
//! draws anything itself.
//!
//! # Design principles
//!
//! - **Synchronous**: every load runs to completion before returning
//! - **Never empty**: anything that cannot be decoded has a placeholder of
//!   the same kind (see [`fallback`])
//! - **Soft texture failures**: missing textures are recorded on the
//!   definition, never returned as errors
//!
//! # Key functions
//!
//! - [`create`]: Pick a definition kind from a path and decode it
//! - [`ObjectMesh::load`]: Decode version 2, 700 and 800 object meshes
//! - [`fallback::for_path`]: Placeholder for a definition that failed
//! - [`texture::resolve`]: Find the file a declared texture refers to
//! - [`Layer::new`]: Resolve a layer group and offset to a draw-order code

mod error;
mod lines;

pub mod arena;
pub mod bbox;
pub mod cache;
pub mod definition;
pub mod facade;
pub mod fallback;
pub mod forest;
pub mod layer;
pub mod line;
pub mod network;
pub mod object;
pub mod paths;
pub mod polygon;
pub mod strips;
pub mod texture;

pub use arena::{BufferHandle, VertexArena};
pub use bbox::BoundingBox;
pub use cache::DefinitionCache;
pub use definition::{
    Category, Definition, DrawCall, FactoryOptions, GeometryDefinition, LoadContext, Outcome,
    Preview, create,
};
pub use error::{DecodeError, DecodeResult, TextureError};
pub use facade::Facade;
pub use forest::Forest;
pub use layer::{Layer, LayerError};
pub use line::LineMarking;
pub use network::{AttachedObject, NetworkSegment, RoadNetwork, SegmentEdge};
pub use object::ObjectMesh;
pub use paths::AssetPaths;
pub use polygon::{DrapedPolygon, ExclusionZone, UnknownPolygon};
pub use texture::{
    MemoryTextureCache, TextureBinding, TextureCache, TextureHandle, TextureOptions, TextureWrap,
};

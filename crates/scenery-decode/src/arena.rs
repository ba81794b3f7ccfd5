//! Shared append-only vertex buffer.
//!
//! All definitions drawn for the current tile append their triangles into one
//! [`VertexArena`]. [`VertexArena::flush`] discards everything at once and
//! bumps the arena generation, which invalidates every [`BufferHandle`]
//! issued before it.

use glam::{Vec2, Vec3};

/// Location of one allocation within a [`VertexArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Index of the first vertex.
    pub base: usize,
    generation: u64,
}

/// Append-only position/UV arena.
#[derive(Debug, Default)]
pub struct VertexArena {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    generation: u64,
}

impl VertexArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append index-aligned positions and UVs, returning where they start.
    pub fn allocate(&mut self, vertices: &[Vec3], uvs: &[Vec2]) -> BufferHandle {
        debug_assert_eq!(vertices.len(), uvs.len(), "positions and UVs must pair up");
        let base = self.vertices.len();
        self.vertices.extend_from_slice(vertices);
        self.uvs.extend_from_slice(uvs);
        BufferHandle {
            base,
            generation: self.generation,
        }
    }

    /// Drop all data and invalidate every outstanding handle.
    pub fn flush(&mut self) {
        self.vertices.clear();
        self.uvs.clear();
        self.generation += 1;
    }

    /// Whether `handle` was issued since the last flush.
    #[must_use]
    pub fn is_current(&self, handle: BufferHandle) -> bool {
        handle.generation == self.generation
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

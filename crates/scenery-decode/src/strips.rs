//! Index sequences that unroll strips, fans and quads into flat triangle lists.
//!
//! Each function returns indices into the vertices of one primitive record;
//! every three consecutive indices form one triangle.

/// Single triangle.
pub const TRIANGLE: [usize; 3] = [0, 1, 2];

/// Quad split along its 0-2 diagonal.
pub const QUAD: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// Quad strip over `count` vertices, laid out as left/right pairs.
///
/// Each successive pair closes one quad, emitted as two triangles
/// `{i, i+1, i+2}` and `{i+3, i+2, i+1}`. A trailing unpaired vertex is
/// ignored.
#[must_use]
pub fn quad_strip(count: usize) -> Vec<usize> {
    (0..count.saturating_sub(3))
        .step_by(2)
        .flat_map(|i| [i, i + 1, i + 2, i + 3, i + 2, i + 1])
        .collect()
}

/// Triangle strip over `count` vertices, flipping winding on odd steps so
/// every triangle faces the same way.
#[must_use]
pub fn triangle_strip(count: usize) -> Vec<usize> {
    (0..count.saturating_sub(2))
        .flat_map(|i| {
            if i & 1 == 1 {
                [i + 2, i + 1, i]
            } else {
                [i, i + 1, i + 2]
            }
        })
        .collect()
}

/// Triangle fan about vertex 0. Also used for convex polygons.
#[must_use]
pub fn triangle_fan(count: usize) -> Vec<usize> {
    (1..count.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}

use veld_world::CHUNK_SIZE;

use crate::{ExtractError, Triangle};

/// Threads per axis of one extraction work group.
pub const GROUP_THREADS: usize = 8;
/// Triangles budgeted per cell in the worst-case bound.
pub const MAX_TRIS_PER_CELL: usize = 5;

/// Worst-case triangle count for a chunk of edge `chunk_size`:
/// `threads^3 * groups^3 * 5` with `groups = ceil(chunk_size / threads)`.
pub const fn worst_case_triangles(chunk_size: usize) -> usize {
    let groups = chunk_size.div_ceil(GROUP_THREADS);
    let per_axis = GROUP_THREADS * groups;
    per_axis * per_axis * per_axis * MAX_TRIS_PER_CELL
}

/// Reusable scratch list of extracted triangles with a hard capacity.
#[derive(Debug)]
pub struct TriangleBuffer {
    tris: Vec<Triangle>,
    capacity: usize,
}

impl TriangleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tris: Vec::new(),
            capacity,
        }
    }

    /// Buffer sized for one `CHUNK_SIZE` chunk.
    pub fn for_chunk() -> Self {
        Self::with_capacity(worst_case_triangles(CHUNK_SIZE))
    }

    #[inline]
    pub fn push(&mut self, tri: Triangle) -> Result<(), ExtractError> {
        if self.tris.len() >= self.capacity {
            return Err(ExtractError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.tris.push(tri);
        Ok(())
    }

    /// Empties the buffer but keeps its allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.tris.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tris.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[Triangle] {
        &self.tris
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.tris.iter()
    }
}

//! CPU surface extraction for density chunks: triangle soup, welding, per-material buckets.
#![forbid(unsafe_code)]

mod buffer;
mod tetra;
mod weld;

pub use buffer::{GROUP_THREADS, MAX_TRIS_PER_CELL, TriangleBuffer, worst_case_triangles};
pub use tetra::MarchingTetrahedra;
pub use weld::{ChunkMesh, WeldStats, weld_and_bucket};

use veld_chunk::DensityGrid;
use veld_geom::Vec3;

/// Identity of a generated vertex: the two grid points of the edge it lies on, smaller first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32, pub u32);

impl VertexId {
    #[inline]
    pub fn edge(a: usize, b: usize) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        VertexId(lo as u32, hi as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerVertex {
    /// Chunk-local position.
    pub position: Vec3,
    pub normal: Vec3,
    pub id: VertexId,
    /// Material blend factor in `[0, 1]`.
    pub weight: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub corners: [CornerVertex; 3],
    pub biome: u32,
}

impl Triangle {
    #[inline]
    pub fn area(&self) -> f32 {
        veld_geom::triangle_area(
            self.corners[0].position,
            self.corners[1].position,
            self.corners[2].position,
        )
    }

    /// Unnormalised geometric normal from the winding order.
    #[inline]
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.corners;
        (b.position - a.position).cross(c.position - a.position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractParams {
    /// Points with density above this are inside the surface.
    pub threshold: f32,
    /// Width of the biome transition band; smaller is sharper.
    pub blend_gap: f32,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            blend_gap: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    GridTooSmall { len: usize, expected: usize },
    /// The triangle buffer filled up; it holds the first `capacity` triangles.
    CapacityExceeded { capacity: usize },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::GridTooSmall { len, expected } => {
                write!(f, "density grid has {} points, expected {}", len, expected)
            }
            ExtractError::CapacityExceeded { capacity } => {
                write!(f, "triangle buffer capacity {} exceeded", capacity)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Turns a filled density grid into an unindexed triangle list.
pub trait SurfaceExtractor {
    /// Clears `out` and appends the surface triangles of `grid`.
    ///
    /// Corner ids must be a pure function of grid-point identity so that welding
    /// merges every corner that represents the same surface point.
    fn extract(
        &self,
        grid: &DensityGrid,
        params: &ExtractParams,
        out: &mut TriangleBuffer,
    ) -> Result<(), ExtractError>;
}

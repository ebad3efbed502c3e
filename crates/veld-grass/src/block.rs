use veld_geom::{Aabb, Vec3};
use veld_gpu::{GpuBuffer, GpuDevice};

use crate::sampler::HeightSampler;

/// Floats per generated blade source vertex: position, normal, color, height.
pub const SOURCE_VERTEX_FLOATS: usize = 3 + 3 + 4 + 1;
pub const SOURCE_VERTEX_STRIDE: usize = SOURCE_VERTEX_FLOATS * 4;
/// Bytes per appended draw triangle: a normal plus four corners of
/// position, normal, uv, height and color.
pub const DRAW_STRIDE: usize = (3 + 4 * (3 + 3 + 2 + 1 + 4)) * 4;
/// Threads per group of the grass compute kernels.
pub const GROUP_THREADS: u32 = 64;

/// Integer cell of the block grid on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCoord {
    pub x: i32,
    pub z: i32,
}

impl BlockCoord {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn containing(p: Vec3, block_size: f32) -> Self {
        Self::new(
            (p.x / block_size).floor() as i32,
            (p.z / block_size).floor() as i32,
        )
    }

    /// Minimum corner at `y = 0`.
    #[inline]
    pub fn position(self, block_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * block_size, 0.0, self.z as f32 * block_size)
    }

    /// Block footprint, two units tall around `y = 0`.
    pub fn base_bounds(self, block_size: f32) -> Aabb {
        let half = block_size * 0.5;
        Aabb::from_center_size(
            self.position(block_size) + Vec3::new(half, 0.0, half),
            Vec3::new(block_size, 2.0, block_size),
        )
    }
}

impl std::fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Source vertex slots reserved per block: twice the blades of a fully dense block.
#[inline]
pub fn source_vertex_capacity(block_size: f32, max_density: u32) -> usize {
    (block_size * block_size) as usize * max_density as usize * 2
}

/// Re-centres `bounds` vertically on the terrain under its four footprint corners.
pub fn fit_to_terrain(bounds: Aabb, heights: &dyn HeightSampler) -> Aabb {
    let c = bounds.center();
    let h = bounds.size() * 0.5;
    let samples = [
        heights.sample_height(c.x - h.x, c.z - h.z),
        heights.sample_height(c.x - h.x, c.z + h.z),
        heights.sample_height(c.x + h.x, c.z - h.z),
        heights.sample_height(c.x + h.x, c.z + h.z),
    ];
    let lo = samples.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Aabb::from_center_size(
        Vec3::new(c.x, (lo + hi) * 0.5, c.z),
        Vec3::new(bounds.size().x, hi - lo + 2.0, bounds.size().z),
    )
}

/// A streamed grass cell owning its generated source vertices.
#[derive(Debug)]
pub struct GrassBlock {
    coord: BlockCoord,
    bounds: Aabb,
    source_vertices: GpuBuffer,
    info: GpuBuffer,
    /// Baked map triangles the block spawned on.
    pub mesh_triangles: u32,
    /// Survived culling in the last rendered frame.
    pub visible: bool,
}

impl GrassBlock {
    pub fn new(coord: BlockCoord, bounds: Aabb, source_vertices: GpuBuffer, info: GpuBuffer) -> Self {
        Self {
            coord,
            bounds,
            source_vertices,
            info,
            mesh_triangles: 0,
            visible: false,
        }
    }

    #[inline]
    pub fn coord(&self) -> BlockCoord {
        self.coord
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub fn source_vertices(&self) -> &GpuBuffer {
        &self.source_vertices
    }

    #[inline]
    pub fn info(&self) -> &GpuBuffer {
        &self.info
    }

    pub fn release(self, device: &mut dyn GpuDevice) {
        device.release(self.source_vertices);
        device.release(self.info);
    }
}

use veld_geom::Vec3;
use veld_world::{ChunkCoord, NUM_POINTS_PER_AXIS};

/// Density assigned to every point before any source contributes; always outside the surface.
pub const SENTINEL_DENSITY: f32 = -1.0;

/// Scalar density and biome id per grid point of one chunk.
///
/// Point `(x, y, z)` sits at chunk-local `(x - 1, y - 1, z - 1)`, so the grid covers
/// local `[-1, CHUNK_SIZE + 1]` on each axis.
#[derive(Clone, Debug)]
pub struct DensityGrid {
    pub coord: ChunkCoord,
    pub density: Vec<f32>,
    pub biome: Vec<u32>,
}

impl DensityGrid {
    pub const N: usize = NUM_POINTS_PER_AXIS;
    pub const LEN: usize = Self::N * Self::N * Self::N;

    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            density: vec![SENTINEL_DENSITY; Self::LEN],
            biome: vec![0; Self::LEN],
        }
    }

    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * Self::N + z) * Self::N + x
    }

    /// Inverse of [`DensityGrid::idx`].
    #[inline]
    pub fn unidx(i: usize) -> (usize, usize, usize) {
        let n = Self::N;
        (i % n, i / (n * n), (i / n) % n)
    }

    pub fn clear(&mut self) {
        self.density.fill(SENTINEL_DENSITY);
        self.biome.fill(0);
    }

    #[inline]
    pub fn density_at(&self, x: usize, y: usize, z: usize) -> f32 {
        self.density[Self::idx(x, y, z)]
    }

    #[inline]
    pub fn biome_at(&self, x: usize, y: usize, z: usize) -> u32 {
        self.biome[Self::idx(x, y, z)]
    }

    /// Position of a grid point relative to the chunk origin.
    #[inline]
    pub fn local_position(x: usize, y: usize, z: usize) -> Vec3 {
        Vec3::new(x as f32 - 1.0, y as f32 - 1.0, z as f32 - 1.0)
    }

    #[inline]
    pub fn world_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.coord.world_origin() + Self::local_position(x, y, z)
    }

    pub fn is_empty(&self) -> bool {
        self.density.iter().all(|d| *d == SENTINEL_DENSITY)
    }

    /// Interleaved `[x, y, z, density]` records in world space, one per point.
    pub fn points(&self) -> Vec<[f32; 4]> {
        (0..Self::LEN)
            .map(|i| {
                let (x, y, z) = Self::unidx(i);
                let p = self.world_position(x, y, z);
                [p.x, p.y, p.z, self.density[i]]
            })
            .collect()
    }
}

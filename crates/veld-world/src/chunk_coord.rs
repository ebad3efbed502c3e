use veld_geom::{Aabb, Vec3};

use crate::{CHUNK_PADDING, CHUNK_SIZE};

const HALF_CHUNK: f32 = CHUNK_SIZE as f32 * 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// Chunk containing the world position `p`.
    #[inline]
    pub fn containing(p: Vec3) -> Self {
        let s = CHUNK_SIZE as f32;
        let h = HALF_CHUNK;
        Self::new(
            ((p.x + h) / s).floor() as i32,
            ((p.y + h) / s).floor() as i32,
            ((p.z + h) / s).floor() as i32,
        )
    }

    /// Chunks are centred on multiples of `CHUNK_SIZE`.
    #[inline]
    pub fn center(self) -> Vec3 {
        let s = CHUNK_SIZE as f32;
        Vec3::new(self.cx as f32 * s, self.cy as f32 * s, self.cz as f32 * s)
    }

    /// World position of the chunk's minimum corner; mesh positions are relative to it.
    #[inline]
    pub fn world_origin(self) -> Vec3 {
        self.center() - Vec3::splat(HALF_CHUNK)
    }

    #[inline]
    pub fn aabb(self) -> Aabb {
        let o = self.world_origin();
        Aabb::new(o, o + Vec3::splat(CHUNK_SIZE as f32))
    }

    /// Chunk bounds grown by the grid padding; the region the density grid samples.
    #[inline]
    pub fn padded_aabb(self) -> Aabb {
        self.aabb().expanded(CHUNK_PADDING)
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.cx, self.cy, self.cz)
    }
}

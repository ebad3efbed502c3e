use hashbrown::HashSet;
use veld_geom::Aabb;

use crate::{CHUNK_PADDING, CHUNK_SIZE, ChunkCoord};

/// Closed-interval test of `bounds` against the padded chunk box.
#[inline]
pub fn overlaps_chunk(bounds: &Aabb, coord: ChunkCoord) -> bool {
    coord.padded_aabb().overlaps(bounds)
}

/// Every chunk whose padded box touches `bounds`.
pub fn chunks_overlapping(bounds: &Aabb) -> HashSet<ChunkCoord> {
    let mut out = HashSet::new();
    if !bounds.min.is_finite() || !bounds.max.is_finite() {
        return out;
    }
    let s = CHUNK_SIZE as f32;
    let h = s * 0.5;
    let lo = |v: f32| ((v - CHUNK_PADDING + h) / s).floor() as i32;
    let hi = |v: f32| ((v + CHUNK_PADDING + h) / s).floor() as i32;
    for cy in lo(bounds.min.y)..=hi(bounds.max.y) {
        for cz in lo(bounds.min.z)..=hi(bounds.max.z) {
            for cx in lo(bounds.min.x)..=hi(bounds.max.x) {
                let c = ChunkCoord::new(cx, cy, cz);
                if overlaps_chunk(bounds, c) {
                    out.insert(c);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_geom::Vec3;

    #[test]
    fn box_inside_one_chunk_touches_only_it() {
        let b = Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        let set = chunks_overlapping(&b);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&ChunkCoord::new(0, 0, 0)));
    }

    #[test]
    fn padding_pulls_in_neighbours() {
        // within one unit of the -x face of chunk 1
        let b = Aabb::new(Vec3::splat(-10.0), Vec3::new(15.5, 10.0, 10.0));
        let set = chunks_overlapping(&b);
        assert!(set.contains(&ChunkCoord::new(1, 0, 0)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn negative_coords_floor_correctly() {
        let b = Aabb::new(Vec3::splat(-30.0), Vec3::splat(-20.0));
        let set = chunks_overlapping(&b);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&ChunkCoord::new(-1, -1, -1)));
    }

    #[test]
    fn non_finite_bounds_touch_nothing() {
        let b = Aabb::new(Vec3::splat(f32::NAN), Vec3::ONE);
        assert!(chunks_overlapping(&b).is_empty());
    }
}

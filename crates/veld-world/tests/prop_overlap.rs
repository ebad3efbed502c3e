use proptest::prelude::*;
use veld_geom::{Aabb, Vec3};
use veld_world::ChunkCoord;
use veld_world::overlap::{chunks_overlapping, overlaps_chunk};

fn arb_bounds() -> impl Strategy<Value = Aabb> {
    (
        -200.0f32..200.0,
        -200.0f32..200.0,
        -200.0f32..200.0,
        0.0f32..80.0,
        0.0f32..80.0,
        0.0f32..80.0,
    )
        .prop_map(|(x, y, z, w, h, d)| {
            Aabb::from_center_size(Vec3::new(x, y, z), Vec3::new(w, h, d))
        })
}

proptest! {
    // The candidate set is exactly the chunks passing the per-chunk test.
    #[test]
    fn candidate_set_matches_brute_force(b in arb_bounds()) {
        let set = chunks_overlapping(&b);
        prop_assert!(!set.is_empty());
        for cx in -10..=10 {
            for cy in -10..=10 {
                for cz in -10..=10 {
                    let c = ChunkCoord::new(cx, cy, cz);
                    prop_assert_eq!(set.contains(&c), overlaps_chunk(&b, c));
                }
            }
        }
    }
}

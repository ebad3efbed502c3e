use proptest::prelude::*;
use veld_geom::Vec3;
use veld_mesh_cpu::{CornerVertex, Triangle, VertexId, weld_and_bucket};

fn arb_corner() -> impl Strategy<Value = CornerVertex> {
    (0u32..6, 0u32..6, -8.0f32..8.0, -8.0f32..8.0, 0.0f32..=1.0).prop_map(|(a, b, x, z, w)| {
        CornerVertex {
            position: Vec3::new(x, 0.0, z),
            normal: Vec3::UP,
            id: VertexId(a.min(b), a.max(b)),
            weight: w,
        }
    })
}

fn arb_triangle() -> impl Strategy<Value = Triangle> {
    (arb_corner(), arb_corner(), arb_corner(), 0u32..4)
        .prop_map(|(a, b, c, biome)| Triangle { corners: [a, b, c], biome })
}

proptest! {
    // Every input triangle is either committed or counted as dropped
    #[test]
    fn weld_accounts_for_every_triangle(
        tris in prop::collection::vec(arb_triangle(), 0..64),
        materials in 1usize..4,
    ) {
        let (mesh, stats) = weld_and_bucket(&tris, materials);
        prop_assert_eq!(stats.triangles_in, tris.len());
        prop_assert_eq!(
            stats.triangles_out + stats.dropped_biome + stats.dropped_degenerate,
            tris.len()
        );
        prop_assert_eq!(mesh.triangle_count(), stats.triangles_out);
        prop_assert_eq!(mesh.submeshes.len(), materials);
        prop_assert_eq!(mesh.normals.len(), mesh.vertex_count());
        prop_assert_eq!(mesh.colors.len(), mesh.vertex_count());
        for t in mesh.triangles() {
            prop_assert!(t.iter().all(|&i| (i as usize) < mesh.vertex_count()));
            prop_assert!(t[0] != t[1] && t[1] != t[2] && t[0] != t[2]);
        }
        if stats.dropped_biome > 0 {
            prop_assert!(stats.max_biome.is_some_and(|b| b as usize >= materials));
        }
    }
}

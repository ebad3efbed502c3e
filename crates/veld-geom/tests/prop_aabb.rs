use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;
use veld_geom::{Aabb, Vec3};

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e4)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_box() -> impl Strategy<Value = Aabb> {
    (arb_vec3(), arb_vec3()).prop_map(|(a, b)| Aabb::new(a.min(b), a.max(b)))
}

proptest! {
    // Overlap is symmetric
    #[test]
    fn overlap_symmetric(a in arb_box(), b in arb_box()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    // A box always overlaps itself and contains its center
    #[test]
    fn overlap_reflexive(a in arb_box()) {
        prop_assert!(a.overlaps(&a));
        prop_assert!(a.contains(a.center()));
    }

    // Points inside the XZ footprint have zero distance
    #[test]
    fn sqr_distance_zero_inside(a in arb_box(), ty in bounded_f32()) {
        let c = a.center();
        prop_assert_eq!(a.sqr_distance_xz(Vec3::new(c.x, ty, c.z)), 0.0);
    }

    // Expanding never loses overlap
    #[test]
    fn expand_preserves_overlap(a in arb_box(), b in arb_box(), by in 0.0f32..10.0) {
        if a.overlaps(&b) {
            prop_assert!(a.expanded(by).overlaps(&b));
        }
    }
}

use proptest::prelude::*;
use veld_chunk::DensityGrid;

proptest! {
    #[test]
    fn idx_roundtrips(x in 0usize..35, y in 0usize..35, z in 0usize..35) {
        let i = DensityGrid::idx(x, y, z);
        prop_assert!(i < DensityGrid::LEN);
        prop_assert_eq!(DensityGrid::unidx(i), (x, y, z));
    }
}

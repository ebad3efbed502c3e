use veld_chunk::{CpuDensityEvaluator, DensityEvaluator, DensityGrid, SENTINEL_DENSITY};
use veld_geom::Vec3;
use veld_world::{ChunkCoord, DensityKind, DensityRegistry, DensitySource, DuneParams};

fn flat(name: &str, center: Vec3, floor_offset: f32, biome: u32) -> DensitySource {
    DensitySource::new(
        name,
        center,
        Vec3::new(128.0, 64.0, 128.0),
        DensityKind::Dune(DuneParams {
            seed: 3,
            noise_weight: 0.0,
            floor_offset,
        }),
    )
    .with_biome(biome)
}

#[test]
fn single_source_fills_below_surface() {
    let mut reg = DensityRegistry::new();
    reg.insert(flat("a", Vec3::ZERO, 0.0, 1));
    let coord = ChunkCoord::new(0, 0, 0);
    let mut grid = DensityGrid::new(coord);
    CpuDensityEvaluator.evaluate(&reg.overlapping(coord), &mut grid);

    // grid y = 16 sits at world y = -1, just below the surface
    assert!(grid.density_at(5, 16, 5) > 0.0);
    assert_eq!(grid.biome_at(5, 16, 5), 1);
    assert!(grid.density_at(5, 20, 5) < 0.0);
}

#[test]
fn max_union_is_order_independent() {
    let low = flat("low", Vec3::ZERO, 0.0, 1);
    let high = flat("high", Vec3::ZERO, 0.1, 2);
    let coord = ChunkCoord::new(0, 0, 0);

    let mut a = DensityGrid::new(coord);
    CpuDensityEvaluator.evaluate_source(&low, &mut a);
    CpuDensityEvaluator.evaluate_source(&high, &mut a);

    let mut b = DensityGrid::new(coord);
    CpuDensityEvaluator.evaluate_source(&high, &mut b);
    CpuDensityEvaluator.evaluate_source(&low, &mut b);

    assert_eq!(a.density, b.density);
    // the higher floor wins wherever it is denser
    assert_eq!(a.biome_at(5, 17, 5), 2);
}

#[test]
fn ties_keep_the_lower_id() {
    let mut reg = DensityRegistry::new();
    reg.insert(flat("first", Vec3::ZERO, 0.0, 4));
    reg.insert(flat("second", Vec3::ZERO, 0.0, 7));
    let coord = ChunkCoord::new(0, 0, 0);
    let mut grid = DensityGrid::new(coord);
    CpuDensityEvaluator.evaluate(&reg.overlapping(coord), &mut grid);
    assert_eq!(grid.biome_at(3, 16, 3), 4);
}

#[test]
fn evaluate_without_sources_leaves_sentinel() {
    let mut grid = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    grid.density[0] = 0.9;
    CpuDensityEvaluator.evaluate(&[], &mut grid);
    assert!(grid.density.iter().all(|d| *d == SENTINEL_DENSITY));
}

#[test]
fn points_outside_the_box_are_untouched() {
    let small = DensitySource::new(
        "small",
        Vec3::new(4.0, 4.0, 4.0),
        Vec3::splat(4.0),
        DensityKind::Dune(DuneParams {
            noise_weight: 0.0,
            ..DuneParams::default()
        }),
    );
    let mut grid = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    CpuDensityEvaluator.evaluate_source(&small, &mut grid);
    assert_eq!(grid.density_at(30, 30, 30), SENTINEL_DENSITY);
    assert_ne!(grid.density_at(21, 20, 21), SENTINEL_DENSITY);
}

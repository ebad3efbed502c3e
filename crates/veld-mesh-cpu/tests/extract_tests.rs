use hashbrown::HashSet;
use veld_chunk::{CpuDensityEvaluator, DensityEvaluator, DensityGrid};
use veld_geom::Vec3;
use veld_mesh_cpu::{
    ExtractError, ExtractParams, MarchingTetrahedra, SurfaceExtractor, TriangleBuffer,
    weld_and_bucket,
};
use veld_world::{ChunkCoord, DensityKind, DensitySource, DuneParams};

/// Density falls linearly with height and crosses zero at `surface_y` (grid-local).
fn layered_grid(surface_y: f32, biome_below: impl Fn(usize, usize) -> u32) -> DensityGrid {
    let mut g = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    let n = DensityGrid::N;
    for y in 0..n {
        for z in 0..n {
            for x in 0..n {
                let p = DensityGrid::local_position(x, y, z);
                let i = DensityGrid::idx(x, y, z);
                g.density[i] = ((surface_y - p.y) / 8.0).clamp(-1.0, 1.0);
                g.biome[i] = biome_below(x, z);
            }
        }
    }
    g
}

fn extract(grid: &DensityGrid) -> TriangleBuffer {
    let mut out = TriangleBuffer::for_chunk();
    MarchingTetrahedra
        .extract(grid, &ExtractParams::default(), &mut out)
        .expect("fits in buffer");
    out
}

#[test]
fn flat_layer_yields_horizontal_upward_surface() {
    let grid = layered_grid(10.5, |_, _| 0);
    let out = extract(&grid);
    assert!(!out.is_empty());
    for tri in out.iter() {
        for c in tri.corners {
            assert!((c.position.y - 10.5).abs() < 1e-4);
            assert!((c.normal - Vec3::UP).length() < 1e-4);
        }
        assert!(tri.face_normal().y > 0.0, "triangle must face out of the solid");
    }
    let area: f32 = out.iter().map(|t| t.area()).sum();
    assert!((area - 32.0 * 32.0).abs() < 1e-2, "area {area}");
}

#[test]
fn empty_and_full_grids_have_no_surface() {
    let air = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    assert!(extract(&air).is_empty());
    let mut solid = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    solid.density.fill(1.0);
    assert!(extract(&solid).is_empty());
}

#[test]
fn corner_ids_weld_into_a_closed_sheet() {
    let grid = layered_grid(7.25, |_, _| 0);
    let out = extract(&grid);
    let (mesh, stats) = weld_and_bucket(out.as_slice(), 1);
    assert_eq!(stats.dropped_degenerate, 0);

    // every id/biome pair appears once in the committed mesh
    let mut seen = HashSet::new();
    for tri in out.iter() {
        for c in tri.corners {
            seen.insert(c.id);
        }
    }
    assert_eq!(seen.len(), mesh.vertex_count());
    assert_eq!(mesh.triangle_count(), out.len());
}

#[test]
fn biome_boundary_blends_weights() {
    let grid = layered_grid(12.5, |x, _| if x < 17 { 0 } else { 1 });
    let out = extract(&grid);
    let (mesh, stats) = weld_and_bucket(out.as_slice(), 2);
    assert_eq!(stats.dropped_biome, 0);
    assert!(!mesh.submeshes[0].is_empty());
    assert!(!mesh.submeshes[1].is_empty());
    let weights: Vec<f32> = mesh.colors.iter().map(|c| c[3]).collect();
    assert!(weights.iter().any(|w| *w == 1.0));
    assert!(weights.iter().any(|w| *w < 1.0));
    assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
}

#[test]
fn overflow_reports_capacity_and_keeps_prefix() {
    let grid = layered_grid(10.5, |_, _| 0);
    let mut out = TriangleBuffer::with_capacity(16);
    let err = MarchingTetrahedra
        .extract(&grid, &ExtractParams::default(), &mut out)
        .unwrap_err();
    assert_eq!(err, ExtractError::CapacityExceeded { capacity: 16 });
    assert_eq!(out.len(), 16);
}

#[test]
fn malformed_grid_is_rejected() {
    let mut grid = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    grid.density.truncate(10);
    let mut out = TriangleBuffer::for_chunk();
    let err = MarchingTetrahedra
        .extract(&grid, &ExtractParams::default(), &mut out)
        .unwrap_err();
    assert!(matches!(err, ExtractError::GridTooSmall { .. }));
}

#[test]
fn dune_source_surface_stays_inside_padded_chunk() {
    let src = DensitySource::new(
        "dunes",
        Vec3::ZERO,
        Vec3::new(256.0, 64.0, 256.0),
        DensityKind::Dune(DuneParams {
            seed: 9,
            noise_weight: 0.3,
            floor_offset: 0.0,
        }),
    );
    let mut grid = DensityGrid::new(ChunkCoord::new(0, 0, 0));
    CpuDensityEvaluator.evaluate_source(&src, &mut grid);
    let out = extract(&grid);
    assert!(!out.is_empty());
    for tri in out.iter() {
        for c in tri.corners {
            for v in c.position.to_array() {
                assert!((-1.0..=33.0).contains(&v));
            }
            assert!((c.normal.length() - 1.0).abs() < 1e-3);
        }
    }
}

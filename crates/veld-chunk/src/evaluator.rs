#[cfg(feature = "parallel_density")]
use rayon::prelude::*;
use veld_geom::Vec3;
use veld_world::field::SourceField;
use veld_world::{DensitySource, SourceId};

use crate::grid::DensityGrid;

/// Fills a chunk grid from the sources overlapping it.
pub trait DensityEvaluator {
    /// Combines one source into `grid`.
    fn evaluate_source(&self, source: &DensitySource, grid: &mut DensityGrid);

    /// Clears `grid` and combines `sources` in ascending id order.
    fn evaluate(&self, sources: &[(SourceId, &DensitySource)], grid: &mut DensityGrid) {
        grid.clear();
        let mut ordered: Vec<_> = sources.to_vec();
        ordered.sort_by_key(|(id, _)| *id);
        for (_, source) in ordered {
            self.evaluate_source(source, grid);
        }
    }
}

/// Evaluates noise fields on the CPU, one Y slice per task when `parallel_density` is on.
///
/// Contributions combine by max: a point takes the source's density and biome only
/// when it is strictly denser than what is already there.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuDensityEvaluator;

impl CpuDensityEvaluator {
    fn fill_slice(
        field: &SourceField,
        grid_origin: Vec3,
        y: usize,
        density: &mut [f32],
        biome: &mut [u32],
        biome_id: u32,
    ) {
        let n = DensityGrid::N;
        for z in 0..n {
            for x in 0..n {
                let p = grid_origin + DensityGrid::local_position(x, y, z);
                let Some(d) = field.sample(p) else {
                    continue;
                };
                let i = z * n + x;
                if d > density[i] {
                    density[i] = d;
                    biome[i] = biome_id;
                }
            }
        }
    }
}

impl DensityEvaluator for CpuDensityEvaluator {
    fn evaluate_source(&self, source: &DensitySource, grid: &mut DensityGrid) {
        let field = SourceField::new(source);
        let origin = grid.coord.world_origin();
        let slice = DensityGrid::N * DensityGrid::N;
        let biome_id = source.biome_id;

        #[cfg(feature = "parallel_density")]
        grid.density
            .par_chunks_mut(slice)
            .zip(grid.biome.par_chunks_mut(slice))
            .enumerate()
            .for_each(|(y, (d, b))| Self::fill_slice(&field, origin, y, d, b, biome_id));

        #[cfg(not(feature = "parallel_density"))]
        grid.density
            .chunks_mut(slice)
            .zip(grid.biome.chunks_mut(slice))
            .enumerate()
            .for_each(|(y, (d, b))| Self::fill_slice(&field, origin, y, d, b, biome_id));
    }
}

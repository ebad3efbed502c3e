use veld_chunk::DensityGrid;
use veld_geom::{Vec3, interpolate_normal, inverse_lerp};

use crate::{
    CornerVertex, ExtractError, ExtractParams, SurfaceExtractor, Triangle, TriangleBuffer,
    VertexId,
};

/// Cube corner offsets; bit 0 is +x, bit 1 is +y, bit 2 is +z.
const CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

/// Kuhn split of the unit cube: one tetrahedron per axis order along the main diagonal.
const TETS: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

/// Reference extractor: marching tetrahedra over the interior cells of the padded grid.
///
/// Cells whose corners lie in `1..=CHUNK_SIZE + 1` are marched, so output
/// positions stay within the chunk's own span and neighbouring chunks meet on
/// shared faces. The outer ring of points only feeds the normals.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarchingTetrahedra;

struct Cell {
    index: [usize; 8],
    density: [f32; 8],
    biome: [u32; 8],
    pos: [Vec3; 8],
}

impl MarchingTetrahedra {
    fn gradient_normal(grid: &DensityGrid, x: usize, y: usize, z: usize) -> Vec3 {
        let n = DensityGrid::N - 1;
        let d = |x: usize, y: usize, z: usize| grid.density_at(x, y, z);
        let (x0, x1) = (x.saturating_sub(1), (x + 1).min(n));
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(n));
        let (z0, z1) = (z.saturating_sub(1), (z + 1).min(n));
        let g = Vec3::new(
            d(x1, y, z) - d(x0, y, z),
            d(x, y1, z) - d(x, y0, z),
            d(x, y, z1) - d(x, y, z0),
        );
        // density grows inward, so the outward normal is the negated gradient
        (-g).normalized()
    }

    fn edge_vertex(
        grid: &DensityGrid,
        cell: &Cell,
        a: usize,
        b: usize,
        threshold: f32,
        weight: f32,
    ) -> CornerVertex {
        let t = inverse_lerp(cell.density[a], cell.density[b], threshold);
        let na = {
            let (x, y, z) = DensityGrid::unidx(cell.index[a]);
            Self::gradient_normal(grid, x, y, z)
        };
        let nb = {
            let (x, y, z) = DensityGrid::unidx(cell.index[b]);
            Self::gradient_normal(grid, x, y, z)
        };
        CornerVertex {
            position: cell.pos[a].lerp(cell.pos[b], t),
            normal: interpolate_normal(na, nb, t),
            id: VertexId::edge(cell.index[a], cell.index[b]),
            weight,
        }
    }

    fn blend_weight(cell: &Cell, biome: u32, blend_gap: f32) -> f32 {
        let same = cell.biome.iter().filter(|b| **b == biome).count();
        let f = same as f32 / 8.0;
        let gap = blend_gap.max(f32::EPSILON);
        // written against 1 - f so a uniform cell lands on exactly 1.0
        (1.0 - (1.0 - f) / gap).clamp(0.0, 1.0)
    }

    fn emit(
        out: &mut TriangleBuffer,
        mut corners: [CornerVertex; 3],
        biome: u32,
        outward: Vec3,
    ) -> Result<(), ExtractError> {
        let tri = Triangle { corners, biome };
        if tri.face_normal().dot(outward) < 0.0 {
            corners.swap(1, 2);
        }
        out.push(Triangle { corners, biome })
    }

    fn march_tet(
        grid: &DensityGrid,
        cell: &Cell,
        tet: &[usize; 4],
        params: &ExtractParams,
        out: &mut TriangleBuffer,
    ) -> Result<(), ExtractError> {
        let mut inside = [0usize; 4];
        let mut outside = [0usize; 4];
        let (mut ni, mut no) = (0, 0);
        for &c in tet {
            if cell.density[c] > params.threshold {
                inside[ni] = c;
                ni += 1;
            } else {
                outside[no] = c;
                no += 1;
            }
        }
        if ni == 0 || no == 0 {
            return Ok(());
        }
        let inside = &inside[..ni];
        let outside = &outside[..no];

        let mut densest = inside[0];
        for &c in inside {
            if cell.density[c] > cell.density[densest] {
                densest = c;
            }
        }
        let biome = cell.biome[densest];
        let weight = Self::blend_weight(cell, biome, params.blend_gap);

        let centroid = |set: &[usize]| {
            let mut s = Vec3::ZERO;
            for &c in set {
                s += cell.pos[c];
            }
            s / set.len() as f32
        };
        let outward = centroid(outside) - centroid(inside);
        let v = |a: usize, b: usize| Self::edge_vertex(grid, cell, a, b, params.threshold, weight);

        match (ni, no) {
            (1, 3) => {
                let i = inside[0];
                let tri = [v(i, outside[0]), v(i, outside[1]), v(i, outside[2])];
                Self::emit(out, tri, biome, outward)
            }
            (3, 1) => {
                let o = outside[0];
                let tri = [v(inside[0], o), v(inside[1], o), v(inside[2], o)];
                Self::emit(out, tri, biome, outward)
            }
            _ => {
                let (a, b) = (inside[0], inside[1]);
                let (c, d) = (outside[0], outside[1]);
                let ac = v(a, c);
                let ad = v(a, d);
                let bc = v(b, c);
                let bd = v(b, d);
                Self::emit(out, [ac, ad, bd], biome, outward)?;
                Self::emit(out, [ac, bd, bc], biome, outward)
            }
        }
    }
}

impl SurfaceExtractor for MarchingTetrahedra {
    fn extract(
        &self,
        grid: &DensityGrid,
        params: &ExtractParams,
        out: &mut TriangleBuffer,
    ) -> Result<(), ExtractError> {
        out.clear();
        if grid.density.len() != DensityGrid::LEN || grid.biome.len() != DensityGrid::LEN {
            return Err(ExtractError::GridTooSmall {
                len: grid.density.len().min(grid.biome.len()),
                expected: DensityGrid::LEN,
            });
        }
        let last = DensityGrid::N - 2;
        for y in 1..last {
            for z in 1..last {
                for x in 1..last {
                    let mut cell = Cell {
                        index: [0; 8],
                        density: [0.0; 8],
                        biome: [0; 8],
                        pos: [Vec3::ZERO; 8],
                    };
                    let mut any_in = false;
                    let mut any_out = false;
                    for (k, (dx, dy, dz)) in CORNERS.iter().enumerate() {
                        let (cx, cy, cz) = (x + dx, y + dy, z + dz);
                        let i = DensityGrid::idx(cx, cy, cz);
                        cell.index[k] = i;
                        cell.density[k] = grid.density[i];
                        cell.biome[k] = grid.biome[i];
                        cell.pos[k] = DensityGrid::local_position(cx, cy, cz);
                        if cell.density[k] > params.threshold {
                            any_in = true;
                        } else {
                            any_out = true;
                        }
                    }
                    if !(any_in && any_out) {
                        continue;
                    }
                    for tet in &TETS {
                        Self::march_tet(grid, &cell, tet, params, out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

use hashbrown::HashMap;
use veld_geom::{Aabb, Vec3};

use crate::{Triangle, VertexId};

/// Committed mesh of one chunk: shared vertices plus one index list per material slot.
#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// `(1, 1, 1, weight)`; the alpha channel carries the material blend weight.
    pub colors: Vec<[f32; 4]>,
    pub submeshes: Vec<Vec<u32>>,
}

impl ChunkMesh {
    pub fn with_materials(material_count: usize) -> Self {
        Self {
            submeshes: vec![Vec::new(); material_count],
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.len() / 3).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// All triangles across submeshes as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.submeshes
            .iter()
            .flat_map(|s| s.chunks_exact(3).map(|t| [t[0], t[1], t[2]]))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeldStats {
    pub triangles_in: usize,
    pub triangles_out: usize,
    /// Triangles whose biome has no material slot.
    pub dropped_biome: usize,
    /// Triangles that collapsed onto fewer than three distinct vertices.
    pub dropped_degenerate: usize,
    pub max_biome: Option<u32>,
}

/// Merges corners sharing `(vertex id, biome)` into one vertex and sorts triangles
/// into per-material index lists.
///
/// A repeated corner moves the vertex to the midpoint of its current position and
/// the new one; its normal is accumulated and renormalised at the end. Triangles
/// whose biome is `>= material_count` are skipped and counted in the stats.
pub fn weld_and_bucket(tris: &[Triangle], material_count: usize) -> (ChunkMesh, WeldStats) {
    let mut mesh = ChunkMesh::with_materials(material_count);
    let mut stats = WeldStats {
        triangles_in: tris.len(),
        ..WeldStats::default()
    };
    let mut lookup: HashMap<(VertexId, u32), u32> = HashMap::with_capacity(tris.len());
    let mut normal_sums: Vec<Vec3> = Vec::new();

    for tri in tris {
        if tri.biome as usize >= material_count {
            stats.dropped_biome += 1;
            stats.max_biome = Some(stats.max_biome.map_or(tri.biome, |m| m.max(tri.biome)));
            continue;
        }
        let keys = tri.corners.map(|c| (c.id, tri.biome));
        if keys[0] == keys[1] || keys[1] == keys[2] || keys[0] == keys[2] {
            // collapsed before welding; its corners must not touch shared vertices
            stats.dropped_degenerate += 1;
            continue;
        }
        let mut idx = [0u32; 3];
        for ((slot, corner), key) in idx.iter_mut().zip(tri.corners.iter()).zip(keys) {
            *slot = match lookup.get(&key) {
                Some(&i) => {
                    let v = i as usize;
                    mesh.positions[v] = (mesh.positions[v] + corner.position) * 0.5;
                    normal_sums[v] += corner.normal;
                    i
                }
                None => {
                    let i = mesh.positions.len() as u32;
                    mesh.positions.push(corner.position);
                    mesh.colors.push([1.0, 1.0, 1.0, corner.weight]);
                    normal_sums.push(corner.normal);
                    lookup.insert(key, i);
                    i
                }
            };
        }
        mesh.submeshes[tri.biome as usize].extend_from_slice(&idx);
        stats.triangles_out += 1;
    }

    mesh.normals = normal_sums.into_iter().map(Vec3::normalized).collect();
    (mesh, stats)
}

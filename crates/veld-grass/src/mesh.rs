use hashbrown::HashMap;
use veld_geom::{Aabb, Vec3, triangle_area};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl MeshVertex {
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshTriangle {
    pub a: MeshVertex,
    pub b: MeshVertex,
    pub c: MeshVertex,
}

impl MeshTriangle {
    #[inline]
    pub const fn new(a: MeshVertex, b: MeshVertex, c: MeshVertex) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn vertices(&self) -> [MeshVertex; 3] {
        [self.a, self.b, self.c]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        triangle_area(self.a.position, self.b.position, self.c.position)
    }
}

/// Positions closer than this collapse into one vertex when indexing a soup.
pub const INDEX_EPSILON: f32 = 0.01;

/// Indexed form of a triangle soup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle(&self, t: usize) -> MeshTriangle {
        let v = |k: usize| {
            let i = self.indices[t * 3 + k] as usize;
            MeshVertex::new(self.positions[i], self.normals[i])
        };
        MeshTriangle::new(v(0), v(1), v(2))
    }

    pub fn triangles(&self) -> impl Iterator<Item = MeshTriangle> + '_ {
        (0..self.triangle_count()).map(|t| self.triangle(t))
    }
}

/// Welds a triangle soup into shared vertices.
///
/// A corner reuses the earliest vertex within [`INDEX_EPSILON`]; the committed normal is
/// the normalized mean of every corner that landed on the vertex.
pub fn index_triangle_list(tris: &[MeshTriangle]) -> IndexedMesh {
    let mut out = IndexedMesh::default();
    let mut counts: Vec<u32> = Vec::new();
    let mut cells: HashMap<(i32, i32, i32), Vec<u32>> = HashMap::new();
    let cell_of = |p: Vec3| {
        (
            (p.x / INDEX_EPSILON).floor() as i32,
            (p.y / INDEX_EPSILON).floor() as i32,
            (p.z / INDEX_EPSILON).floor() as i32,
        )
    };

    for tri in tris {
        for v in tri.vertices() {
            let (cx, cy, cz) = cell_of(v.position);
            let mut existing: Option<u32> = None;
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let Some(bucket) = cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &i in bucket {
                            if existing.is_some_and(|e| e <= i) {
                                continue;
                            }
                            if out.positions[i as usize].distance(v.position) < INDEX_EPSILON {
                                existing = Some(i);
                            }
                        }
                    }
                }
            }
            match existing {
                Some(i) => {
                    out.indices.push(i);
                    out.normals[i as usize] += v.normal;
                    counts[i as usize] += 1;
                }
                None => {
                    let i = out.positions.len() as u32;
                    out.indices.push(i);
                    out.positions.push(v.position);
                    out.normals.push(v.normal);
                    counts.push(1);
                    cells.entry((cx, cy, cz)).or_default().push(i);
                }
            }
        }
    }

    for (n, &c) in out.normals.iter_mut().zip(&counts) {
        *n = (*n / c as f32).normalized();
    }
    out
}

pub fn offset_indices(indices: &mut [u32], offset: u32) {
    for i in indices {
        *i += offset;
    }
}

/// Highest `y` among `positions`, or `0.0` when there are none.
pub fn highest_point(positions: &[Vec3]) -> f32 {
    positions
        .iter()
        .map(|p| p.y)
        .reduce(f32::max)
        .unwrap_or(0.0)
}

/// A mesh that grass can spawn on and/or that blocks grass, in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub spawns_grass: bool,
    pub blocks_grass: bool,
}

impl SourceMesh {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            spawns_grass: true,
            blocks_grass: false,
        }
    }

    /// Builds an unindexed mesh from `(position, normal)` corner triples.
    pub fn from_corners<I>(name: impl Into<String>, corners: I) -> Self
    where
        I: IntoIterator<Item = [(Vec3, Vec3); 3]>,
    {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for tri in corners {
            for (p, n) in tri {
                positions.push(p);
                normals.push(n);
            }
        }
        let indices = (0..positions.len() as u32).collect();
        Self::new(name, positions, normals, indices)
    }

    pub fn spawning(mut self, on: bool) -> Self {
        self.spawns_grass = on;
        self
    }

    pub fn blocking(mut self, on: bool) -> Self {
        self.blocks_grass = on;
        self
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied()).unwrap_or_default()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles with out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = MeshTriangle> + '_ {
        self.indices.chunks_exact(3).filter_map(|t| {
            let v = |i: u32| {
                let i = i as usize;
                Some(MeshVertex::new(
                    *self.positions.get(i)?,
                    self.normals.get(i).copied().unwrap_or(Vec3::UP),
                ))
            };
            Some(MeshTriangle::new(v(t[0])?, v(t[1])?, v(t[2])?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32, z: f32) -> MeshVertex {
        MeshVertex::new(Vec3::new(x, y, z), Vec3::UP)
    }

    #[test]
    fn shared_corners_weld() {
        let quad = [
            MeshTriangle::new(v(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0), v(1.0, 0.0, 0.0)),
            MeshTriangle::new(v(1.0, 0.0, 0.0), v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0)),
        ];
        let m = index_triangle_list(&quad);
        assert_eq!(m.positions.len(), 4);
        assert_eq!(m.indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn near_corners_weld_to_first() {
        let tris = [
            MeshTriangle::new(v(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0), v(1.0, 0.0, 0.0)),
            MeshTriangle::new(v(0.004, 0.0, 0.0), v(5.0, 0.0, 5.0), v(6.0, 0.0, 5.0)),
        ];
        let m = index_triangle_list(&tris);
        assert_eq!(m.indices[3], 0);
        assert_eq!(m.positions[0], Vec3::ZERO);
    }

    #[test]
    fn welded_normals_are_averaged() {
        let a = MeshVertex::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0).normalized());
        let b = MeshVertex::new(Vec3::ZERO, Vec3::new(-1.0, 1.0, 0.0).normalized());
        let tris = [
            MeshTriangle::new(a, v(0.0, 0.0, 1.0), v(1.0, 0.0, 0.0)),
            MeshTriangle::new(b, v(0.0, 0.0, -1.0), v(-1.0, 0.0, 0.0)),
        ];
        let m = index_triangle_list(&tris);
        assert!((m.normals[0] - Vec3::UP).length() < 1e-5);
    }

    #[test]
    fn highest_point_of_empty_is_zero() {
        assert_eq!(highest_point(&[]), 0.0);
        assert_eq!(
            highest_point(&[Vec3::new(0.0, -3.0, 0.0), Vec3::new(0.0, -1.0, 0.0)]),
            -1.0
        );
    }

    #[test]
    fn offsets_shift_every_index() {
        let mut idx = vec![0, 1, 2];
        offset_indices(&mut idx, 10);
        assert_eq!(idx, vec![10, 11, 12]);
    }
}

use veld_geom::{Vec3, angle_between, interpolate_normal};

use crate::mesh::{MeshTriangle, MeshVertex, index_triangle_list};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeParams {
    /// Edges shorter than this collapse.
    pub distance: f32,
    /// Max angle in degrees between the endpoint normals.
    pub angle: f32,
    /// Edge length of the block grid whose lines must not move.
    pub block_size: f32,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            distance: 0.2,
            angle: 3.0,
            block_size: 8.0,
        }
    }
}

/// True when `p` lies within `min_distance` of a block grid line on X or Z.
pub fn near_block_boundary(p: Vec3, block_size: f32, min_distance: f32) -> bool {
    if !(block_size > 0.0) {
        return false;
    }
    let to_line = |v: f32| {
        let r = v.rem_euclid(block_size);
        r.min(block_size - r)
    };
    to_line(p.x) < min_distance || to_line(p.z) < min_distance
}

/// Follows merge redirections to the surviving vertex.
fn resolve(forward: &mut [u32], mut i: u32) -> u32 {
    let mut root = i;
    while forward[root as usize] != root {
        root = forward[root as usize];
    }
    while forward[i as usize] != root {
        let next = forward[i as usize];
        forward[i as usize] = root;
        i = next;
    }
    root
}

/// Collapses short edges whose endpoint normals agree, then drops collapsed triangles.
///
/// Triangles are visited in order and at most one edge per triangle collapses. A triangle
/// whose candidate edge touches a block boundary is left alone so neighbouring blocks
/// keep matching seams.
pub fn merge_edges_by_distance(tris: &[MeshTriangle], params: &MergeParams) -> Vec<MeshTriangle> {
    let mut mesh = index_triangle_list(tris);
    let mut forward: Vec<u32> = (0..mesh.positions.len() as u32).collect();

    for t in 0..mesh.triangle_count() {
        let idx = [
            resolve(&mut forward, mesh.indices[t * 3]),
            resolve(&mut forward, mesh.indices[t * 3 + 1]),
            resolve(&mut forward, mesh.indices[t * 3 + 2]),
        ];
        let close = |i: u32, j: u32| {
            let (i, j) = (i as usize, j as usize);
            mesh.positions[i].distance(mesh.positions[j]) < params.distance
                && angle_between(mesh.normals[i], mesh.normals[j]) < params.angle
        };
        let (keep, drop) = if close(idx[0], idx[1]) {
            (idx[0], idx[1])
        } else if close(idx[1], idx[2]) {
            (idx[1], idx[2])
        } else if close(idx[2], idx[0]) {
            (idx[0], idx[2])
        } else {
            continue;
        };
        let (k, d) = (keep as usize, drop as usize);
        if near_block_boundary(mesh.positions[k], params.block_size, params.distance)
            || near_block_boundary(mesh.positions[d], params.block_size, params.distance)
        {
            continue;
        }
        mesh.positions[k] = (mesh.positions[k] + mesh.positions[d]) * 0.5;
        mesh.normals[k] = interpolate_normal(mesh.normals[k], mesh.normals[d], 0.5);
        if keep != drop {
            forward[d] = keep;
        }
    }

    let mut out = Vec::with_capacity(mesh.triangle_count());
    for t in 0..mesh.triangle_count() {
        let [a, b, c] = [0, 1, 2].map(|k| resolve(&mut forward, mesh.indices[t * 3 + k]));
        if a == b || a == c || b == c {
            continue;
        }
        let v = |i: u32| MeshVertex::new(mesh.positions[i as usize], mesh.normals[i as usize]);
        out.push(MeshTriangle::new(v(a), v(b), v(c)));
    }
    out
}

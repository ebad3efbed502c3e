use veld_geom::interpolate_normal;

use crate::mesh::{MeshTriangle, MeshVertex};

/// Triangles below `SPLIT_RATIO * target_area` are left as they are.
pub const SPLIT_RATIO: f32 = 1.5;

#[inline]
fn midpoint(p: MeshVertex, q: MeshVertex) -> MeshVertex {
    MeshVertex::new(
        (p.position + q.position) * 0.5,
        interpolate_normal(p.normal, q.normal, 0.5),
    )
}

/// One pass: every triangle of at least `SPLIT_RATIO * target_area` is halved at the
/// midpoint of its longest edge.
pub fn subdivide(tris: &[MeshTriangle], target_area: f32) -> Vec<MeshTriangle> {
    let mut out = Vec::with_capacity(tris.len() * 2);
    for t in tris {
        let (a, b, c) = (t.a, t.b, t.c);
        if !(t.area() / target_area >= SPLIT_RATIO) {
            out.push(*t);
            continue;
        }
        let ab = a.position.distance(b.position);
        let bc = b.position.distance(c.position);
        let ca = c.position.distance(a.position);
        if ab > bc && ab > ca {
            let d = midpoint(a, b);
            out.push(MeshTriangle::new(c, a, d));
            out.push(MeshTriangle::new(c, d, b));
        } else if bc > ca {
            let d = midpoint(b, c);
            out.push(MeshTriangle::new(a, b, d));
            out.push(MeshTriangle::new(a, d, c));
        } else {
            let d = midpoint(c, a);
            out.push(MeshTriangle::new(b, c, d));
            out.push(MeshTriangle::new(b, d, a));
        }
    }
    out
}

pub fn subdivide_passes(tris: &[MeshTriangle], target_area: f32, passes: u32) -> Vec<MeshTriangle> {
    let mut cur = tris.to_vec();
    for _ in 0..passes {
        let next = subdivide(&cur, target_area);
        if next.len() == cur.len() {
            break;
        }
        cur = next;
    }
    cur
}

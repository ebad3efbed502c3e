//! Triangle cutting: the best-triangulation rule, the slope clamp and the XZ rectangle clip.

use veld_geom::{RectXZ, Vec3, angle_between, interpolate_normal, inverse_lerp, triangle_area};

use crate::mesh::{MeshTriangle, MeshVertex};

/// Balance of two areas in `[0, 1]`; degenerate pairs score `0`.
#[inline]
fn area_balance(a: f32, b: f32) -> f32 {
    if !(a > 0.0 && b > 0.0) {
        return 0.0;
    }
    let r = a / b;
    if r > 1.0 { 1.0 / r } else { r }
}

/// Splits the quad `a -> b -> bx -> ax` along the diagonal that gives the more even pair.
///
/// Zero-area halves are dropped, so the result holds zero to two triangles.
pub fn best_triangles(
    a: MeshVertex,
    b: MeshVertex,
    ax: MeshVertex,
    bx: MeshVertex,
) -> Vec<MeshTriangle> {
    let balance_a = area_balance(
        triangle_area(a.position, b.position, bx.position),
        triangle_area(a.position, bx.position, ax.position),
    );
    let balance_b = area_balance(
        triangle_area(b.position, ax.position, a.position),
        triangle_area(b.position, bx.position, ax.position),
    );
    let pair = if balance_a > balance_b {
        [MeshTriangle::new(a, b, bx), MeshTriangle::new(a, bx, ax)]
    } else {
        [MeshTriangle::new(a, b, ax), MeshTriangle::new(b, bx, ax)]
    };
    pair.into_iter().filter(|t| t.area() > 0.0).collect()
}

/// Rotates the corners so the odd one out comes last: returns `(p, q, odd)` keeping winding.
#[inline]
fn rotate_to_last(t: &MeshTriangle, odd: [bool; 3]) -> (MeshVertex, MeshVertex, MeshVertex) {
    if odd[0] {
        (t.b, t.c, t.a)
    } else if odd[1] {
        (t.c, t.a, t.b)
    } else {
        (t.a, t.b, t.c)
    }
}

/// Rotates the corners so the odd one out comes first: returns `(odd, p, q)` keeping winding.
#[inline]
fn rotate_to_first(t: &MeshTriangle, odd: [bool; 3]) -> (MeshVertex, MeshVertex, MeshVertex) {
    if odd[0] {
        (t.a, t.b, t.c)
    } else if odd[1] {
        (t.b, t.c, t.a)
    } else {
        (t.c, t.a, t.b)
    }
}

/// Cuts away every part of `tris` steeper than `max_angle` degrees from up.
///
/// Crossing points are found by interpolating the per-vertex slope angle along each edge.
pub fn clamp_normals(tris: &[MeshTriangle], max_angle: f32) -> Vec<MeshTriangle> {
    let angle = |v: &MeshVertex| angle_between(v.normal, Vec3::UP);
    let cut = |keep: MeshVertex, steep: MeshVertex| {
        let t = inverse_lerp(angle(&keep), angle(&steep), max_angle);
        MeshVertex::new(
            keep.position.lerp(steep.position, t),
            interpolate_normal(keep.normal, steep.normal, t),
        )
    };

    let mut out = Vec::with_capacity(tris.len());
    for tri in tris {
        let steep = tri.vertices().map(|v| angle(&v) > max_angle);
        match steep.iter().filter(|s| **s).count() {
            0 => out.push(*tri),
            1 => {
                let (a, b, s) = rotate_to_last(tri, steep);
                out.extend(best_triangles(a, b, cut(a, s), cut(b, s)));
            }
            2 => {
                let flat = steep.map(|s| !s);
                let (a, s1, s2) = rotate_to_first(tri, flat);
                out.push(MeshTriangle::new(a, cut(a, s1), cut(a, s2)));
            }
            _ => {}
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Side {
    const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    #[inline]
    fn outside(self, v: &MeshVertex, r: &RectXZ) -> bool {
        match self {
            Side::Left => v.position.x < r.min_x,
            Side::Right => v.position.x > r.max_x,
            Side::Bottom => v.position.z < r.min_z,
            Side::Top => v.position.z > r.max_z,
        }
    }

    /// Point where the edge `inside -> outside` crosses this side.
    fn cross(self, inside: MeshVertex, outside: MeshVertex, r: &RectXZ) -> MeshVertex {
        let (p, q) = (inside.position, outside.position);
        let t = match self {
            Side::Left => (r.min_x - p.x) / (q.x - p.x),
            Side::Right => (r.max_x - p.x) / (q.x - p.x),
            Side::Bottom => (r.min_z - p.z) / (q.z - p.z),
            Side::Top => (r.max_z - p.z) / (q.z - p.z),
        };
        MeshVertex::new(
            p + (q - p) * t,
            interpolate_normal(inside.normal, outside.normal, t),
        )
    }
}

/// Clips one triangle to the XZ rectangle, one half-plane at a time.
pub fn clamp_triangle(tri: MeshTriangle, rect: &RectXZ) -> Vec<MeshTriangle> {
    let mut tris = vec![tri];
    for side in Side::ALL {
        let mut next = Vec::with_capacity(tris.len() * 2);
        for t in &tris {
            let out = t.vertices().map(|v| side.outside(&v, rect));
            match out.iter().filter(|o| **o).count() {
                0 => next.push(*t),
                1 => {
                    let (a, b, o) = rotate_to_last(t, out);
                    let a_cut = side.cross(a, o, rect);
                    let b_cut = side.cross(b, o, rect);
                    next.extend(best_triangles(a, b, a_cut, b_cut));
                }
                2 => {
                    let inside = out.map(|o| !o);
                    let (a, o1, o2) = rotate_to_first(t, inside);
                    let tri = MeshTriangle::new(a, side.cross(a, o1, rect), side.cross(a, o2, rect));
                    if tri.area() > 0.0 {
                        next.push(tri);
                    }
                }
                _ => {}
            }
        }
        tris = next;
    }
    tris
}

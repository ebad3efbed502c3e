//! Ray queries against blocker meshes and the occlusion clip of the bake.

use veld_geom::{Aabb, Vec3, interpolate_normal};

use crate::clip::best_triangles;
use crate::mesh::{MeshTriangle, MeshVertex, SourceMesh};

/// Default reach of the inside test along a vertex normal.
pub const OCCLUSION_DISTANCE: f32 = 30.0;

const RAY_EPSILON: f32 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Geometric normal of the hit face.
    pub normal: Vec3,
    pub distance: f32,
}

pub trait OcclusionQuery {
    /// Nearest hit along `dir` (need not be normalized) within `max_distance`.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Double-sided triangle mesh collider.
#[derive(Clone, Debug, Default)]
pub struct TriangleCollider {
    triangles: Vec<[Vec3; 3]>,
    bounds: Aabb,
}

impl TriangleCollider {
    pub fn new(triangles: Vec<[Vec3; 3]>) -> Self {
        let bounds = Aabb::from_points(triangles.iter().flatten().copied()).unwrap_or_default();
        Self { triangles, bounds }
    }

    pub fn from_mesh(mesh: &SourceMesh) -> Self {
        Self::new(
            mesh.triangles()
                .map(|t| [t.a.position, t.b.position, t.c.position])
                .collect(),
        )
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Slab test against `b` for `t` in `[0, max_t]`.
fn ray_box(origin: Vec3, dir: Vec3, max_t: f32, b: &Aabb) -> bool {
    let mut t0 = 0.0f32;
    let mut t1 = max_t;
    for (o, d, lo, hi) in [
        (origin.x, dir.x, b.min.x, b.max.x),
        (origin.y, dir.y, b.min.y, b.max.y),
        (origin.z, dir.z, b.min.z, b.max.z),
    ] {
        if d.abs() < 1e-12 {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut near, mut far) = ((lo - o) * inv, (hi - o) * inv);
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        t0 = t0.max(near);
        t1 = t1.min(far);
        if t0 > t1 {
            return false;
        }
    }
    true
}

/// Moller-Trumbore against one triangle; `dir` must be normalized.
fn ray_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t > RAY_EPSILON).then_some(t)
}

impl OcclusionQuery for TriangleCollider {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = dir.normalized();
        if dir.length_sq() == 0.0 || !ray_box(origin, dir, max_distance, &self.bounds) {
            return None;
        }
        let mut best: Option<(f32, &[Vec3; 3])> = None;
        for tri in &self.triangles {
            if let Some(t) = ray_triangle(origin, dir, tri) {
                if t <= max_distance && best.is_none_or(|(bt, _)| t < bt) {
                    best = Some((t, tri));
                }
            }
        }
        best.map(|(t, tri)| RayHit {
            point: origin + dir * t,
            normal: (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalized(),
            distance: t,
        })
    }
}

/// Every blocker of a bake, tagged with the index of the mesh it came from.
#[derive(Clone, Debug, Default)]
pub struct OcclusionScene {
    colliders: Vec<(usize, TriangleCollider)>,
}

impl OcclusionScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the meshes flagged as blockers; tags are their indices in `meshes`.
    pub fn from_meshes(meshes: &[SourceMesh]) -> Self {
        let mut scene = Self::new();
        for (i, m) in meshes.iter().enumerate().filter(|(_, m)| m.blocks_grass) {
            scene.insert(i, TriangleCollider::from_mesh(m));
        }
        scene
    }

    pub fn insert(&mut self, tag: usize, collider: TriangleCollider) {
        self.colliders.push((tag, collider));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// View of the scene with the collider tagged `tag` switched off.
    pub fn excluding(&self, tag: usize) -> Excluding<'_> {
        Excluding {
            scene: self,
            skip: Some(tag),
        }
    }

    fn raycast_filtered(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
        skip: Option<usize>,
    ) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter(|(tag, _)| Some(*tag) != skip)
            .filter_map(|(_, c)| c.raycast(origin, dir, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl OcclusionQuery for OcclusionScene {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        self.raycast_filtered(origin, dir, max_distance, None)
    }
}

pub struct Excluding<'a> {
    scene: &'a OcclusionScene,
    skip: Option<usize>,
}

impl OcclusionQuery for Excluding<'_> {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        self.scene
            .raycast_filtered(origin, dir, max_distance, self.skip)
    }
}

/// A vertex is buried when a ray along its normal leaves a blocker through a face that
/// points the same way.
pub fn is_occluded(v: &MeshVertex, query: &dyn OcclusionQuery, distance: f32) -> bool {
    query
        .raycast(v.position, v.normal, distance)
        .is_some_and(|hit| hit.normal.dot(v.normal) > 0.0)
}

/// Walks from `from` towards `buried` and stops at the first blocker surface.
fn surface_point(from: MeshVertex, buried: MeshVertex, query: &dyn OcclusionQuery) -> MeshVertex {
    let dir = buried.position - from.position;
    let len = dir.length();
    if len == 0.0 {
        return buried;
    }
    match query.raycast(from.position, dir, len) {
        Some(hit) => MeshVertex::new(
            hit.point,
            interpolate_normal(from.normal, buried.normal, hit.distance / len),
        ),
        None => buried,
    }
}

/// Cuts the parts of `tris` that lie inside blockers.
pub fn filter_occluded(
    tris: &[MeshTriangle],
    query: &dyn OcclusionQuery,
    distance: f32,
) -> Vec<MeshTriangle> {
    let mut out = Vec::with_capacity(tris.len());
    for tri in tris {
        let inside = tri.vertices().map(|v| is_occluded(&v, query, distance));
        match inside.iter().filter(|i| **i).count() {
            0 => out.push(*tri),
            1 => {
                let (a, b, buried) = if inside[0] {
                    (tri.b, tri.c, tri.a)
                } else if inside[1] {
                    (tri.c, tri.a, tri.b)
                } else {
                    (tri.a, tri.b, tri.c)
                };
                let a_in = surface_point(a, buried, query);
                let b_in = surface_point(b, buried, query);
                out.extend(best_triangles(a, b, a_in, b_in));
            }
            2 => {
                let (a, b, c) = if !inside[0] {
                    (tri.a, tri.b, tri.c)
                } else if !inside[1] {
                    (tri.b, tri.c, tri.a)
                } else {
                    (tri.c, tri.a, tri.b)
                };
                let t = MeshTriangle::new(
                    a,
                    surface_point(a, b, query),
                    surface_point(a, c, query),
                );
                if t.area() > 0.0 {
                    out.push(t);
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis-aligned box with outward-wound faces.
    fn cube(min: Vec3, max: Vec3) -> TriangleCollider {
        let c = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        let quad = |p: [Vec3; 4]| [[p[0], p[1], p[2]], [p[0], p[2], p[3]]];
        let faces = [
            quad([c(false, true, false), c(false, true, true), c(true, true, true), c(true, true, false)]),
            quad([c(false, false, false), c(true, false, false), c(true, false, true), c(false, false, true)]),
            quad([c(true, false, false), c(true, true, false), c(true, true, true), c(true, false, true)]),
            quad([c(false, false, false), c(false, false, true), c(false, true, true), c(false, true, false)]),
            quad([c(false, false, true), c(true, false, true), c(true, true, true), c(false, true, true)]),
            quad([c(false, false, false), c(false, true, false), c(true, true, false), c(true, false, false)]),
        ];
        TriangleCollider::new(faces.into_iter().flatten().collect())
    }

    fn up(x: f32, z: f32) -> MeshVertex {
        MeshVertex::new(Vec3::new(x, 0.0, z), Vec3::UP)
    }

    #[test]
    fn cube_faces_point_outward() {
        let c = cube(Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = c.raycast(Vec3::new(0.0, 5.0, 0.0), -Vec3::UP, 10.0).unwrap();
        assert!((hit.point.y - 1.0).abs() < 1e-5);
        assert!(hit.normal.y > 0.9);
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn ray_respects_max_distance() {
        let c = cube(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(c.raycast(Vec3::new(0.0, 5.0, 0.0), -Vec3::UP, 3.0).is_none());
    }

    #[test]
    fn vertex_under_rock_is_buried() {
        let rock = cube(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(is_occluded(&up(0.0, 0.0), &rock, OCCLUSION_DISTANCE));
        // Rock hovering above: the ray meets its underside, facing down
        let floating = cube(Vec3::new(-1.0, 2.0, -1.0), Vec3::new(1.0, 4.0, 1.0));
        assert!(!is_occluded(&up(0.0, 0.0), &floating, OCCLUSION_DISTANCE));
    }

    #[test]
    fn fully_buried_triangle_is_dropped() {
        let rock = cube(Vec3::splat(-2.0), Vec3::splat(2.0));
        let t = MeshTriangle::new(up(0.0, 0.0), up(0.0, 1.0), up(1.0, 0.0));
        assert!(filter_occluded(&[t], &rock, OCCLUSION_DISTANCE).is_empty());
    }

    #[test]
    fn partially_buried_triangle_is_trimmed_at_the_wall() {
        let rock = cube(Vec3::new(1.0, -1.0, -5.0), Vec3::new(5.0, 1.0, 5.0));
        // c sits inside the rock, a and b outside
        let t = MeshTriangle::new(up(-2.0, -1.0), up(-2.0, 1.0), up(2.0, 0.0));
        let out = filter_occluded(&[t], &rock, OCCLUSION_DISTANCE);
        assert_eq!(out.len(), 2);
        for tri in &out {
            for v in tri.vertices() {
                assert!(v.position.x <= 1.0 + 1e-4);
            }
        }
    }

    #[test]
    fn excluded_blocker_is_ignored() {
        let mut scene = OcclusionScene::new();
        scene.insert(3, cube(Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert!(is_occluded(&up(0.0, 0.0), &scene, OCCLUSION_DISTANCE));
        assert!(!is_occluded(&up(0.0, 0.0), &scene.excluding(3), OCCLUSION_DISTANCE));
    }
}

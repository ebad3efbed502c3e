use veld_geom::{
    Aabb, Camera, Frustum, RectXZ, Vec3, angle_between, interpolate_normal, inverse_lerp,
    triangle_area,
};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_dot_length_normalized() {
    let v = Vec3::new(3.0, 4.0, 0.0);
    assert!(approx_eq(v.dot(v), 25.0, 1e-6));
    assert!(approx_eq(v.length(), 5.0, 1e-6));

    let n = v.normalized();
    assert!(approx_eq(n.length(), 1.0, 1e-6));
    assert!(vec3_approx_eq(n, Vec3::new(0.6, 0.8, 0.0), 1e-6));

    // Zero vector normalization is a no-op, never NaN
    let zn = Vec3::ZERO.normalized();
    assert!(vec3_approx_eq(zn, Vec3::ZERO, 1e-6));
}

#[test]
fn vec3_cross_basis() {
    let i = Vec3::new(1.0, 0.0, 0.0);
    let j = Vec3::new(0.0, 1.0, 0.0);
    let k = Vec3::new(0.0, 0.0, 1.0);
    assert!(vec3_approx_eq(i.cross(j), k, 1e-6));
    assert!(vec3_approx_eq(j.cross(k), i, 1e-6));
    assert!(vec3_approx_eq(k.cross(i), j, 1e-6));
}

#[test]
fn angle_between_handles_degenerate_inputs() {
    assert!(approx_eq(angle_between(Vec3::UP, Vec3::UP), 0.0, 1e-3));
    assert!(approx_eq(
        angle_between(Vec3::UP, Vec3::new(1.0, 0.0, 0.0)),
        90.0,
        1e-3
    ));
    assert!(approx_eq(angle_between(Vec3::UP, -Vec3::UP), 180.0, 1e-3));
    assert_eq!(angle_between(Vec3::ZERO, Vec3::UP), 0.0);
}

#[test]
fn interpolate_normal_is_unit() {
    let n = interpolate_normal(Vec3::UP, Vec3::new(1.0, 0.0, 0.0), 0.5);
    assert!(approx_eq(n.length(), 1.0, 1e-6));
    assert!(approx_eq(n.x, n.y, 1e-6));
}

#[test]
fn inverse_lerp_clamps_and_guards_equal_ends() {
    assert!(approx_eq(inverse_lerp(10.0, 50.0, 45.0), 0.875, 1e-6));
    assert_eq!(inverse_lerp(10.0, 50.0, 100.0), 1.0);
    assert_eq!(inverse_lerp(3.0, 3.0, 3.0), 0.0);
}

#[test]
fn triangle_area_unit_right_triangle() {
    let a = triangle_area(
        Vec3::ZERO,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    );
    assert!(approx_eq(a, 0.5, 1e-6));
}

#[test]
fn aabb_overlap_is_closed_interval() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let touching = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    let apart = Aabb::new(Vec3::new(1.01, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    assert!(a.overlaps(&touching));
    assert!(touching.overlaps(&a));
    assert!(!a.overlaps(&apart));
}

#[test]
fn aabb_sqr_distance_xz_ignores_height() {
    let b = Aabb::new(Vec3::new(0.0, -5.0, 0.0), Vec3::new(8.0, 5.0, 8.0));
    assert_eq!(b.sqr_distance_xz(Vec3::new(4.0, 100.0, 4.0)), 0.0);
    assert!(approx_eq(b.sqr_distance_xz(Vec3::new(11.0, 0.0, 12.0)), 9.0 + 16.0, 1e-6));
    assert!(approx_eq(b.sqr_distance_xz(Vec3::new(-2.0, 0.0, 4.0)), 4.0, 1e-6));
}

#[test]
fn aabb_from_points_and_raise_top() {
    let mut b = Aabb::from_points([
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-1.0, 5.0, 0.0),
        Vec3::new(0.0, 0.0, 4.0),
    ])
    .unwrap();
    assert!(vec3_approx_eq(b.min, Vec3::new(-1.0, 0.0, 0.0), 1e-6));
    assert!(vec3_approx_eq(b.max, Vec3::new(1.0, 5.0, 4.0), 1e-6));
    b.raise_top(3.0);
    assert_eq!(b.max.y, 5.0);
    b.raise_top(9.0);
    assert_eq!(b.max.y, 9.0);
    assert!(Aabb::from_points(std::iter::empty()).is_none());
}

#[test]
fn rect_overlap_excludes_shared_edges() {
    let a = RectXZ::new(0.0, 0.0, 8.0, 8.0);
    let b = RectXZ::new(8.0, 0.0, 16.0, 8.0);
    let c = RectXZ::new(7.5, 7.5, 9.0, 9.0);
    assert!(!a.overlaps(&b));
    assert!(a.overlaps(&c));
    assert!(a.contains(8.0, 8.0));
}

#[test]
fn frustum_culls_boxes_behind_camera() {
    let cam = Camera::looking_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
    let f = Frustum::from_camera(&cam);
    let ahead = Aabb::from_center_size(Vec3::new(0.0, 0.0, 20.0), Vec3::splat(2.0));
    let behind = Aabb::from_center_size(Vec3::new(0.0, 0.0, -20.0), Vec3::splat(2.0));
    let far_left = Aabb::from_center_size(Vec3::new(500.0, 0.0, 5.0), Vec3::splat(2.0));
    assert!(f.intersects_aabb(&ahead));
    assert!(!f.intersects_aabb(&behind));
    assert!(!f.intersects_aabb(&far_left));
}

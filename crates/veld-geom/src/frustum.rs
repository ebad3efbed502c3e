use crate::{Aabb, Vec3};

/// Plane in Hessian normal form: points with `normal.dot(p) + d >= 0` are in front.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            d: -n.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }
}

/// Perspective camera description used for culling only.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            forward: (target - position).normalized(),
            up: Vec3::UP,
            fov_y: 70.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn right(&self) -> Vec3 {
        let r = self.forward.cross(self.up).normalized();
        if r.length_sq() > 0.0 {
            r
        } else {
            // Looking straight up or down
            self.forward.cross(Vec3::new(0.0, 0.0, 1.0)).normalized()
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_camera(self)
    }
}

/// Six inward-facing planes: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn from_camera(cam: &Camera) -> Self {
        let f = cam.forward.normalized();
        let r = cam.right();
        let u = r.cross(f).normalized();
        let half_v = (cam.fov_y.to_radians() * 0.5).tan();
        let half_h = half_v * cam.aspect;

        // Edge directions of the view pyramid
        let left_dir = f - r * half_h;
        let right_dir = f + r * half_h;
        let bottom_dir = f - u * half_v;
        let top_dir = f + u * half_v;

        let p = cam.position;
        Self {
            planes: [
                Plane::from_point_normal(p, left_dir.cross(u)),
                Plane::from_point_normal(p, u.cross(right_dir)),
                Plane::from_point_normal(p, r.cross(bottom_dir)),
                Plane::from_point_normal(p, top_dir.cross(r)),
                Plane::from_point_normal(p + f * cam.near, f),
                Plane::from_point_normal(p + f * cam.far, -f),
            ],
        }
    }

    /// Conservative box test: `false` only when the box lies fully behind one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let extents = aabb.size() * 0.5;
        for p in &self.planes {
            let r = extents.dot(p.normal.abs());
            if p.signed_distance(center) + r < 0.0 {
                return false;
            }
        }
        true
    }
}

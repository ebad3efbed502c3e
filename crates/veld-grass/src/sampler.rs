use veld_geom::Vec3;

use crate::occlusion::{OcclusionQuery, TriangleCollider};

/// Terrain height under a world XZ position.
pub trait HeightSampler {
    fn sample_height(&self, x: f32, z: f32) -> f32;
}

impl<F: Fn(f32, f32) -> f32> HeightSampler for F {
    #[inline]
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Top surface of a collider; positions outside its footprint read as `0.0`.
impl HeightSampler for TriangleCollider {
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        let b = self.bounds();
        let top = b.max.y + 1.0;
        self.raycast(Vec3::new(x, top, z), -Vec3::UP, top - b.min.y + 1.0)
            .map_or(0.0, |hit| hit.point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_samplers() {
        let s = |x: f32, _z: f32| x * 0.5;
        assert_eq!(s.sample_height(4.0, 0.0), 2.0);
    }

    #[test]
    fn collider_reads_highest_surface() {
        let ramp = TriangleCollider::new(vec![[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 5.0, 0.0),
        ]]);
        assert!((ramp.sample_height(4.0, 1.0) - 2.0).abs() < 1e-4);
        assert_eq!(ramp.sample_height(-5.0, 1.0), 0.0);
    }
}

use serde::Deserialize;

use crate::merge::MergeParams;

/// Bake and streaming parameters.
///
/// `block_size` is the one block edge length shared by the map bake (including the seam
/// guard of edge merging) and the block manager.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrassConfig {
    pub block_size: f32,
    /// Blocks per map side.
    pub blocks: u32,
    /// Degrees from up beyond which no grass grows.
    pub max_grass_angle: f32,
    pub target_tri_area: f32,
    pub subdivide_passes: u32,
    pub merge_distance: f32,
    pub merge_angle: f32,
    pub occlusion_distance: f32,

    pub radius: f32,
    pub view_distance: f32,
    pub distance_fade_out: f32,
    pub camera_culling: bool,
    /// Blades per square unit.
    pub max_density: u32,

    pub grass_height: f32,
    pub grass_width: f32,
    pub random_bend: f32,
    pub random_size: f32,
    pub random_rotation: f32,
    pub wind_scale: f32,
    pub wind_strength: f32,
    pub wind_speed: f32,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            block_size: 8.0,
            blocks: 16,
            max_grass_angle: 45.0,
            target_tri_area: 0.25,
            subdivide_passes: 4,
            merge_distance: 0.2,
            merge_angle: 3.0,
            occlusion_distance: 30.0,
            radius: 32.0,
            view_distance: 40.0,
            distance_fade_out: 0.2,
            camera_culling: true,
            max_density: 64,
            grass_height: 0.5,
            grass_width: 0.2,
            random_bend: 0.2,
            random_size: 0.2,
            random_rotation: 0.2,
            wind_scale: 100.0,
            wind_strength: 1.0,
            wind_speed: 4.0,
        }
    }
}

impl GrassConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.block_size.is_finite() && self.block_size > 0.0) {
            return Err("block_size must be positive");
        }
        if self.blocks == 0 {
            return Err("blocks must be positive");
        }
        if !(0.0..=90.0).contains(&self.max_grass_angle) {
            return Err("max_grass_angle must lie in [0, 90]");
        }
        if !(self.target_tri_area > 0.0) {
            return Err("target_tri_area must be positive");
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err("radius must be positive");
        }
        if self.max_density == 0 {
            return Err("max_density must be positive");
        }
        Ok(())
    }

    pub fn merge_params(&self) -> MergeParams {
        MergeParams {
            distance: self.merge_distance,
            angle: self.merge_angle,
            block_size: self.block_size,
        }
    }

    /// Side length of the square a map covers.
    #[inline]
    pub fn map_extent(&self) -> f32 {
        self.block_size * self.blocks as f32
    }
}

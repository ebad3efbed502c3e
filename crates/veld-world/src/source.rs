use serde::{Deserialize, Serialize};
use veld_geom::{Aabb, Vec3};

/// Shape parameters of a dune-like source: a soft ground plane with low-frequency ripples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuneParams {
    pub seed: i32,
    pub noise_weight: f32,
    /// Surface height inside the box, in box-normalised units (`-0.5..=0.5`).
    pub floor_offset: f32,
}

impl Default for DuneParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            noise_weight: 0.35,
            floor_offset: 0.0,
        }
    }
}

/// Shape parameters of a plateau-like source: a stepped mesa with a solid floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateauParams {
    pub seed: i32,
    pub noise_weight: f32,
    pub floor_offset: f32,
    pub terraces: u32,
    /// 0 keeps the smooth field, 1 snaps fully to the terrace steps.
    pub terrace_weight: f32,
    /// Box-normalised height below which `hard_floor_weight` is added.
    pub hard_floor: f32,
    pub hard_floor_weight: f32,
}

impl Default for PlateauParams {
    fn default() -> Self {
        Self {
            seed: 7331,
            noise_weight: 0.6,
            floor_offset: 0.1,
            terraces: 4,
            terrace_weight: 0.75,
            hard_floor: -0.4,
            hard_floor_weight: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DensityKind {
    Dune(DuneParams),
    Plateau(PlateauParams),
}

impl DensityKind {
    pub fn name(&self) -> &'static str {
        match self {
            DensityKind::Dune(_) => "dune",
            DensityKind::Plateau(_) => "plateau",
        }
    }

    /// RGB color used when drawing or printing the source for diagnostics.
    pub fn debug_color(&self) -> [f32; 3] {
        match self {
            DensityKind::Dune(_) => [0.93, 0.79, 0.47],
            DensityKind::Plateau(_) => [0.62, 0.45, 0.33],
        }
    }

    pub fn seed(&self) -> i32 {
        match self {
            DensityKind::Dune(p) => p.seed,
            DensityKind::Plateau(p) => p.seed,
        }
    }
}

/// A box-shaped volume in world space contributing density to every chunk it overlaps.
#[derive(Clone, Debug, PartialEq)]
pub struct DensitySource {
    pub name: String,
    pub center: Vec3,
    pub scale: Vec3,
    pub biome_id: u32,
    /// Translates the noise domain without moving the box.
    pub sample_offset: Vec3,
    pub kind: DensityKind,
}

impl DensitySource {
    pub fn new(name: impl Into<String>, center: Vec3, scale: Vec3, kind: DensityKind) -> Self {
        Self {
            name: name.into(),
            center,
            scale,
            biome_id: 0,
            sample_offset: Vec3::ZERO,
            kind,
        }
    }

    pub fn with_biome(mut self, biome_id: u32) -> Self {
        self.biome_id = biome_id;
        self
    }

    pub fn with_sample_offset(mut self, offset: Vec3) -> Self {
        self.sample_offset = offset;
        self
    }

    /// World-space box `center ± scale / 2`.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.center, self.scale.abs())
    }
}

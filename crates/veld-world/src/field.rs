//! Point-wise density math for each source kind.
//!
//! A [`SourceField`] is built once per source per density pass (noise state and
//! octave offsets are derived from the seed) and then sampled at every grid point
//! the source covers.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use veld_geom::{Aabb, Vec3};

use crate::source::{DensityKind, DensitySource};

/// World-space distance over which a unit step of the box-normalised height
/// maps to a unit change of density.
pub const FALLOFF: f32 = 8.0;
pub const MIN_DENSITY: f32 = -1.0;
pub const MAX_DENSITY: f32 = 1.0;
const OFFSET_RANGE: f32 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fractal {
    pub octaves: u32,
    /// Frequency of the first octave in cycles per world unit.
    pub scale: f32,
    pub persistence: f32,
    pub lacunarity: f32,
}

pub const DUNE_FRACTAL: Fractal = Fractal {
    octaves: 3,
    scale: 0.03,
    persistence: 0.3,
    lacunarity: 2.0,
};

pub const PLATEAU_FRACTAL: Fractal = Fractal {
    octaves: 5,
    scale: 0.012,
    persistence: 0.5,
    lacunarity: 2.0,
};

pub struct SourceField {
    bounds: Aabb,
    center: Vec3,
    scale: Vec3,
    sample_offset: Vec3,
    kind: DensityKind,
    fractal: Fractal,
    noise: FastNoiseLite,
    octave_offsets: Vec<Vec3>,
}

impl SourceField {
    pub fn new(source: &DensitySource) -> Self {
        let fractal = match source.kind {
            DensityKind::Dune(_) => DUNE_FRACTAL,
            DensityKind::Plateau(_) => PLATEAU_FRACTAL,
        };
        let seed = source.kind.seed();
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        Self {
            bounds: source.bounds(),
            center: source.center,
            scale: source.scale.abs(),
            sample_offset: source.sample_offset,
            kind: source.kind.clone(),
            fractal,
            noise,
            octave_offsets: octave_offsets(seed, fractal.octaves),
        }
    }

    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Density at world position `p`, clamped to `[-1, 1]`.
    /// Returns `None` for points outside the source box.
    pub fn sample(&self, p: Vec3) -> Option<f32> {
        if !self.bounds.contains(p) {
            return None;
        }
        let q = (p - self.center).div_elem(self.scale);
        let n = self.fbm(p + self.sample_offset);
        let d = match &self.kind {
            DensityKind::Dune(params) => {
                (params.floor_offset - q.y) * self.scale.y / FALLOFF + params.noise_weight * n
            }
            DensityKind::Plateau(params) => {
                let mut h =
                    (params.floor_offset - q.y) * self.scale.y / FALLOFF + params.noise_weight * n;
                if params.terraces > 0 {
                    let steps = params.terraces as f32;
                    let stepped = (h * steps).floor() / steps;
                    h += (stepped - h) * params.terrace_weight.clamp(0.0, 1.0);
                }
                if q.y < params.hard_floor {
                    h += params.hard_floor_weight;
                }
                h
            }
        };
        if d.is_finite() {
            Some(d.clamp(MIN_DENSITY, MAX_DENSITY))
        } else {
            Some(MIN_DENSITY)
        }
    }

    fn fbm(&self, p: Vec3) -> f32 {
        let f = &self.fractal;
        let mut amp = 1.0_f32;
        let mut freq = f.scale;
        let mut sum = 0.0_f32;
        let mut max_amp = 0.0_f32;
        for offset in &self.octave_offsets {
            let s = p * freq + *offset;
            sum += self.noise.get_noise_3d(s.x, s.y, s.z) * amp;
            max_amp += amp;
            amp *= f.persistence;
            freq *= f.lacunarity;
        }
        if max_amp > 0.0 { sum / max_amp } else { sum }
    }
}

/// Per-octave domain offsets in `[-1000, 1000]`, stable for a given seed.
pub fn octave_offsets(seed: i32, octaves: u32) -> Vec<Vec3> {
    let mut state = (seed as u32 as u64) ^ 0x9E37_79B9_7F4A_7C15;
    let mut next = || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        let unit = (z >> 40) as f32 / (1u64 << 24) as f32;
        unit * 2.0 * OFFSET_RANGE - OFFSET_RANGE
    };
    (0..octaves.max(1))
        .map(|_| Vec3::new(next(), next(), next()))
        .collect()
}

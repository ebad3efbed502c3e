use serde::Deserialize;
use std::fs;
use std::path::Path;
use veld_geom::Vec3;

use crate::source::{DensityKind, DensitySource, DuneParams, PlateauParams};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "reading terrain config: {}", e),
            ConfigError::Parse(e) => write!(f, "parsing terrain config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid terrain config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_blend_gap")]
    pub blend_gap: f32,
    #[serde(default = "default_chunks_per_update")]
    pub chunks_per_update: usize,
    #[serde(default = "default_materials")]
    pub materials: Vec<String>,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceDef>,
}

fn default_threshold() -> f32 {
    0.0
}
fn default_blend_gap() -> f32 {
    0.2
}
fn default_chunks_per_update() -> usize {
    4
}
fn default_materials() -> Vec<String> {
    vec!["sand".to_string(), "rock".to_string()]
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            blend_gap: default_blend_gap(),
            chunks_per_update: default_chunks_per_update(),
            materials: default_materials(),
            sources: Vec::new(),
        }
    }
}

impl TerrainConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: TerrainConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Invalid("threshold must lie in [-1, 1]"));
        }
        if !(0.001..=1.0).contains(&self.blend_gap) {
            return Err(ConfigError::Invalid("blend_gap must lie in [0.001, 1]"));
        }
        if self.chunks_per_update == 0 {
            return Err(ConfigError::Invalid("chunks_per_update must be positive"));
        }
        if self.materials.is_empty() {
            return Err(ConfigError::Invalid("at least one material is required"));
        }
        for s in &self.sources {
            if s.scale.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(ConfigError::Invalid("source scale must be positive"));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKindName {
    Dune,
    Plateau,
}

/// One `[[source]]` table; unset shape parameters fall back to the kind's defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceDef {
    pub name: String,
    pub kind: SourceKindName,
    #[serde(default)]
    pub center: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub biome_id: u32,
    #[serde(default)]
    pub sample_offset: [f32; 3],
    pub seed: Option<i32>,
    pub noise_weight: Option<f32>,
    pub floor_offset: Option<f32>,
    pub terraces: Option<u32>,
    pub terrace_weight: Option<f32>,
    pub hard_floor: Option<f32>,
    pub hard_floor_weight: Option<f32>,
}

fn default_scale() -> [f32; 3] {
    [64.0, 64.0, 64.0]
}

impl SourceDef {
    pub fn to_source(&self) -> DensitySource {
        let kind = match self.kind {
            SourceKindName::Dune => {
                let d = DuneParams::default();
                DensityKind::Dune(DuneParams {
                    seed: self.seed.unwrap_or(d.seed),
                    noise_weight: self.noise_weight.unwrap_or(d.noise_weight),
                    floor_offset: self.floor_offset.unwrap_or(d.floor_offset),
                })
            }
            SourceKindName::Plateau => {
                let d = PlateauParams::default();
                DensityKind::Plateau(PlateauParams {
                    seed: self.seed.unwrap_or(d.seed),
                    noise_weight: self.noise_weight.unwrap_or(d.noise_weight),
                    floor_offset: self.floor_offset.unwrap_or(d.floor_offset),
                    terraces: self.terraces.unwrap_or(d.terraces),
                    terrace_weight: self.terrace_weight.unwrap_or(d.terrace_weight),
                    hard_floor: self.hard_floor.unwrap_or(d.hard_floor),
                    hard_floor_weight: self.hard_floor_weight.unwrap_or(d.hard_floor_weight),
                })
            }
        };
        DensitySource::new(
            self.name.clone(),
            Vec3::from(self.center),
            Vec3::from(self.scale),
            kind,
        )
        .with_biome(self.biome_id)
        .with_sample_offset(Vec3::from(self.sample_offset))
    }
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, ConfigError> {
    let s = fs::read_to_string(path)?;
    TerrainConfig::from_toml_str(&s)
}

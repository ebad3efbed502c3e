use std::error::Error;
use std::path::Path;

use veld_grass::GrassConfig;
use veld_world::worldgen::{TerrainConfig, load_config_from_path};

pub fn load_terrain(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    let cfg = load_config_from_path(path)?;
    log::info!(
        "terrain config {:?}: {} sources, {} materials",
        path,
        cfg.sources.len(),
        cfg.material_count()
    );
    Ok(cfg)
}

/// Grass settings from `path`; a missing file means the defaults.
pub fn load_grass(path: &Path) -> Result<GrassConfig, Box<dyn Error>> {
    if !path.exists() {
        log::info!("{:?} not found, using default grass settings", path);
        return Ok(GrassConfig::default());
    }
    let s = std::fs::read_to_string(path)?;
    let cfg: GrassConfig = toml::from_str(&s)?;
    cfg.validate()
        .map_err(|msg| format!("invalid grass config {:?}: {}", path, msg))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_fields_default_individually() {
        let cfg: GrassConfig = toml::from_str("radius = 48.0\ncamera_culling = false\n").unwrap();
        assert_eq!(cfg.radius, 48.0);
        assert!(!cfg.camera_culling);
        assert_eq!(cfg.block_size, 8.0);
        assert_eq!(cfg.max_density, 64);
    }

    #[test]
    fn shipped_configs_parse() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let terrain = load_terrain(&crate::assets::world_config_path(root)).unwrap();
        assert!(!terrain.sources.is_empty());
        let grass = load_grass(&crate::assets::grass_config_path(root)).unwrap();
        assert!(grass.validate().is_ok());
    }
}

use veld_world::worldgen::{ConfigError, SourceKindName, TerrainConfig};
use veld_world::{DensityKind, ChunkCoord};

const SAMPLE: &str = r#"
threshold = 0.1
blend_gap = 0.25
chunks_per_update = 2
materials = ["sand", "rock", "grass"]

[[source]]
name = "dunes"
kind = "dune"
center = [0.0, 0.0, 0.0]
scale = [128.0, 48.0, 128.0]
noise_weight = 0.4

[[source]]
name = "mesa"
kind = "plateau"
center = [64.0, 8.0, 0.0]
scale = [40.0, 32.0, 40.0]
biome_id = 1
terraces = 6
"#;

#[test]
fn parses_sources_and_fills_defaults() {
    let cfg = TerrainConfig::from_toml_str(SAMPLE).expect("valid config");
    assert_eq!(cfg.material_count(), 3);
    assert_eq!(cfg.chunks_per_update, 2);
    assert_eq!(cfg.sources.len(), 2);
    assert_eq!(cfg.sources[1].kind, SourceKindName::Plateau);

    let mesa = cfg.sources[1].to_source();
    assert_eq!(mesa.biome_id, 1);
    match mesa.kind {
        DensityKind::Plateau(p) => {
            assert_eq!(p.terraces, 6);
            assert_eq!(p.seed, 7331);
        }
        other => panic!("expected plateau, got {:?}", other),
    }
}

#[test]
fn empty_document_uses_defaults() {
    let cfg = TerrainConfig::from_toml_str("").expect("defaults");
    assert_eq!(cfg.threshold, 0.0);
    assert_eq!(cfg.blend_gap, 0.2);
    assert_eq!(cfg.chunks_per_update, 4);
    assert!(cfg.sources.is_empty());
}

#[test]
fn rejects_out_of_range_values() {
    let err = TerrainConfig::from_toml_str("blend_gap = 0.0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    let err = TerrainConfig::from_toml_str("materials = []").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    let err = TerrainConfig::from_toml_str(
        "[[source]]\nname = \"x\"\nkind = \"dune\"\nscale = [0.0, 1.0, 1.0]\n",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn unknown_kind_is_a_parse_error() {
    let err = TerrainConfig::from_toml_str("[[source]]\nname = \"x\"\nkind = \"canyon\"\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("parsing terrain config"));
}

#[test]
fn chunk_coord_helpers() {
    let c = ChunkCoord::new(1, -1, 0);
    assert_eq!(c.world_origin().to_array(), [16.0, -48.0, -16.0]);
    assert_eq!(c.center().to_array(), [32.0, -32.0, 0.0]);
    assert_eq!(ChunkCoord::containing(c.world_origin()), c);
    assert_eq!(c.offset(-1, 1, 2), ChunkCoord::new(0, 0, 2));
    assert_eq!(c.distance_sq(ChunkCoord::new(0, 0, 0)), 2);
    let t: (i32, i32, i32) = c.into();
    assert_eq!(ChunkCoord::from(t), c);
}

//! Chunk addressing, density sources, and terrain configuration.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod field;
pub mod overlap;
pub mod registry;
pub mod source;
pub mod worldgen;

pub use chunk_coord::ChunkCoord;
pub use registry::{DensityRegistry, SourceId};
pub use source::{DensityKind, DensitySource, DuneParams, PlateauParams};

/// Edge length of a cubic terrain chunk in world units.
pub const CHUNK_SIZE: usize = 32;
/// Grid points per axis: one padding point on each side plus the shared far edge.
pub const NUM_POINTS_PER_AXIS: usize = CHUNK_SIZE + 3;
/// Padding (in world units) around a chunk needed for normal reconstruction.
pub const CHUNK_PADDING: f32 = 1.0;

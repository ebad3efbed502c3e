//! Grass: baking spawnable surfaces into per-block meshes and streaming blade blocks.
#![forbid(unsafe_code)]

pub mod block;
pub mod clip;
mod config;
pub mod generator;
pub mod map;
pub mod merge;
pub mod mesh;
pub mod occlusion;
mod sampler;
pub mod subdivide;

pub use block::{BlockCoord, GrassBlock};
pub use config::GrassConfig;
pub use generator::{FrameStats, GrassGenerator, StreamStats};
pub use map::{BlockEntry, GrassMap, GrassMapArtifact, GrassMapError, bake};
pub use merge::MergeParams;
pub use mesh::{IndexedMesh, MeshTriangle, MeshVertex, SourceMesh};
pub use occlusion::{OcclusionQuery, OcclusionScene, RayHit, TriangleCollider};
pub use sampler::HeightSampler;

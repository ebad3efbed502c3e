//! Baked grass surface of one map: the per-block mesh, its lookup table and the artifact.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use veld_geom::{Aabb, Vec3, angle_between};
use veld_gpu::{BufferDesc, BufferUsage, GpuBuffer, GpuDevice, GpuError, write_slice};

use crate::clip::{clamp_normals, clamp_triangle};
use crate::config::GrassConfig;
use crate::merge::merge_edges_by_distance;
use crate::mesh::{SourceMesh, highest_point, index_triangle_list, offset_indices};
use crate::occlusion::{OcclusionScene, filter_occluded};
use crate::subdivide::subdivide_passes;

/// Height of the box used to gather source meshes for a block.
const GATHER_HEIGHT: f32 = 100.0;

#[derive(Debug)]
pub enum GrassMapError {
    Io(std::io::Error),
    Encode(bincode::Error),
    Decode(bincode::Error),
    /// Nothing to upload: the map holds no grass triangles.
    Empty,
    Gpu(GpuError),
}

impl std::fmt::Display for GrassMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrassMapError::Io(e) => write!(f, "grass map io: {}", e),
            GrassMapError::Encode(e) => write!(f, "encoding grass map: {}", e),
            GrassMapError::Decode(e) => write!(f, "decoding grass map: {}", e),
            GrassMapError::Empty => write!(f, "grass map has no triangles"),
            GrassMapError::Gpu(e) => write!(f, "uploading grass map: {}", e),
        }
    }
}

impl std::error::Error for GrassMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrassMapError::Io(e) => Some(e),
            GrassMapError::Encode(e) | GrassMapError::Decode(e) => Some(e),
            GrassMapError::Gpu(e) => Some(e),
            GrassMapError::Empty => None,
        }
    }
}

impl From<std::io::Error> for GrassMapError {
    fn from(e: std::io::Error) -> Self {
        GrassMapError::Io(e)
    }
}

impl From<GpuError> for GrassMapError {
    fn from(e: GpuError) -> Self {
        GrassMapError::Gpu(e)
    }
}

/// Where a block's triangles live in the map mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Offset into the index array.
    pub start: u32,
    pub count: u32,
    pub max_height: f32,
}

/// Persisted bake output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrassMapArtifact {
    pub name: String,
    pub origin: [f32; 3],
    pub block_size: f32,
    pub blocks: u32,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Indexed by `x + z * blocks`.
    pub table: Vec<BlockEntry>,
}

impl GrassMapArtifact {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GrassMapError> {
        bincode::serialize(self).map_err(GrassMapError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrassMapError> {
        bincode::deserialize(bytes).map_err(GrassMapError::Decode)
    }

    pub fn save(&self, path: &Path) -> Result<(), GrassMapError> {
        let w = BufWriter::new(File::create(path)?);
        bincode::serialize_into(w, self).map_err(GrassMapError::Encode)
    }

    pub fn load(path: &Path) -> Result<Self, GrassMapError> {
        let r = BufReader::new(File::open(path)?);
        bincode::deserialize_from(r).map_err(GrassMapError::Decode)
    }
}

/// Runs the surface pipeline over every block of a map whose minimum corner is `origin`.
///
/// Meshes flagged `spawns_grass` grow grass; meshes flagged `blocks_grass` cut it away,
/// except from their own surface.
pub fn bake(
    name: &str,
    origin: Vec3,
    meshes: &[SourceMesh],
    cfg: &GrassConfig,
) -> GrassMapArtifact {
    let t0 = Instant::now();
    let bs = cfg.block_size;
    let blocks = cfg.blocks as usize;
    let merge = cfg.merge_params();
    let scene = OcclusionScene::from_meshes(meshes);
    let mesh_bounds: Vec<Aabb> = meshes.iter().map(SourceMesh::bounds).collect();

    let mut out = GrassMapArtifact {
        name: name.to_string(),
        origin: origin.to_array(),
        block_size: bs,
        blocks: cfg.blocks,
        table: vec![BlockEntry::default(); blocks * blocks],
        ..Default::default()
    };

    let mut source_tris = 0usize;
    for x in 0..blocks {
        for z in 0..blocks {
            let center = origin + Vec3::new(0.5 + x as f32, 0.0, 0.5 + z as f32) * bs;
            let block_box = Aabb::from_center_size(center, Vec3::new(bs, GATHER_HEIGHT, bs));
            let rect = block_box.rect_xz();

            let spawners: Vec<usize> = (0..meshes.len())
                .filter(|&i| meshes[i].spawns_grass && mesh_bounds[i].overlaps(&block_box))
                .collect();
            if spawners.is_empty() {
                continue;
            }

            let mut block_tris = Vec::new();
            for i in spawners {
                if !mesh_bounds[i].intersects_xz(&block_box) {
                    continue;
                }
                let mut tris = Vec::new();
                for t in meshes[i].triangles() {
                    let too_steep = t
                        .vertices()
                        .iter()
                        .all(|v| angle_between(v.normal, Vec3::UP) > cfg.max_grass_angle);
                    if too_steep {
                        continue;
                    }
                    source_tris += 1;
                    tris.extend(clamp_triangle(t, &rect));
                }
                if tris.is_empty() {
                    continue;
                }
                let tris = clamp_normals(&tris, cfg.max_grass_angle);
                let tris = merge_edges_by_distance(&tris, &merge);
                let tris = subdivide_passes(&tris, cfg.target_tri_area, cfg.subdivide_passes);
                let tris = filter_occluded(&tris, &scene.excluding(i), cfg.occlusion_distance);
                block_tris.extend(tris);
            }

            let mut mesh = index_triangle_list(&block_tris);
            offset_indices(&mut mesh.indices, out.positions.len() as u32);
            out.table[x + z * blocks] = BlockEntry {
                start: out.indices.len() as u32,
                count: mesh.triangle_count() as u32,
                max_height: highest_point(&mesh.positions),
            };
            out.positions.extend(mesh.positions.iter().map(|p| p.to_array()));
            out.normals.extend(mesh.normals.iter().map(|n| n.to_array()));
            out.indices.extend(mesh.indices);
        }
    }

    let extent = cfg.map_extent();
    let (lo, hi) = Aabb::from_points(out.positions.iter().map(|p| Vec3::from(*p)))
        .map_or((origin.y, origin.y), |b| (b.min.y, b.max.y));
    out.bounds_min = [origin.x, lo, origin.z];
    out.bounds_max = [origin.x + extent, hi, origin.z + extent];

    log::info!(
        target: "grass",
        "grass map '{}': mesh contains {} triangles and {} vertices",
        name,
        out.triangle_count(),
        out.positions.len()
    );
    log::debug!(
        target: "perf",
        "ms={:.2} grass_bake blocks={} source_tris={}",
        t0.elapsed().as_secs_f32() * 1000.0,
        blocks * blocks,
        source_tris
    );
    out
}

/// Device copies of a map mesh, bound by the on-mesh point generation pass.
#[derive(Debug)]
pub struct MapBuffers {
    pub triangles: GpuBuffer,
    pub positions: GpuBuffer,
    pub normals: GpuBuffer,
}

/// A baked map plus its optional device buffers.
#[derive(Debug)]
pub struct GrassMap {
    artifact: GrassMapArtifact,
    buffers: Option<MapBuffers>,
}

impl GrassMap {
    pub fn new(artifact: GrassMapArtifact) -> Self {
        Self {
            artifact,
            buffers: None,
        }
    }

    pub fn bake(name: &str, origin: Vec3, meshes: &[SourceMesh], cfg: &GrassConfig) -> Self {
        Self::new(bake(name, origin, meshes, cfg))
    }

    pub fn load(path: &Path) -> Result<Self, GrassMapError> {
        Ok(Self::new(GrassMapArtifact::load(path)?))
    }

    #[inline]
    pub fn artifact(&self) -> &GrassMapArtifact {
        &self.artifact
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        Vec3::from(self.artifact.origin)
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::from(self.artifact.bounds_min),
            Vec3::from(self.artifact.bounds_max),
        )
    }

    #[inline]
    pub fn contains_xz(&self, p: Vec3) -> bool {
        self.bounds().contains_xz(p)
    }

    /// Table slot of the block under `p`, if it lies on the map.
    pub fn block_index(&self, p: Vec3) -> Option<usize> {
        let a = &self.artifact;
        if !(a.block_size > 0.0) {
            return None;
        }
        let local = p - self.origin();
        let x = (local.x / a.block_size).floor();
        let z = (local.z / a.block_size).floor();
        let n = a.blocks as f32;
        if !(x >= 0.0 && x < n && z >= 0.0 && z < n) {
            return None;
        }
        Some(x as usize + z as usize * a.blocks as usize)
    }

    /// Lookup entry of the block under `center`; zeros when the map cannot answer.
    pub fn block_properties(&self, center: Vec3) -> BlockEntry {
        if self.artifact.table.is_empty() {
            log::warn!(target: "grass", "grass map '{}': block table is not baked", self.name());
            return BlockEntry::default();
        }
        let Some(i) = self.block_index(center) else {
            log::warn!(
                target: "grass",
                "grass map '{}': invalid grass block index at ({:.1}, {:.1})",
                self.name(),
                center.x,
                center.z
            );
            return BlockEntry::default();
        };
        match self.artifact.table.get(i) {
            Some(e) => *e,
            None => {
                log::warn!(
                    target: "grass",
                    "grass map '{}': block index {} is larger than the table ({})",
                    self.name(),
                    i,
                    self.artifact.table.len()
                );
                BlockEntry::default()
            }
        }
    }

    #[inline]
    pub fn buffers(&self) -> Option<&MapBuffers> {
        self.buffers.as_ref()
    }

    #[inline]
    pub fn buffers_initialized(&self) -> bool {
        self.buffers.is_some()
    }

    /// Uploads the mesh; a no-op when already resident.
    pub fn init_buffers(&mut self, device: &mut dyn GpuDevice) -> Result<(), GrassMapError> {
        if self.buffers.is_some() {
            return Ok(());
        }
        let a = &self.artifact;
        if a.indices.is_empty() || a.positions.is_empty() {
            return Err(GrassMapError::Empty);
        }
        let make = |device: &mut dyn GpuDevice, what: &str, count: usize, stride: usize| {
            device.create_buffer(BufferDesc::new(
                format!("grass map '{}' {}", a.name, what),
                count,
                stride,
                BufferUsage::Structured,
            ))
        };
        let buffers = MapBuffers {
            triangles: make(device, "triangles", a.indices.len(), 4),
            positions: make(device, "positions", a.positions.len(), 12),
            normals: make(device, "normals", a.normals.len(), 12),
        };
        if let Err(e) = upload(device, &buffers, a) {
            release_map_buffers(buffers, device);
            return Err(e.into());
        }
        self.buffers = Some(buffers);
        Ok(())
    }

    pub fn release_buffers(&mut self, device: &mut dyn GpuDevice) {
        if let Some(b) = self.buffers.take() {
            release_map_buffers(b, device);
        }
    }
}

fn upload(
    device: &mut dyn GpuDevice,
    b: &MapBuffers,
    a: &GrassMapArtifact,
) -> Result<(), GpuError> {
    write_slice(device, &b.triangles, &a.indices)?;
    write_slice(device, &b.positions, &a.positions)?;
    write_slice(device, &b.normals, &a.normals)
}

fn release_map_buffers(b: MapBuffers, device: &mut dyn GpuDevice) {
    device.release(b.triangles);
    device.release(b.positions);
    device.release(b.normals);
}

use veld_chunk::DensityGrid;
use veld_geom::Vec3;
use veld_gpu::{BufferDesc, BufferUsage, GpuBuffer, GpuDevice, GpuError, write_slice};
use veld_mesh_cpu::ChunkMesh;
use veld_world::ChunkCoord;

/// Bytes per grid point in the points buffer: `[x, y, z, density]`.
pub const POINT_STRIDE: usize = 16;
/// Bytes per grid point in the biomes buffer.
pub const BIOME_STRIDE: usize = 4;

/// Device-side copy of a chunk's density grid.
#[derive(Debug)]
pub struct ChunkBuffers {
    pub points: GpuBuffer,
    pub biomes: GpuBuffer,
}

impl ChunkBuffers {
    pub fn allocate(device: &mut dyn GpuDevice, coord: ChunkCoord) -> Self {
        let n = DensityGrid::LEN;
        Self {
            points: device.create_buffer(BufferDesc::new(
                format!("chunk {} points", coord),
                n,
                POINT_STRIDE,
                BufferUsage::Structured,
            )),
            biomes: device.create_buffer(BufferDesc::new(
                format!("chunk {} biomes", coord),
                n,
                BIOME_STRIDE,
                BufferUsage::Structured,
            )),
        }
    }

    pub fn upload(&self, device: &mut dyn GpuDevice, grid: &DensityGrid) -> Result<(), GpuError> {
        write_slice(device, &self.points, &grid.points())?;
        write_slice(device, &self.biomes, &grid.biome)
    }

    pub fn release(self, device: &mut dyn GpuDevice) {
        device.release(self.points);
        device.release(self.biomes);
    }
}

/// Triangle mesh handed to the physics side; only present when the chunk has vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

#[derive(Debug)]
pub struct TerrainChunk {
    pub coord: ChunkCoord,
    pub grid: DensityGrid,
    pub mesh: ChunkMesh,
    pub collision: Option<CollisionMesh>,
    pub buffers: Option<ChunkBuffers>,
    /// Number of completed density/mesh passes.
    pub revision: u64,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, material_count: usize, buffers: Option<ChunkBuffers>) -> Self {
        Self {
            coord,
            grid: DensityGrid::new(coord),
            mesh: ChunkMesh::with_materials(material_count),
            collision: None,
            buffers,
            revision: 0,
        }
    }

    /// World position the chunk-local mesh is placed at.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.coord.world_origin()
    }

    pub fn commit_mesh(&mut self, mesh: ChunkMesh) {
        self.collision = if mesh.vertex_count() > 0 {
            Some(CollisionMesh {
                positions: mesh.positions.clone(),
                indices: mesh.triangles().flatten().collect(),
            })
        } else {
            None
        };
        self.mesh = mesh;
        self.revision += 1;
    }

    /// Triangles in world space as `(position, normal)` corners.
    pub fn world_triangles(&self) -> impl Iterator<Item = [(Vec3, Vec3); 3]> + '_ {
        let o = self.origin();
        let m = &self.mesh;
        m.triangles().map(move |t| {
            t.map(|i| {
                let i = i as usize;
                (m.positions[i] + o, m.normals[i])
            })
        })
    }

    /// Gives the device buffers back; must run before the chunk leaves the store.
    pub fn release(&mut self, device: Option<&mut (dyn GpuDevice + '_)>) {
        if let Some(buffers) = self.buffers.take() {
            match device {
                Some(d) => buffers.release(d),
                None => log::error!(
                    target: "terrain",
                    "chunk {} owns gpu buffers but no device is attached",
                    self.coord
                ),
            }
        }
    }
}

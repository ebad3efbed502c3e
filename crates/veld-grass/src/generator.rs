use std::time::Instant;

use hashbrown::HashMap;
use veld_geom::{Aabb, Camera, Vec3};
use veld_gpu::{
    BufferDesc, BufferUsage, ComputePass, DrawArgs, DrawIndirect, GpuBuffer, GpuDevice, PassParam,
    write_slice,
};

use crate::block::{
    BlockCoord, DRAW_STRIDE, GROUP_THREADS, GrassBlock, SOURCE_VERTEX_STRIDE, fit_to_terrain,
    source_vertex_capacity,
};
use crate::config::GrassConfig;
use crate::map::GrassMap;
use crate::sampler::HeightSampler;

/// Height of the box the indirect draw is culled with.
const RENDER_HEIGHT: f32 = 100.0;

/// Capacity of the shared blade buffer for a streaming radius.
pub fn max_draw_triangles(radius: f32, max_density: u32) -> usize {
    let area = radius * radius * std::f32::consts::PI;
    (2.0 * area * max_density as f32) as usize * 2
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub created: usize,
    pub removed: usize,
    /// Blocks inside the radius that no map covers.
    pub uncovered: usize,
    pub live: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub live: usize,
    pub visible: usize,
    pub dispatches: usize,
}

/// Streams grass blocks around a reference point and records their blade passes.
pub struct GrassGenerator {
    cfg: GrassConfig,
    maps: Vec<GrassMap>,
    blocks: HashMap<BlockCoord, GrassBlock>,
    draw_triangles: GpuBuffer,
    draw_args: GpuBuffer,
    max_draw_triangles: usize,
    dispatch_groups: u32,
    render_bounds: Aabb,
}

impl GrassGenerator {
    pub fn new(cfg: GrassConfig, mut maps: Vec<GrassMap>, device: &mut dyn GpuDevice) -> Self {
        for map in &mut maps {
            if let Err(e) = map.init_buffers(device) {
                log::warn!(
                    target: "grass",
                    "grass map '{}': {}, skipping buffer generation",
                    map.name(),
                    e
                );
            }
        }
        let max_draw = max_draw_triangles(cfg.radius, cfg.max_density);
        log::info!(target: "grass", "max draw triangles: {}", max_draw);
        let draw_triangles = device.create_buffer(BufferDesc::new(
            "grass draw triangles",
            max_draw,
            DRAW_STRIDE,
            BufferUsage::Append,
        ));
        device.set_counter(&draw_triangles, 0);
        let draw_args = device.create_buffer(BufferDesc::new(
            "grass draw args",
            1,
            std::mem::size_of::<DrawArgs>(),
            BufferUsage::IndirectArgs,
        ));
        Self {
            dispatch_groups: (max_draw as u32).div_ceil(GROUP_THREADS),
            max_draw_triangles: max_draw,
            render_bounds: Aabb::default(),
            blocks: HashMap::new(),
            draw_triangles,
            draw_args,
            maps,
            cfg,
        }
    }

    #[inline]
    pub fn config(&self) -> &GrassConfig {
        &self.cfg
    }

    #[inline]
    pub fn maps(&self) -> &[GrassMap] {
        &self.maps
    }

    #[inline]
    pub fn block(&self, coord: BlockCoord) -> Option<&GrassBlock> {
        self.blocks.get(&coord)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &GrassBlock> {
        self.blocks.values()
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn max_draw_triangles(&self) -> usize {
        self.max_draw_triangles
    }

    /// Indirect args of the shared blade draw.
    #[inline]
    pub fn draw_args(&self) -> &GpuBuffer {
        &self.draw_args
    }

    #[inline]
    pub fn render_bounds(&self) -> Aabb {
        self.render_bounds
    }

    /// Inclusive block index range touched by the streaming square around `p`.
    fn index_range(&self, p: Vec3) -> (BlockCoord, BlockCoord) {
        let r = Vec3::new(self.cfg.radius, 0.0, self.cfg.radius);
        (
            BlockCoord::containing(p - r, self.cfg.block_size),
            BlockCoord::containing(p + r, self.cfg.block_size),
        )
    }

    /// Drops blocks that left the radius around `reference` and creates the ones that entered.
    pub fn update(
        &mut self,
        reference: Vec3,
        heights: &dyn HeightSampler,
        device: &mut dyn GpuDevice,
    ) -> StreamStats {
        let t0 = Instant::now();
        let sqr_radius = self.cfg.radius * self.cfg.radius;
        let mut stats = StreamStats::default();

        let mut leaving: Vec<BlockCoord> = self
            .blocks
            .iter()
            .filter(|(_, b)| b.bounds().sqr_distance_xz(reference) > sqr_radius)
            .map(|(c, _)| *c)
            .collect();
        leaving.sort();
        for coord in leaving {
            if let Some(block) = self.blocks.remove(&coord) {
                block.release(device);
                stats.removed += 1;
            }
        }

        let (lo, hi) = self.index_range(reference);
        for x in lo.x..=hi.x {
            for z in lo.z..=hi.z {
                let coord = BlockCoord::new(x, z);
                if self.blocks.contains_key(&coord) {
                    continue;
                }
                let bounds = coord.base_bounds(self.cfg.block_size);
                if bounds.sqr_distance_xz(reference) > sqr_radius {
                    continue;
                }
                if self.create_block(coord, bounds, heights, device) {
                    stats.created += 1;
                } else {
                    stats.uncovered += 1;
                }
            }
        }

        self.render_bounds = Aabb::from_center_size(
            reference,
            Vec3::new(2.0 * self.cfg.radius, RENDER_HEIGHT, 2.0 * self.cfg.radius),
        );
        stats.live = self.blocks.len();
        log::debug!(
            target: "perf",
            "ms={:.2} grass_stream created={} removed={} live={}",
            t0.elapsed().as_secs_f32() * 1000.0,
            stats.created,
            stats.removed,
            stats.live
        );
        stats
    }

    /// Creates the block at `coord` on the first map covering its centre.
    fn create_block(
        &mut self,
        coord: BlockCoord,
        bounds: Aabb,
        heights: &dyn HeightSampler,
        device: &mut dyn GpuDevice,
    ) -> bool {
        let Some(map) = self.maps.iter().find(|m| m.contains_xz(bounds.center())) else {
            return false;
        };
        let cfg = &self.cfg;
        let mut bounds = fit_to_terrain(bounds, heights);

        let capacity = source_vertex_capacity(cfg.block_size, cfg.max_density);
        let source_vertices = device.create_buffer(BufferDesc::new(
            format!("grass block {} source vertices", coord),
            capacity,
            SOURCE_VERTEX_STRIDE,
            BufferUsage::Append,
        ));
        device.set_counter(&source_vertices, 0);
        let info = device.create_buffer(BufferDesc::new(
            format!("grass block {} info", coord),
            1,
            4,
            BufferUsage::Counter,
        ));
        if let Err(e) = write_slice(device, &info, &[0u32]) {
            log::error!(target: "grass", "grass block {}: resetting info buffer: {}", coord, e);
        }

        device.dispatch(
            ComputePass::new("generate_points", [1, 1, 1])
                .buffer("_SourceVertices", &source_vertices)
                .buffer("_InfoBuffer", &info)
                .param("_BlockPosition", PassParam::Vec3(coord.position(cfg.block_size).to_array()))
                .param("_BlockID", PassParam::Int(coord.x + cfg.blocks as i32 * coord.z))
                .param("_TerrainPosition", PassParam::Vec3(map.origin().to_array())),
        );

        let entry = map.block_properties(bounds.center());
        let mut mesh_triangles = 0;
        if let Some(mb) = map.buffers().filter(|_| entry.count > 0) {
            bounds.raise_top(entry.max_height + 0.5);
            device.dispatch(
                ComputePass::new(
                    "generate_points_on_mesh",
                    [entry.count.div_ceil(GROUP_THREADS), 1, 1],
                )
                .buffer("_SourceVertices", &source_vertices)
                .buffer("_InfoBuffer", &info)
                .buffer("_Triangles", &mb.triangles)
                .buffer("_Positions", &mb.positions)
                .buffer("_Normals", &mb.normals)
                .param("_StartIndex", PassParam::Int(entry.start as i32))
                .param("_TriangleCount", PassParam::Int(entry.count as i32)),
            );
            mesh_triangles = entry.count;
        }

        log::trace!(
            target: "grass",
            "grass block {} created on '{}' ({} mesh triangles)",
            coord,
            map.name(),
            mesh_triangles
        );
        let mut block = GrassBlock::new(coord, bounds, source_vertices, info);
        block.mesh_triangles = mesh_triangles;
        self.blocks.insert(coord, block);
        true
    }

    /// Resets the shared buffers, runs the blade pass per visible block and issues the draw.
    ///
    /// Without a camera every live block counts as visible.
    pub fn render(
        &mut self,
        camera: Option<&Camera>,
        reference: Vec3,
        time: f32,
        device: &mut dyn GpuDevice,
    ) -> FrameStats {
        if let Err(e) = write_slice(device, &self.draw_args, &[DrawArgs::RESET]) {
            log::error!(target: "grass", "resetting grass draw args: {}", e);
        }
        device.set_counter(&self.draw_triangles, 0);

        let frustum = camera
            .filter(|_| self.cfg.camera_culling)
            .map(Camera::frustum);
        let camera_pos = camera.map_or(reference, |c| c.position);
        let cfg = &self.cfg;

        let mut coords: Vec<BlockCoord> = self.blocks.keys().copied().collect();
        coords.sort();
        let mut stats = FrameStats {
            live: coords.len(),
            ..Default::default()
        };
        for coord in coords {
            let Some(block) = self.blocks.get_mut(&coord) else {
                continue;
            };
            block.visible = frustum
                .as_ref()
                .is_none_or(|f| f.intersects_aabb(&block.bounds()));
            if !block.visible {
                continue;
            }
            stats.visible += 1;
            device.dispatch(
                ComputePass::new("grass_blades", [self.dispatch_groups, 1, 1])
                    .buffer("_SourceVertices", block.source_vertices())
                    .buffer("_InfoBuffer", block.info())
                    .buffer("_DrawTriangles", &self.draw_triangles)
                    .buffer("_IndirectArgsBuffer", &self.draw_args)
                    .param("_MaxGrassBlades", PassParam::Int(self.max_draw_triangles as i32))
                    .param("_CameraPos", PassParam::Vec3(camera_pos.to_array()))
                    .param("_PlayerPos", PassParam::Vec3(reference.to_array()))
                    .param("_ViewDistance", PassParam::Float(cfg.view_distance))
                    .param("_DistanceFadeOut", PassParam::Float(cfg.distance_fade_out))
                    .param("_RandomRotation", PassParam::Float(cfg.random_rotation))
                    .param("_GrassHeight", PassParam::Float(cfg.grass_height))
                    .param("_GrassWidth", PassParam::Float(cfg.grass_width))
                    .param("_RandomSize", PassParam::Float(cfg.random_size))
                    .param("_RandomBend", PassParam::Float(cfg.random_bend))
                    .param("_WindStrength", PassParam::Float(cfg.wind_strength))
                    .param("_WindScale", PassParam::Float(cfg.wind_scale))
                    .param("_WindSpeed", PassParam::Float(cfg.wind_speed))
                    .param("_Time", PassParam::Float(time)),
            );
            stats.dispatches += 1;
        }

        device.draw_indirect(DrawIndirect {
            args: self.draw_args.id(),
            instances: self.draw_triangles.id(),
            bounds_min: self.render_bounds.min.to_array(),
            bounds_max: self.render_bounds.max.to_array(),
        });
        stats
    }

    /// Releases every block, the shared draw buffers and the map buffers.
    pub fn shutdown(mut self, device: &mut dyn GpuDevice) {
        let n = self.blocks.len();
        for (_, block) in self.blocks.drain() {
            block.release(device);
        }
        for map in &mut self.maps {
            map.release_buffers(device);
        }
        device.release(self.draw_triangles);
        device.release(self.draw_args);
        log::debug!(target: "grass", "grass generator shut down, released {} blocks", n);
    }
}

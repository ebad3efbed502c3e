//! Terrain chunk store: invalidation, rate-limited regeneration, and teardown.
#![forbid(unsafe_code)]

mod chunk;
mod dirty_queue;

pub use chunk::{BIOME_STRIDE, ChunkBuffers, CollisionMesh, POINT_STRIDE, TerrainChunk};
pub use dirty_queue::UniqueQueue;

use std::time::Instant;

use hashbrown::HashMap;
use veld_chunk::DensityEvaluator;
use veld_gpu::GpuDevice;
use veld_mesh_cpu::{
    ExtractError, ExtractParams, SurfaceExtractor, TriangleBuffer, weld_and_bucket,
};
use veld_world::worldgen::TerrainConfig;
use veld_world::{ChunkCoord, DensityRegistry, DensitySource, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    MissingEvaluator,
    MissingExtractor,
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::MissingEvaluator => write!(f, "no density evaluator configured"),
            GenerateError::MissingExtractor => write!(f, "no surface extractor configured"),
        }
    }
}

impl std::error::Error for GenerateError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratorSettings {
    pub extract: ExtractParams,
    pub chunks_per_update: usize,
    pub material_count: usize,
}

impl GeneratorSettings {
    pub fn from_config(cfg: &TerrainConfig) -> Self {
        Self {
            extract: ExtractParams {
                threshold: cfg.threshold,
                blend_gap: cfg.blend_gap,
            },
            chunks_per_update: cfg.chunks_per_update.max(1),
            material_count: cfg.material_count(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from_config(&TerrainConfig::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    Meshed { vertices: usize, triangles: usize },
    Destroyed,
    /// No source overlaps and no chunk existed.
    Untouched,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub invalidated_sources: usize,
    pub processed: usize,
    pub meshed: usize,
    pub destroyed: usize,
    pub skipped: usize,
    pub queue_len: usize,
    pub live_chunks: usize,
}

impl TickStats {
    fn accumulate(&mut self, other: TickStats) {
        self.invalidated_sources += other.invalidated_sources;
        self.processed += other.processed;
        self.meshed += other.meshed;
        self.destroyed += other.destroyed;
        self.skipped += other.skipped;
        self.queue_len = other.queue_len;
        self.live_chunks = other.live_chunks;
    }
}

/// Owns the density sources, the chunk store, and the dirty queue.
///
/// Sources only publish invalidation (through the registry's change flags); chunk
/// data is touched exclusively by [`TerrainGenerator::tick`].
pub struct TerrainGenerator {
    settings: GeneratorSettings,
    registry: DensityRegistry,
    chunks: HashMap<ChunkCoord, TerrainChunk>,
    queue: UniqueQueue<ChunkCoord>,
    evaluator: Option<Box<dyn DensityEvaluator>>,
    extractor: Option<Box<dyn SurfaceExtractor>>,
    device: Option<Box<dyn GpuDevice>>,
    scratch: TriangleBuffer,
}

impl TerrainGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            registry: DensityRegistry::new(),
            chunks: HashMap::new(),
            queue: UniqueQueue::new(),
            evaluator: None,
            extractor: None,
            device: None,
            scratch: TriangleBuffer::for_chunk(),
        }
    }

    /// Generator with the CPU evaluator and the reference extractor.
    pub fn with_cpu_pipeline(settings: GeneratorSettings) -> Self {
        let mut g = Self::new(settings);
        g.set_evaluator(Box::new(veld_chunk::CpuDensityEvaluator));
        g.set_extractor(Box::new(veld_mesh_cpu::MarchingTetrahedra));
        g
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn DensityEvaluator>) {
        self.evaluator = Some(evaluator);
    }

    pub fn set_extractor(&mut self, extractor: Box<dyn SurfaceExtractor>) {
        self.extractor = Some(extractor);
    }

    /// Attaches a device. Chunks created from now on mirror their grid into it.
    pub fn attach_device(&mut self, device: Box<dyn GpuDevice>) {
        if self.device.is_some() {
            log::warn!(target: "terrain", "replacing attached gpu device");
            self.delete_world();
        }
        self.device = Some(device);
    }

    pub fn device(&self) -> Option<&dyn GpuDevice> {
        self.device.as_deref()
    }

    #[inline]
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// New extraction settings apply on the next rebuild. Every source is re-invalidated
    /// only when the settings differ from the current ones.
    pub fn set_settings(&mut self, settings: GeneratorSettings) -> bool {
        if settings == self.settings {
            return false;
        }
        self.settings = settings;
        self.registry.request_rebuild_all();
        true
    }

    #[inline]
    pub fn registry(&self) -> &DensityRegistry {
        &self.registry
    }

    pub fn add_source(&mut self, source: DensitySource) -> SourceId {
        self.registry.insert(source)
    }

    /// Mutable access to a source; the edit invalidates it for the next tick.
    pub fn edit_source(&mut self, id: SourceId) -> Option<&mut DensitySource> {
        self.registry.edit(id)
    }

    pub fn request_rebuild(&mut self, id: SourceId) -> bool {
        self.registry.request_rebuild(id)
    }

    /// Removes a source and queues every chunk it last overlapped.
    pub fn remove_source(&mut self, id: SourceId) -> Option<DensitySource> {
        let (source, last) = self.registry.remove(id)?;
        let mut last: Vec<ChunkCoord> = last.into_iter().collect();
        last.sort();
        self.queue.extend(last);
        Some(source)
    }

    pub fn set_source_enabled(&mut self, id: SourceId, enabled: bool) {
        let flushed = self.registry.set_enabled(id, enabled);
        self.queue.extend(flushed);
    }

    /// Replaces the source set by name: changed definitions are edited in place,
    /// unknown names are added, and names no longer present are removed.
    pub fn sync_sources(&mut self, sources: Vec<DensitySource>) -> usize {
        let mut touched = 0;
        let wanted: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
        for src in sources {
            match self.registry.find_by_name(&src.name) {
                Some(id) => {
                    if self.registry.get(id) != Some(&src) {
                        if let Some(slot) = self.registry.edit(id) {
                            *slot = src;
                            touched += 1;
                        }
                    }
                }
                None => {
                    self.registry.insert(src);
                    touched += 1;
                }
            }
        }
        let stale: Vec<SourceId> = self
            .registry
            .ids()
            .filter(|id| {
                self.registry
                    .get(*id)
                    .is_some_and(|s| !wanted.contains(&s.name))
            })
            .collect();
        for id in stale {
            self.remove_source(id);
            touched += 1;
        }
        touched
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn queue(&self) -> &UniqueQueue<ChunkCoord> {
        &self.queue
    }

    pub fn enqueue(&mut self, coord: ChunkCoord) {
        self.queue.enqueue(coord);
    }

    /// Queues the previous and current overlap of every enabled source.
    pub fn generate_world(&mut self) {
        let ids: Vec<SourceId> = self.registry.enabled().map(|(id, _)| id).collect();
        for id in ids {
            if let Some((old, new)) = self.registry.refresh_overlap(id) {
                // chunks the source has left need a rebuild as much as the ones it entered
                let mut coords: Vec<ChunkCoord> = old.union(&new).copied().collect();
                coords.sort();
                self.queue.extend(coords);
            }
        }
        // the overlap is fresh; drop pending change flags
        self.registry.take_changed();
        log::info!(
            target: "terrain",
            "generate: {} sources, {} chunks queued",
            self.registry.len(),
            self.queue.len()
        );
    }

    /// Releases every chunk's buffers and empties the store and the queue.
    pub fn delete_world(&mut self) {
        let count = self.chunks.len();
        for (_, mut chunk) in self.chunks.drain() {
            chunk.release(self.device.as_deref_mut());
        }
        self.queue.clear();
        if count > 0 {
            log::info!(target: "terrain", "deleted {} chunks", count);
        }
    }

    /// Tears the world down and hands back the device.
    pub fn shutdown(mut self) -> Option<Box<dyn GpuDevice>> {
        self.delete_world();
        if let Some(dev) = self.device.as_deref() {
            dev.stats().log_summary();
        }
        self.device.take()
    }

    fn invalidate_changed(&mut self) -> usize {
        let changed = self.registry.take_changed();
        for id in &changed {
            let Some((old, new)) = self.registry.refresh_overlap(*id) else {
                continue;
            };
            let mut old: Vec<ChunkCoord> = old.into_iter().collect();
            old.sort();
            let mut new: Vec<ChunkCoord> = new.into_iter().collect();
            new.sort();
            log::trace!(
                target: "terrain",
                "source {} moved: {} old chunks, {} new chunks",
                id,
                old.len(),
                new.len()
            );
            self.queue.extend(old);
            self.queue.extend(new);
        }
        changed.len()
    }

    /// One generation pass: invalidate changed sources, then rebuild up to
    /// `chunks_per_update` queued chunks.
    pub fn tick(&mut self) -> TickStats {
        let start = Instant::now();
        let mut stats = TickStats {
            invalidated_sources: self.invalidate_changed(),
            ..TickStats::default()
        };
        for _ in 0..self.settings.chunks_per_update {
            let Some(coord) = self.queue.try_dequeue() else {
                break;
            };
            stats.processed += 1;
            match self.update_chunk(coord) {
                Ok(ChunkOutcome::Meshed { .. }) => stats.meshed += 1,
                Ok(ChunkOutcome::Destroyed) => stats.destroyed += 1,
                Ok(ChunkOutcome::Untouched) => {}
                Err(e) => {
                    stats.skipped += 1;
                    log::warn!(target: "terrain", "skipping chunk {}: {}", coord, e);
                }
            }
        }
        stats.queue_len = self.queue.len();
        stats.live_chunks = self.chunks.len();
        if stats.processed > 0 {
            log::debug!(
                target: "perf",
                "terrain tick: {} processed ({} meshed, {} destroyed, {} skipped), {} queued, {} live, {:.2}ms",
                stats.processed,
                stats.meshed,
                stats.destroyed,
                stats.skipped,
                stats.queue_len,
                stats.live_chunks,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        stats
    }

    /// Runs ticks until no source is pending and the queue is empty.
    pub fn flush(&mut self) -> TickStats {
        let mut total = TickStats::default();
        loop {
            let s = self.tick();
            total.accumulate(s);
            if self.queue.is_empty() && s.processed == 0 {
                break;
            }
        }
        total
    }

    /// Re-evaluates one chunk from scratch.
    pub fn update_chunk(&mut self, coord: ChunkCoord) -> Result<ChunkOutcome, GenerateError> {
        let evaluator = self
            .evaluator
            .as_deref()
            .ok_or(GenerateError::MissingEvaluator)?;
        let extractor = self
            .extractor
            .as_deref()
            .ok_or(GenerateError::MissingExtractor)?;

        let sources = self.registry.overlapping(coord);
        if sources.is_empty() {
            return Ok(match self.chunks.remove(&coord) {
                Some(mut chunk) => {
                    chunk.release(self.device.as_deref_mut());
                    log::debug!(target: "terrain", "chunk {} destroyed", coord);
                    ChunkOutcome::Destroyed
                }
                None => ChunkOutcome::Untouched,
            });
        }

        let material_count = self.settings.material_count;
        let chunk = self.chunks.entry(coord).or_insert_with(|| {
            let buffers = self
                .device
                .as_deref_mut()
                .map(|d| ChunkBuffers::allocate(d, coord));
            log::debug!(target: "terrain", "chunk {} created", coord);
            TerrainChunk::new(coord, material_count, buffers)
        });

        evaluator.evaluate(&sources, &mut chunk.grid);
        if let (Some(buffers), Some(device)) = (chunk.buffers.as_ref(), self.device.as_deref_mut())
        {
            if let Err(e) = buffers.upload(device, &chunk.grid) {
                log::error!(target: "terrain", "chunk {} upload failed: {}", coord, e);
            }
        }

        match extractor.extract(&chunk.grid, &self.settings.extract, &mut self.scratch) {
            Ok(()) => {}
            Err(e @ ExtractError::CapacityExceeded { .. }) => {
                log::warn!(target: "terrain", "chunk {}: {}; mesh truncated", coord, e);
            }
            Err(e) => {
                log::error!(target: "terrain", "chunk {}: {}", coord, e);
            }
        }

        let (mesh, weld) = weld_and_bucket(self.scratch.as_slice(), material_count);
        if weld.dropped_biome > 0 {
            log::error!(
                target: "terrain",
                "chunk {}: {} triangles use biome ids up to {} but only {} materials are configured",
                coord,
                weld.dropped_biome,
                weld.max_biome.unwrap_or_default(),
                material_count
            );
        }
        let outcome = ChunkOutcome::Meshed {
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
        };
        chunk.commit_mesh(mesh);
        Ok(outcome)
    }
}

impl Drop for TerrainGenerator {
    fn drop(&mut self) {
        self.delete_world();
    }
}

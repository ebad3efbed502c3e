use hashbrown::HashMap;

use crate::{
    BufferDesc, BufferId, ComputePass, DeviceStats, DrawIndirect, GpuBuffer, GpuDevice, GpuError,
};

struct Slot {
    desc: BufferDesc,
    data: Vec<u8>,
    counter: u32,
}

/// Device that keeps buffers in host memory and records every dispatch and draw.
///
/// Kernels are not executed; tests and the CLI inspect the recorded passes.
#[derive(Default)]
pub struct HeadlessDevice {
    next_id: u64,
    slots: HashMap<BufferId, Slot>,
    passes: Vec<ComputePass>,
    draws: Vec<DrawIndirect>,
    stats: DeviceStats,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn passes(&self) -> &[ComputePass] {
        &self.passes
    }

    #[inline]
    pub fn draws(&self) -> &[DrawIndirect] {
        &self.draws
    }

    /// Forgets recorded passes and draws, e.g. at the start of a frame.
    pub fn clear_recording(&mut self) {
        self.passes.clear();
        self.draws.clear();
    }

    pub fn is_live(&self, id: BufferId) -> bool {
        self.slots.contains_key(&id)
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> GpuBuffer {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        let size = desc.size_bytes();
        self.slots.insert(
            id,
            Slot {
                desc: desc.clone(),
                data: vec![0; size],
                counter: 0,
            },
        );
        self.stats.created += 1;
        self.stats.live_buffers += 1;
        self.stats.live_bytes += size;
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.live_bytes);
        log::trace!("gpu: create {} '{}' ({} bytes)", id.0, desc.label, size);
        GpuBuffer::new(id, desc)
    }

    fn release(&mut self, buffer: GpuBuffer) {
        let id = buffer.mark_released();
        match self.slots.remove(&id) {
            Some(slot) => {
                self.stats.released += 1;
                self.stats.live_buffers -= 1;
                self.stats.live_bytes -= slot.desc.size_bytes();
            }
            None => log::error!("gpu: release of unknown buffer {}", id.0),
        }
    }

    fn write_bytes(
        &mut self,
        buffer: &GpuBuffer,
        offset: usize,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let slot = self
            .slots
            .get_mut(&buffer.id())
            .ok_or(GpuError::UnknownBuffer(buffer.id()))?;
        let end = offset + data.len();
        if end > slot.data.len() {
            return Err(GpuError::OutOfRange {
                buffer: buffer.id(),
                offset,
                len: data.len(),
                size: slot.data.len(),
            });
        }
        slot.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn read_bytes(&self, buffer: &GpuBuffer) -> Result<Vec<u8>, GpuError> {
        self.slots
            .get(&buffer.id())
            .map(|s| s.data.clone())
            .ok_or(GpuError::UnknownBuffer(buffer.id()))
    }

    fn set_counter(&mut self, buffer: &GpuBuffer, value: u32) {
        if let Some(slot) = self.slots.get_mut(&buffer.id()) {
            slot.counter = value;
        }
    }

    fn read_counter(&self, buffer: &GpuBuffer) -> u32 {
        self.slots.get(&buffer.id()).map_or(0, |s| s.counter)
    }

    fn dispatch(&mut self, pass: ComputePass) {
        self.stats.dispatches += 1;
        self.passes.push(pass);
    }

    fn draw_indirect(&mut self, draw: DrawIndirect) {
        self.stats.draws += 1;
        self.draws.push(draw);
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}

//! GPU resource seam: move-only buffer handles, the device trait, and a headless recorder.
#![forbid(unsafe_code)]

mod headless;

pub use headless::HeadlessDevice;

use bytemuck::{Pod, Zeroable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Allocation and submission counters of a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub created: usize,
    pub released: usize,
    pub live_buffers: usize,
    pub live_bytes: usize,
    pub peak_bytes: usize,
    pub dispatches: usize,
    pub draws: usize,
}

impl DeviceStats {
    pub fn log_summary(&self) {
        log::info!(
            "gpu: {} buffers created, {} released, {} live ({} bytes), peak {} bytes, {} dispatches, {} draws",
            self.created,
            self.released,
            self.live_buffers,
            self.live_bytes,
            self.peak_bytes,
            self.dispatches,
            self.draws
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    Structured,
    /// Append/consume buffer with a hidden counter.
    Append,
    Counter,
    IndirectArgs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: String,
    pub count: usize,
    pub stride: usize,
    pub usage: BufferUsage,
}

impl BufferDesc {
    pub fn new(label: impl Into<String>, count: usize, stride: usize, usage: BufferUsage) -> Self {
        Self {
            label: label.into(),
            count,
            stride,
            usage,
        }
    }

    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.count * self.stride
    }
}

/// Exclusive handle to a device buffer.
///
/// Not `Clone`; hand it back through [`GpuDevice::release`] exactly once. A handle
/// dropped without release is reported as a leak.
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    desc: BufferDesc,
    released: bool,
}

impl GpuBuffer {
    /// Only devices mint handles.
    pub fn new(id: BufferId, desc: BufferDesc) -> Self {
        Self {
            id,
            desc,
            released: false,
        }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.desc.size_bytes()
    }

    /// Marks the handle consumed; called by devices inside `release`.
    pub fn mark_released(mut self) -> BufferId {
        self.released = true;
        self.id
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "gpu buffer {} '{}' ({} bytes) dropped without release",
                self.id.0,
                self.desc.label,
                self.desc.size_bytes()
            );
        }
    }
}

/// Arguments of an instanced indirect draw: `[vertex_count, instance_count, start_vertex, start_instance]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub start_vertex: u32,
    pub start_instance: u32,
}

impl DrawArgs {
    /// Value the args buffer is reset to each frame before appending.
    pub const RESET: DrawArgs = DrawArgs {
        vertex_count: 0,
        instance_count: 1,
        start_vertex: 0,
        start_instance: 0,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub enum PassParam {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
}

/// One compute dispatch: kernel name, work groups, bound buffers, and scalar parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputePass {
    pub kernel: &'static str,
    pub groups: [u32; 3],
    pub buffers: Vec<(&'static str, BufferId)>,
    pub params: Vec<(&'static str, PassParam)>,
}

impl ComputePass {
    pub fn new(kernel: &'static str, groups: [u32; 3]) -> Self {
        Self {
            kernel,
            groups,
            buffers: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn buffer(mut self, name: &'static str, buf: &GpuBuffer) -> Self {
        self.buffers.push((name, buf.id()));
        self
    }

    pub fn param(mut self, name: &'static str, value: PassParam) -> Self {
        self.params.push((name, value));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawIndirect {
    pub args: BufferId,
    pub instances: BufferId,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    UnknownBuffer(BufferId),
    OutOfRange {
        buffer: BufferId,
        offset: usize,
        len: usize,
        size: usize,
    },
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::UnknownBuffer(id) => write!(f, "unknown gpu buffer {}", id.0),
            GpuError::OutOfRange {
                buffer,
                offset,
                len,
                size,
            } => write!(
                f,
                "write of {} bytes at {} overruns buffer {} of {} bytes",
                len, offset, buffer.0, size
            ),
        }
    }
}

impl std::error::Error for GpuError {}

pub trait GpuDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> GpuBuffer;

    /// Frees the buffer; consuming the handle makes a second release impossible.
    fn release(&mut self, buffer: GpuBuffer);

    fn write_bytes(
        &mut self,
        buffer: &GpuBuffer,
        offset: usize,
        data: &[u8],
    ) -> Result<(), GpuError>;

    fn read_bytes(&self, buffer: &GpuBuffer) -> Result<Vec<u8>, GpuError>;

    /// Sets the hidden counter of an append buffer.
    fn set_counter(&mut self, buffer: &GpuBuffer, value: u32);

    /// Synchronous readback of an append buffer's counter.
    fn read_counter(&self, buffer: &GpuBuffer) -> u32;

    fn dispatch(&mut self, pass: ComputePass);

    fn draw_indirect(&mut self, draw: DrawIndirect);

    fn stats(&self) -> DeviceStats;
}

/// Uploads a typed slice at the start of `buffer`.
pub fn write_slice<T: Pod, D: GpuDevice + ?Sized>(
    device: &mut D,
    buffer: &GpuBuffer,
    data: &[T],
) -> Result<(), GpuError> {
    device.write_bytes(buffer, 0, bytemuck::cast_slice(data))
}

/// Reads `buffer` back as a typed slice; trailing bytes that do not fill a `T` are ignored.
pub fn read_slice<T: Pod, D: GpuDevice + ?Sized>(
    device: &D,
    buffer: &GpuBuffer,
) -> Result<Vec<T>, GpuError> {
    let bytes = device.read_bytes(buffer)?;
    Ok(bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

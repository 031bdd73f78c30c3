//! Shared GPU helpers for the glass and blit pipelines.

use std::num::NonZeroU64;

use bytemuck::Pod;

use crate::error::LensError;

/// Format of the overlay and mirror textures.
pub const OVERLAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

// ── blend ─────────────────────────────────────────────────────────────────

pub fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── shader validation ─────────────────────────────────────────────────────

/// Creates a WGSL module and fails if the compiler reported an error.
pub(super) fn create_checked_shader(
    device: &wgpu::Device,
    label: &'static str,
    source: &'static str,
) -> Result<wgpu::ShaderModule, LensError> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| m.message.clone())
        .collect();

    if errors.is_empty() {
        Ok(module)
    } else {
        Err(LensError::ShaderCompile { label, message: errors.join("\n") })
    }
}

// ── samplers ──────────────────────────────────────────────────────────────

pub(super) fn linear_clamp_sampler(device: &wgpu::Device, label: &'static str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

// ── dynamic uniforms ──────────────────────────────────────────────────────

/// Rounds `size` up to a multiple of `align` (a power of two, or 0/1 for none).
pub(super) fn aligned_stride(size: u64, align: u64) -> u64 {
    if align <= 1 {
        return size;
    }
    size.div_ceil(align) * align
}

/// Packs `items` at `stride`-byte intervals.
pub(super) fn pack_strided<T: Pod>(items: &[T], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let mut out = vec![0u8; items.len() * stride];
    for (chunk, item) in out.chunks_exact_mut(stride).zip(items) {
        let bytes = bytemuck::bytes_of(item);
        chunk[..bytes.len()].copy_from_slice(bytes);
    }
    out
}

pub(super) fn min_binding_size<T>() -> NonZeroU64 {
    NonZeroU64::new(std::mem::size_of::<T>() as u64).unwrap_or(NonZeroU64::MIN)
}

/// Uniform buffer holding one `T` per draw, bound with dynamic offsets.
///
/// `push` hands out slots from a per-frame cursor so several callers can
/// share the buffer inside one submission.
pub(super) struct UniformSlots<T> {
    label: &'static str,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    stride: u64,
    cursor: u64,
    generation: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod> UniformSlots<T> {
    pub(super) fn new(label: &'static str) -> Self {
        Self {
            label,
            buffer: None,
            capacity: 0,
            stride: 0,
            cursor: 0,
            generation: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Bumped whenever the buffer is replaced; bind groups must be rebuilt.
    #[inline]
    pub(super) fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(super) fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub(super) fn begin_frame(&mut self) {
        self.cursor = 0;
    }

    /// Writes `items` into consecutive slots and returns their dynamic offsets.
    pub(super) fn push(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        items: &[T],
    ) -> Vec<u32> {
        if items.is_empty() {
            return Vec::new();
        }
        let count = items.len() as u64;
        if self.buffer.is_none() || self.cursor + count > self.capacity {
            self.grow(device, self.cursor + count);
        }
        let Some(buffer) = self.buffer.as_ref() else { return Vec::new(); };

        let base = self.cursor * self.stride;
        queue.write_buffer(buffer, base, &pack_strided(items, self.stride));

        let offsets = (0..count).map(|i| (base + i * self.stride) as u32).collect();
        self.cursor += count;
        offsets
    }

    fn grow(&mut self, device: &wgpu::Device, required: u64) {
        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        self.stride = aligned_stride(std::mem::size_of::<T>() as u64, align);
        let capacity = required.next_power_of_two().max(16);

        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: capacity * self.stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = capacity;
        // Earlier slots this frame live in the old buffer, which recorded
        // commands keep alive.
        self.cursor = 0;
        self.generation += 1;
    }
}

/// Intersects a scissor rectangle with a `(w, h)` target. `None` when empty.
pub(super) fn clamp_scissor(
    rect: crate::coords::PixelRect,
    target: (u32, u32),
) -> Option<(u32, u32, u32, u32)> {
    rect.clip_to(target.0, target.1).map(|c| {
        let d = c.dst;
        (d.x as u32, d.y as u32, d.width, d.height)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PixelRect;

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(aligned_stride(96, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(112, 0), 112);
    }

    #[test]
    fn packed_items_start_on_stride_boundaries() {
        let items = [[1.0f32, 2.0], [3.0, 4.0]];
        let bytes = pack_strided(&items, 16);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..8], bytemuck::bytes_of(&items[0]));
        assert_eq!(&bytes[8..16], &[0u8; 8]);
        assert_eq!(&bytes[16..24], bytemuck::bytes_of(&items[1]));
    }

    #[test]
    fn scissor_is_clamped_to_target() {
        let r = PixelRect::new(-20, 10, 100, 500);
        assert_eq!(clamp_scissor(r, (50, 100)), Some((0, 10, 50, 90)));
        assert_eq!(clamp_scissor(PixelRect::new(60, 0, 10, 10), (50, 100)), None);
    }
}

// Readback - Copies an r32uint image back into CPU memory

use super::context::GpuContext;
use super::GpuError;
use std::sync::mpsc;

/// Bytes per row rounded up to the copy alignment
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Read every texel of a single-layer 32-bit image
///
/// Submits its own copy and waits for it, so any work previously submitted
/// to the queue has finished by the time it returns.
pub fn read_image_words(ctx: &GpuContext, image: &wgpu::Texture) -> Result<Vec<u32>, GpuError> {
    let size = image.size();
    let bytes_per_row = padded_bytes_per_row(size.width);

    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback staging"),
        size: bytes_per_row as u64 * size.height as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: image,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            depth_or_array_layers: 1,
            ..size
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    ctx.wait_idle()?;
    receiver.recv().map_err(|_| GpuError::MapAborted)??;

    let mut words = Vec::with_capacity(size.width as usize * size.height as usize);
    {
        let data = slice.get_mapped_range();
        for row in data.chunks_exact(bytes_per_row as usize) {
            let texels = &row[..size.width as usize * 4];
            words.extend(
                texels
                    .chunks_exact(4)
                    .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            );
        }
    }
    staging.unmap();

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1280), 5120);
    }
}

// CPU converter - Sequential detile into a LinearFrame
//
// Walks the output in row-major order, resamples each texel into padded
// source space and reads the tiled word for that source pixel.

use super::{ConvertError, FrameConverter};
use crate::detile::{linear_byte_offset, map_to_source, translate, FrameGeometry};
use crate::framebuffer::{ChannelOrder, LinearFrame, TiledFramebuffer};

/// Reference converter running on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuConverter {
    order: ChannelOrder,
    force_opaque: bool,
}

impl CpuConverter {
    /// Create a converter
    ///
    /// # Arguments
    /// * `order` - Byte order of pixels in the dump
    /// * `force_opaque` - Ignore dumped alpha and emit 0xFF
    pub fn new(order: ChannelOrder, force_opaque: bool) -> Self {
        Self {
            order,
            force_opaque,
        }
    }

    /// Detile into raw dump words without channel reordering
    ///
    /// This is exactly what the GPU kernel writes into its output image.
    pub fn convert_words(
        &self,
        tiled: &TiledFramebuffer,
        geometry: &FrameGeometry,
    ) -> Result<Vec<u32>, ConvertError> {
        super::check_source(tiled, geometry)?;

        let padded_internal = geometry.padded_internal();
        let padded_output = geometry.padded_output();
        let output = geometry.output();

        let mut words = vec![0u32; output.area()];
        for (y, row) in words.chunks_exact_mut(output.width as usize).enumerate() {
            let y = y as u32;
            for (x, word) in row.iter_mut().enumerate() {
                let x = x as u32;
                let Some((source_x, source_y)) = map_to_source(x, y, padded_output, padded_internal)
                else {
                    continue;
                };

                let offset = linear_byte_offset(padded_internal.width, source_x, source_y);
                let index = translate(padded_internal.width, offset);
                *word = tiled
                    .pixel_word(index)
                    .ok_or(ConvertError::AddressOutOfRange { index })?;
            }
        }

        Ok(words)
    }
}

impl FrameConverter for CpuConverter {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn convert(
        &mut self,
        tiled: &TiledFramebuffer,
        geometry: &FrameGeometry,
    ) -> Result<LinearFrame, ConvertError> {
        let mut words = self.convert_words(tiled, geometry)?;
        for word in &mut words {
            *word = self.order.repack(*word, self.force_opaque);
        }
        Ok(LinearFrame::from_pixels(geometry.output(), words))
    }
}

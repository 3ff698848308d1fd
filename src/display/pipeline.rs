// Presentation pipeline - Per-frame state machine driving a FrameBackend
//
// Each frame walks Idle -> Uploaded -> Converted -> Presented -> Idle.
// Steps requested in any other order are rejected and leave the state as it
// was. The backend only ever sees calls in that order. Under the GPU strategy
// the Uploaded step copies the dump only after it was replaced; later frames
// reuse the uploaded contents.

use crate::convert::{check_source, ConversionStrategy, ConvertError, CpuConverter, FrameConverter};
use crate::detile::FrameGeometry;
use crate::framebuffer::{LinearFrame, TiledFramebuffer};
use crate::gpu::GpuError;
use log::debug;
use std::fmt;

/// GPU-side operations the pipeline needs
///
/// `display::renderer::Renderer` implements this over wgpu.
pub trait FrameBackend {
    /// Copy a whole tiled dump into GPU-visible storage
    ///
    /// Called on the first frame and after each source replacement, not on
    /// frames whose dump is unchanged.
    fn upload_buffer(&mut self, bytes: &[u8]) -> Result<(), GpuError>;

    /// Record the detile kernel over `grid` workgroups
    fn dispatch_kernel(&mut self, grid: (u32, u32)) -> Result<(), GpuError>;

    /// Store a CPU-converted frame in the output image
    fn write_image(&mut self, frame: &LinearFrame) -> Result<(), GpuError>;

    /// Make output image writes visible to the sampling pass
    fn memory_barrier(&mut self) -> Result<(), GpuError>;

    /// Sample the output image onto the surface and present it
    fn present_frame(&mut self) -> Result<(), GpuError>;
}

/// Position within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Uploaded,
    Converted,
    Presented,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameState::Idle => "idle",
            FrameState::Uploaded => "uploaded",
            FrameState::Converted => "converted",
            FrameState::Presented => "presented",
        };
        f.write_str(name)
    }
}

/// Errors raised while driving a frame
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot {step} while the frame is {state}")]
    OutOfOrder {
        step: &'static str,
        state: FrameState,
    },

    #[error(transparent)]
    Backend(#[from] GpuError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Drives upload, conversion and presentation of one dump
pub struct PresentationPipeline<B: FrameBackend> {
    backend: B,
    geometry: FrameGeometry,
    strategy: ConversionStrategy,
    cpu: CpuConverter,
    source: TiledFramebuffer,
    state: FrameState,
    needs_upload: bool,
}

impl<B: FrameBackend> PresentationPipeline<B> {
    /// Create a pipeline for `source`
    ///
    /// # Arguments
    /// * `backend` - GPU collaborator
    /// * `geometry` - Internal and output resolutions
    /// * `strategy` - Where conversion runs
    /// * `cpu` - Converter used by the CPU strategy and for snapshots
    /// * `source` - Initial dump, laid out for `geometry`
    pub fn new(
        backend: B,
        geometry: FrameGeometry,
        strategy: ConversionStrategy,
        cpu: CpuConverter,
        source: TiledFramebuffer,
    ) -> Result<Self, PipelineError> {
        check_source(&source, &geometry)?;
        Ok(Self {
            backend,
            geometry,
            strategy,
            cpu,
            source,
            state: FrameState::Idle,
            needs_upload: true,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn strategy(&self) -> ConversionStrategy {
        self.strategy
    }

    pub fn source(&self) -> &TiledFramebuffer {
        &self.source
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Replace the dump wholesale; the next upload copies it
    pub fn replace_source(&mut self, source: TiledFramebuffer) -> Result<(), PipelineError> {
        self.expect_state("replace the source", FrameState::Idle)?;
        check_source(&source, &self.geometry)?;
        self.source = source;
        self.needs_upload = true;
        Ok(())
    }

    /// Idle -> Uploaded
    ///
    /// The GPU strategy copies the dump only when it changed since the last
    /// upload; uploaded contents persist until replaced.
    pub fn upload(&mut self) -> Result<(), PipelineError> {
        self.expect_state("upload", FrameState::Idle)?;
        if self.strategy == ConversionStrategy::Gpu && self.needs_upload {
            debug!("Uploading {} byte dump", self.source.len());
            self.backend.upload_buffer(self.source.as_bytes())?;
            self.needs_upload = false;
        }
        self.state = FrameState::Uploaded;
        Ok(())
    }

    /// Uploaded -> Converted
    pub fn convert(&mut self) -> Result<(), PipelineError> {
        self.expect_state("convert", FrameState::Uploaded)?;
        match self.strategy {
            ConversionStrategy::Gpu => {
                self.backend.dispatch_kernel(self.geometry.dispatch_grid())?;
            }
            ConversionStrategy::Cpu => {
                let frame = self.cpu.convert(&self.source, &self.geometry)?;
                self.backend.write_image(&frame)?;
            }
        }
        self.backend.memory_barrier()?;
        self.state = FrameState::Converted;
        Ok(())
    }

    /// Converted -> Presented
    pub fn present(&mut self) -> Result<(), PipelineError> {
        self.expect_state("present", FrameState::Converted)?;
        self.backend.present_frame()?;
        self.state = FrameState::Presented;
        Ok(())
    }

    /// Presented -> Idle
    pub fn end_frame(&mut self) -> Result<(), PipelineError> {
        self.expect_state("end the frame", FrameState::Presented)?;
        self.state = FrameState::Idle;
        Ok(())
    }

    /// Run a whole frame from Idle
    ///
    /// A failing step abandons the frame and returns the pipeline to Idle.
    pub fn run_frame(&mut self) -> Result<(), PipelineError> {
        self.expect_state("start a frame", FrameState::Idle)?;
        let result = self
            .upload()
            .and_then(|()| self.convert())
            .and_then(|()| self.present())
            .and_then(|()| self.end_frame());
        if result.is_err() {
            self.state = FrameState::Idle;
        }
        result
    }

    /// Convert the current dump on the CPU, independent of the frame state
    pub fn snapshot(&self) -> Result<LinearFrame, ConvertError> {
        let mut cpu = self.cpu;
        cpu.convert(&self.source, &self.geometry)
    }

    fn expect_state(&self, step: &'static str, expected: FrameState) -> Result<(), PipelineError> {
        if self.state != expected {
            return Err(PipelineError::OutOfOrder {
                step,
                state: self.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detile::Resolution;
    use crate::framebuffer::{pattern_color, tiled_test_pattern, ChannelOrder};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Upload(usize),
        Dispatch(u32, u32),
        WriteImage(Resolution),
        Barrier,
        Present,
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        last_image: Option<LinearFrame>,
        fail_present: bool,
    }

    impl FrameBackend for RecordingBackend {
        fn upload_buffer(&mut self, bytes: &[u8]) -> Result<(), GpuError> {
            self.calls.push(Call::Upload(bytes.len()));
            Ok(())
        }

        fn dispatch_kernel(&mut self, grid: (u32, u32)) -> Result<(), GpuError> {
            self.calls.push(Call::Dispatch(grid.0, grid.1));
            Ok(())
        }

        fn write_image(&mut self, frame: &LinearFrame) -> Result<(), GpuError> {
            self.calls.push(Call::WriteImage(frame.resolution()));
            self.last_image = Some(frame.clone());
            Ok(())
        }

        fn memory_barrier(&mut self) -> Result<(), GpuError> {
            self.calls.push(Call::Barrier);
            Ok(())
        }

        fn present_frame(&mut self) -> Result<(), GpuError> {
            if self.fail_present {
                return Err(GpuError::SurfaceUnsupported);
            }
            self.calls.push(Call::Present);
            Ok(())
        }
    }

    fn pipeline(strategy: ConversionStrategy) -> PresentationPipeline<RecordingBackend> {
        let res = Resolution::new(64, 64);
        PresentationPipeline::new(
            RecordingBackend::default(),
            FrameGeometry::unscaled(res).unwrap(),
            strategy,
            CpuConverter::new(ChannelOrder::Brga, false),
            tiled_test_pattern(res, ChannelOrder::Brga),
        )
        .unwrap()
    }

    #[test]
    fn test_gpu_frame_order() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.run_frame().unwrap();

        assert_eq!(p.state(), FrameState::Idle);
        assert_eq!(
            p.backend().calls,
            vec![
                Call::Upload(64 * 64 * 4),
                Call::Dispatch(4, 4),
                Call::Barrier,
                Call::Present
            ]
        );
    }

    #[test]
    fn test_uploaded_contents_persist() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.run_frame().unwrap();
        p.backend_mut().calls.clear();

        p.run_frame().unwrap();
        assert_eq!(
            p.backend().calls,
            vec![Call::Dispatch(4, 4), Call::Barrier, Call::Present]
        );
    }

    #[test]
    fn test_replace_source_reuploads() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.run_frame().unwrap();
        p.backend_mut().calls.clear();

        let res = Resolution::new(64, 64);
        p.replace_source(TiledFramebuffer::filled(res, [1, 2, 3, 4]))
            .unwrap();
        p.run_frame().unwrap();
        assert_eq!(p.backend().calls[0], Call::Upload(64 * 64 * 4));
    }

    #[test]
    fn test_replace_source_rejects_other_geometry() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        let err = p
            .replace_source(TiledFramebuffer::filled(Resolution::new(32, 32), [0; 4]))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Convert(ConvertError::SourceMismatch { .. })
        ));
    }

    #[test]
    fn test_cpu_frame_writes_converted_image() {
        let mut p = pipeline(ConversionStrategy::Cpu);
        p.run_frame().unwrap();

        assert_eq!(
            p.backend().calls,
            vec![
                Call::WriteImage(Resolution::new(64, 64)),
                Call::Barrier,
                Call::Present
            ]
        );
        let image = p.backend().last_image.as_ref().unwrap();
        let padded = Resolution::new(64, 64);
        assert_eq!(image.get(40, 3), Some(pattern_color(40, 3, padded)));
    }

    #[test]
    fn test_out_of_order_steps_are_rejected() {
        let mut p = pipeline(ConversionStrategy::Gpu);

        let err = p.convert().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::OutOfOrder {
                step: "convert",
                state: FrameState::Idle
            }
        ));
        assert!(p.present().is_err());
        assert!(p.end_frame().is_err());
        assert_eq!(p.state(), FrameState::Idle);
        assert!(p.backend().calls.is_empty());

        p.upload().unwrap();
        assert!(p.upload().is_err());
        assert!(p.present().is_err());
        assert!(p.run_frame().is_err());
        assert!(p.replace_source(p.source().clone()).is_err());
        assert_eq!(p.state(), FrameState::Uploaded);
    }

    #[test]
    fn test_stepwise_transitions() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.upload().unwrap();
        assert_eq!(p.state(), FrameState::Uploaded);
        p.convert().unwrap();
        assert_eq!(p.state(), FrameState::Converted);
        p.present().unwrap();
        assert_eq!(p.state(), FrameState::Presented);
        p.end_frame().unwrap();
        assert_eq!(p.state(), FrameState::Idle);
    }

    #[test]
    fn test_failed_frame_returns_to_idle() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.backend_mut().fail_present = true;

        let err = p.run_frame().unwrap_err();
        assert!(matches!(err, PipelineError::Backend(_)));
        assert_eq!(p.state(), FrameState::Idle);

        p.backend_mut().fail_present = false;
        p.run_frame().unwrap();
    }

    #[test]
    fn test_snapshot_ignores_frame_state() {
        let mut p = pipeline(ConversionStrategy::Gpu);
        p.upload().unwrap();
        let frame = p.snapshot().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(64, 64));
        assert_eq!(p.state(), FrameState::Uploaded);
    }
}

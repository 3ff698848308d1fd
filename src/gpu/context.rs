// GPU context - Adapter, device and queue acquisition
//
// Both the windowed renderer and the headless converter go through here so
// they request the same features and limits.

use super::GpuError;
use log::info;
use std::future::Future;

/// Device and queue plus the adapter they came from
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire a device with no presentation surface
    pub fn headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        Self::with_instance(instance, None)
    }

    /// Acquire a device able to present to `surface`
    ///
    /// `surface` must have been created from `instance`.
    pub fn for_surface(
        instance: wgpu::Instance,
        surface: &wgpu::Surface<'_>,
    ) -> Result<Self, GpuError> {
        Self::with_instance(instance, Some(surface))
    }

    fn with_instance(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        }))?;

        let adapter_info = adapter.get_info();
        info!(
            "Using GPU adapter: {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        // Large dumps need whatever storage the adapter offers
        let supported = adapter.limits();
        let required_limits = wgpu::Limits {
            max_storage_buffer_binding_size: supported.max_storage_buffer_binding_size,
            max_buffer_size: supported.max_buffer_size,
            ..wgpu::Limits::default().using_resolution(supported)
        };

        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("xenos-fb device"),
            required_features: wgpu::Features::empty(),
            required_limits,
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        }))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Run `create` and turn any validation error it raises into a shader error
    ///
    /// wgpu reports WGSL compile and pipeline validation failures through
    /// error scopes instead of return values.
    pub fn validated<T>(
        &self,
        label: &'static str,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match block_on(self.device.pop_error_scope()) {
            Some(err) => Err(GpuError::Shader {
                label,
                message: err.to_string(),
            }),
            None => Ok(value),
        }
    }

    /// Block until all submitted work has finished
    pub fn wait_idle(&self) -> Result<(), GpuError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|err| GpuError::Poll(err.to_string()))
    }
}

pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    pollster::block_on(future)
}

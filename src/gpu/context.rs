use std::sync::Arc;

use crate::error::{gpu_operation_error, GpuErrorContext, VisualizationError, VisualizationResult};

/// Shared device and queue for every GPU-backed effect
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    adapter_info: wgpu::AdapterInfo,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish()
    }
}

impl GpuContext {
    /// Blocking constructor
    pub fn new() -> VisualizationResult<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> VisualizationResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .gpu_context("request_adapter")?;

        let adapter_info = adapter.get_info();

        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(VisualizationError::GpuUnavailable(format!(
                "adapter '{}' has no compute shader support",
                adapter_info.name
            )));
        }
        if !adapter
            .get_texture_format_features(wgpu::TextureFormat::Rgba32Float)
            .allowed_usages
            .contains(wgpu::TextureUsages::STORAGE_BINDING)
        {
            return Err(VisualizationError::GpuUnavailable(format!(
                "adapter '{}' cannot write rgba32float storage textures",
                adapter_info.name
            )));
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Weather Visualization Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                },
                None,
            )
            .await
            .gpu_context("request_device")?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("[GPU] Uncaptured device error: {}", error);
        }));

        log::info!(
            "[GpuContext] Using adapter '{}' ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_info.name
    }

    /// Run `f` inside validation and out-of-memory error scopes so failures
    /// come back as errors instead of reaching the uncaptured handler.
    pub fn scoped<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> VisualizationResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f(&self.device);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(error) => Err(gpu_operation_error(operation, error)),
            None => Ok(value),
        }
    }
}

use std::sync::OnceLock;

use thiserror::Error;

/// Failure of a single capability query
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbeError {
    #[error("capability not exposed by this host")]
    Unsupported,
    #[error("capability query failed: {0}")]
    Failed(String),
}

/// Feature queries the host environment answers for the profiler.
///
/// Every method may fail; callers treat failure as the conservative answer.
pub trait HostEnvironment {
    fn is_mobile(&self) -> Result<bool, ProbeError>;
    fn supports_compute(&self) -> Result<bool, ProbeError>;
    fn supports_float_buffers(&self) -> Result<bool, ProbeError>;
    fn logical_cores(&self) -> Result<usize, ProbeError>;
    fn device_memory_gb(&self) -> Result<f32, ProbeError>;
    fn is_low_power_mode(&self) -> Result<bool, ProbeError>;

    /// Start a best-effort battery query. The reading (fraction in [0, 1])
    /// arrives on the returned channel whenever the host gets it; `None`
    /// means the host has no battery API at all.
    fn request_battery_level(&self) -> Option<flume::Receiver<f32>> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct AdapterSummary {
    compute: bool,
    float_storage: bool,
}

/// Desktop/native host backed by wgpu adapter enumeration
#[derive(Debug, Default)]
pub struct NativeHost {
    adapter: OnceLock<Option<AdapterSummary>>,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn adapter_summary(&self) -> Result<AdapterSummary, ProbeError> {
        self.adapter
            .get_or_init(|| pollster::block_on(probe_adapter()))
            .ok_or_else(|| ProbeError::Failed("no wgpu adapter".to_string()))
    }
}

async fn probe_adapter() -> Option<AdapterSummary> {
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
        .await?;

    let info = adapter.get_info();
    let compute = adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);
    let float_storage = adapter
        .get_texture_format_features(wgpu::TextureFormat::Rgba32Float)
        .allowed_usages
        .contains(wgpu::TextureUsages::STORAGE_BINDING);

    log::info!(
        "[NativeHost] Adapter '{}' ({:?}): compute={}, rgba32float storage={}",
        info.name,
        info.backend,
        compute,
        float_storage
    );

    Some(AdapterSummary {
        compute,
        float_storage,
    })
}

impl HostEnvironment for NativeHost {
    fn is_mobile(&self) -> Result<bool, ProbeError> {
        Ok(cfg!(any(target_os = "android", target_os = "ios")))
    }

    fn supports_compute(&self) -> Result<bool, ProbeError> {
        Ok(self.adapter_summary()?.compute)
    }

    fn supports_float_buffers(&self) -> Result<bool, ProbeError> {
        Ok(self.adapter_summary()?.float_storage)
    }

    fn logical_cores(&self) -> Result<usize, ProbeError> {
        Ok(num_cpus::get())
    }

    fn device_memory_gb(&self) -> Result<f32, ProbeError> {
        #[cfg(target_os = "linux")]
        {
            let meminfo = std::fs::read_to_string("/proc/meminfo")
                .map_err(|e| ProbeError::Failed(e.to_string()))?;
            parse_mem_total_gb(&meminfo).ok_or(ProbeError::Unsupported)
        }
        #[cfg(not(target_os = "linux"))]
        {
            Err(ProbeError::Unsupported)
        }
    }

    fn is_low_power_mode(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported)
    }

    fn request_battery_level(&self) -> Option<flume::Receiver<f32>> {
        #[cfg(target_os = "linux")]
        {
            let (tx, rx) = flume::bounded(1);
            let spawned = std::thread::Builder::new()
                .name("battery-probe".to_string())
                .spawn(move || {
                    let reading = std::fs::read_to_string("/sys/class/power_supply/BAT0/capacity")
                        .ok()
                        .and_then(|raw| raw.trim().parse::<f32>().ok());
                    if let Some(percent) = reading {
                        // receiver may already be gone after dispose
                        let _ = tx.send(percent / 100.0);
                    }
                });
            spawned.ok().map(|_| rx)
        }
        #[cfg(not(target_os = "linux"))]
        {
            None
        }
    }
}

/// Parse the `MemTotal:` line of /proc/meminfo into GiB
fn parse_mem_total_gb(meminfo: &str) -> Option<f32> {
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some((kb / (1024.0 * 1024.0)) as f32)
}

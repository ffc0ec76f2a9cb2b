use crate::capability::host::{HostEnvironment, ProbeError};
use crate::capability::profile::CapabilityProfile;
use crate::constants::quality::{HIGH_END_MIN_CORES, HIGH_END_MIN_MEMORY_GB};

/// State of a pending battery query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatteryStatus {
    Pending,
    Resolved(f32),
    /// The host dropped the query without answering
    Abandoned,
}

/// Battery reading that has been requested but may not have arrived yet
#[derive(Debug)]
pub struct BatteryQuery {
    receiver: flume::Receiver<f32>,
}

impl BatteryQuery {
    pub fn new(receiver: flume::Receiver<f32>) -> Self {
        Self { receiver }
    }

    /// Non-blocking poll
    pub fn poll(&self) -> BatteryStatus {
        match self.receiver.try_recv() {
            Ok(level) => BatteryStatus::Resolved(level),
            Err(flume::TryRecvError::Empty) => BatteryStatus::Pending,
            Err(flume::TryRecvError::Disconnected) => BatteryStatus::Abandoned,
        }
    }
}

/// Output of a profiling run
#[derive(Debug)]
pub struct ProfileReport {
    pub profile: CapabilityProfile,
    /// Pending battery reading, if the host supports one
    pub battery: Option<BatteryQuery>,
    /// Names of probes that failed and fell back to the conservative value
    pub failed_probes: Vec<&'static str>,
}

/// Builds a `CapabilityProfile` from a host environment
pub struct CapabilityProfiler<'a> {
    host: &'a dyn HostEnvironment,
    failed: Vec<&'static str>,
}

impl<'a> CapabilityProfiler<'a> {
    pub fn new(host: &'a dyn HostEnvironment) -> Self {
        Self {
            host,
            failed: Vec::new(),
        }
    }

    /// Run every probe once. Never fails.
    pub fn profile(mut self) -> ProfileReport {
        let is_mobile = self.probe("is_mobile", false, |h| h.is_mobile());
        let has_compute = self.probe("supports_compute", false, |h| h.supports_compute());
        let supports_float_buffers =
            self.probe("supports_float_buffers", false, |h| h.supports_float_buffers());
        let cores = self.probe("logical_cores", 1, |h| h.logical_cores());
        let memory_gb = self.probe("device_memory_gb", 0.0, |h| h.device_memory_gb());
        let is_low_power = self.probe("is_low_power_mode", false, |h| h.is_low_power_mode());

        let is_high_end =
            !is_mobile && cores >= HIGH_END_MIN_CORES && memory_gb >= HIGH_END_MIN_MEMORY_GB;

        let profile = CapabilityProfile {
            is_mobile,
            is_high_end,
            has_compute,
            supports_float_buffers,
            battery_level: None,
            is_low_power,
        };

        log::info!("[CapabilityProfiler] {:?}", profile);

        ProfileReport {
            profile,
            battery: self.host.request_battery_level().map(BatteryQuery::new),
            failed_probes: self.failed,
        }
    }

    fn probe<T>(
        &mut self,
        name: &'static str,
        conservative: T,
        query: impl FnOnce(&dyn HostEnvironment) -> Result<T, ProbeError>,
    ) -> T {
        match query(self.host) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("[CapabilityProfiler] Probe {} failed ({}), using default", name, e);
                self.failed.push(name);
                conservative
            }
        }
    }
}

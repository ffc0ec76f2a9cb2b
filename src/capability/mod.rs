//! Host capability profiling
//!
//! Runs once at startup and produces an immutable `CapabilityProfile`.
//! Individual probes may fail; a failed probe yields the conservative value.

pub mod host;
pub mod profile;
pub mod profiler;

pub use host::{HostEnvironment, NativeHost, ProbeError};
pub use profile::CapabilityProfile;
pub use profiler::{BatteryQuery, BatteryStatus, CapabilityProfiler, ProfileReport};

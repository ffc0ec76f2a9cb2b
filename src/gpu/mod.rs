//! GPU device ownership
//!
//! Effects share one `GpuContext`; each effect owns its own textures and
//! pipelines.

pub mod context;

pub use context::GpuContext;

//! Adaptive weather visualization engine
//!
//! Profiles the host, picks a quality tier, and drives CPU or GPU particle
//! simulations plus fog, cloud, lightning and wind effects from a
//! `WeatherState`. Quality is retuned at runtime against measured frame
//! rate. The host owns the scene graph and frame loop; this crate only
//! attaches nodes and pushes uniforms.

pub mod capability;
pub mod composer;
pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod orchestrator;
pub mod particles;
pub mod profiling;
pub mod quality;
pub mod scene;
pub mod weather;

pub use capability::{CapabilityProfile, CapabilityProfiler, HostEnvironment, NativeHost, ProbeError};
pub use composer::{EffectKind, WeatherEffectComposer};
pub use config::VisualizationConfig;
pub use error::{Diagnostic, VisualizationError, VisualizationResult};
pub use orchestrator::VisualizationOrchestrator;
pub use particles::{EngineBackend, ParticleEngine, PrecipitationKind};
pub use profiling::{MetricSample, MetricsRingBuffer, MetricsSink, PerformanceMonitor, SharedMetrics};
pub use quality::{resolve, QualityOverride, QualityTier, VisualizationSettings};
pub use scene::{NodeId, NodeUniforms, RenderNode, SceneGraph, TickSource};
pub use weather::{find_preset, EffectParameters, EffectPreset, TransitionManager, WeatherState};

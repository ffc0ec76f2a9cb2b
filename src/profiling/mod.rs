//! Frame-rate monitoring and metrics export

pub mod metrics;
pub mod performance_monitor;

pub use metrics::{shared_metrics, MetricSample, MetricsRingBuffer, MetricsSink, SharedMetrics};
pub use performance_monitor::{ChangeReason, PerformanceMonitor, QualityChange};

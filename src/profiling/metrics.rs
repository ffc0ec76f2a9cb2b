use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::monitor::METRICS_CAPACITY;
use crate::error::VisualizationResult;
use crate::quality::QualityTier;

/// One sampling window's outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Monitor time (sum of ticked frame times) at the end of the window
    pub timestamp_ms: u64,
    pub fps: f32,
    pub tier: QualityTier,
}

/// Receiver for per-window samples. The host decides where they go.
pub trait MetricsSink {
    fn record(&mut self, sample: MetricSample);
}

/// Bounded FIFO of the most recent samples
#[derive(Debug, Clone)]
pub struct MetricsRingBuffer {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl Default for MetricsRingBuffer {
    fn default() -> Self {
        Self::new(METRICS_CAPACITY)
    }
}

impl MetricsRingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first
    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    pub fn average_fps(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f32 = self.samples.iter().map(|s| s.fps).sum();
        Some(sum / self.samples.len() as f32)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Export as a JSON array, oldest first
    pub fn to_json(&self) -> VisualizationResult<String> {
        Ok(serde_json::to_string(&self.samples)?)
    }
}

impl MetricsSink for MetricsRingBuffer {
    fn record(&mut self, sample: MetricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

/// Ring buffer the host can read while the monitor writes
pub type SharedMetrics = Arc<Mutex<MetricsRingBuffer>>;

pub fn shared_metrics(capacity: usize) -> SharedMetrics {
    Arc::new(Mutex::new(MetricsRingBuffer::new(capacity)))
}

impl<S: MetricsSink> MetricsSink for Arc<Mutex<S>> {
    fn record(&mut self, sample: MetricSample) {
        self.lock().record(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: u64) -> MetricSample {
        MetricSample {
            timestamp_ms: i * 5000,
            fps: i as f32,
            tier: QualityTier::Medium,
        }
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut buffer = MetricsRingBuffer::default();
        for i in 0..150 {
            buffer.record(sample(i));
        }
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.samples().next().unwrap().timestamp_ms, 50 * 5000);
        assert_eq!(buffer.latest().unwrap().timestamp_ms, 149 * 5000);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut buffer = MetricsRingBuffer::new(0);
        buffer.record(sample(1));
        buffer.record(sample(2));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest().unwrap().fps, 2.0);
    }

    #[test]
    fn test_json_export() {
        let mut buffer = MetricsRingBuffer::new(4);
        buffer.record(sample(1));
        let json = buffer.to_json().unwrap();
        let parsed: Vec<MetricSample> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![sample(1)]);
        assert!(json.contains("\"tier\":\"Medium\""));
    }

    #[test]
    fn test_shared_metrics_records_through_lock() {
        let shared = shared_metrics(10);
        let mut writer = Arc::clone(&shared);
        writer.record(sample(3));
        writer.record(sample(5));
        assert_eq!(shared.lock().len(), 2);
        assert_eq!(shared.lock().average_fps(), Some(4.0));
    }
}

//! Adaptive quality control from measured frame rate
//!
//! Frames are counted over fixed windows of monitor time (the sum of ticked
//! frame durations, not wall clock). At the end of each window the average
//! FPS is recorded and compared against the thresholds:
//!
//! - below `min_fps` and above Low: step down one tier, then wait
//!   `downgrade_cooldown_windows` windows
//! - above `target_fps * upgrade_factor` and below High: step up one tier,
//!   then wait `upgrade_cooldown_windows` windows
//!
//! The window immediately after a tier change is a warm-up window: it is
//! recorded but not evaluated, since it still contains frames rendered at the
//! previous tier's cost. Cooldown windows are counted after it.

use std::time::Duration;

use crate::config::MonitorConfig;
use crate::profiling::metrics::{MetricSample, MetricsSink};
use crate::quality::QualityTier;

/// Why the tier moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    LowFrameRate,
    HighFrameRate,
}

/// Emitted when the monitor moves the tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityChange {
    pub from: QualityTier,
    pub to: QualityTier,
    /// Average FPS of the window that triggered the change
    pub fps: f32,
    pub reason: ChangeReason,
}

type ChangeCallback = Box<dyn FnMut(QualityChange)>;

pub struct PerformanceMonitor {
    config: MonitorConfig,
    tier: QualityTier,
    running: bool,

    window_elapsed: f64,
    window_frames: u32,
    total_elapsed: f64,
    windows: u64,

    current_fps: f32,
    cooldown: u32,
    warm_up: bool,

    sink: Option<Box<dyn MetricsSink>>,
    on_change: Option<ChangeCallback>,
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("tier", &self.tier)
            .field("running", &self.running)
            .field("current_fps", &self.current_fps)
            .field("cooldown", &self.cooldown)
            .field("warm_up", &self.warm_up)
            .field("windows", &self.windows)
            .finish()
    }
}

impl PerformanceMonitor {
    pub fn new(config: MonitorConfig, initial_tier: QualityTier) -> Self {
        Self {
            config,
            tier: initial_tier,
            running: false,
            window_elapsed: 0.0,
            window_frames: 0,
            total_elapsed: 0.0,
            windows: 0,
            current_fps: 0.0,
            cooldown: 0,
            warm_up: false,
            sink: None,
            on_change: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Register the tier-change callback, replacing any previous one
    pub fn on_quality_change(&mut self, callback: impl FnMut(QualityChange) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!(
                "[PerformanceMonitor] Started at {:?} ({}s windows)",
                self.tier,
                self.config.sample_window_secs
            );
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.window_elapsed = 0.0;
        self.window_frames = 0;
    }

    /// Stop and drop the callback and sink
    pub fn dispose(&mut self) {
        self.stop();
        self.on_change = None;
        self.sink = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Record a frame. Returns the change made if this frame closed a window.
    /// Zero-length frames are ignored.
    pub fn record_frame(&mut self, frame_time: Duration) -> Option<QualityChange> {
        if !self.running || frame_time.is_zero() {
            return None;
        }
        let secs = frame_time.as_secs_f64();
        self.window_frames += 1;
        self.window_elapsed += secs;
        self.total_elapsed += secs;

        if self.window_elapsed < f64::from(self.config.sample_window_secs) {
            return None;
        }

        let fps = (f64::from(self.window_frames) / self.window_elapsed) as f32;
        self.window_elapsed = 0.0;
        self.window_frames = 0;
        self.record_window(fps)
    }

    /// Close a window with the given average FPS and apply the tier rules
    pub fn record_window(&mut self, fps: f32) -> Option<QualityChange> {
        self.current_fps = fps;
        self.windows += 1;

        if let Some(sink) = self.sink.as_mut() {
            sink.record(MetricSample {
                timestamp_ms: (self.total_elapsed * 1000.0) as u64,
                fps,
                tier: self.tier,
            });
        }

        if self.warm_up {
            self.warm_up = false;
            return None;
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let (to, reason, cooldown) = if fps < self.config.min_fps && self.tier != QualityTier::Low {
            (
                self.tier.lower(),
                ChangeReason::LowFrameRate,
                self.config.downgrade_cooldown_windows,
            )
        } else if fps > self.config.target_fps * self.config.upgrade_factor
            && self.tier != QualityTier::High
        {
            (
                self.tier.higher(),
                ChangeReason::HighFrameRate,
                self.config.upgrade_cooldown_windows,
            )
        } else {
            return None;
        };

        let change = QualityChange {
            from: self.tier,
            to,
            fps,
            reason,
        };
        self.cooldown = cooldown;
        self.tier = change.to;
        self.warm_up = true;
        log::info!(
            "[PerformanceMonitor] {:?} -> {:?} at {:.1} fps",
            change.from,
            change.to,
            fps
        );
        if let Some(callback) = self.on_change.as_mut() {
            callback(change);
        }
        Some(change)
    }

    /// Force the tier. Skips evaluation of the next window and clears any
    /// pending cooldown. Does not fire the callback.
    pub fn set_quality_level(&mut self, tier: QualityTier) {
        self.tier = tier;
        self.cooldown = 0;
        self.warm_up = true;
        self.window_elapsed = 0.0;
        self.window_frames = 0;
    }

    pub fn current_tier(&self) -> QualityTier {
        self.tier
    }

    /// Average FPS of the last closed window (0 before the first)
    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn windows_recorded(&self) -> u64 {
        self.windows
    }

    pub fn remaining_cooldown(&self) -> u32 {
        self.cooldown
    }
}

//! Visualization orchestrator
//!
//! The public control surface. Owns the composer, the performance monitor,
//! the transition manager and the host tick subscription, and is driven by
//! one `update(dt)` call per host frame. Nothing here blocks: battery
//! readings and monitor tier changes arrive on channels and are applied on
//! the next tick.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::capability::{
    BatteryQuery, BatteryStatus, CapabilityProfile, CapabilityProfiler, HostEnvironment,
};
use crate::composer::{EffectKind, WeatherEffectComposer};
use crate::config::VisualizationConfig;
use crate::error::{Diagnostic, VisualizationError, VisualizationResult};
use crate::gpu::GpuContext;
use crate::profiling::{
    shared_metrics, MetricsSink, PerformanceMonitor, QualityChange, SharedMetrics,
};
use crate::quality::{
    is_low_battery, resolve_with_threshold, settings_for_tier, QualityOverride, QualityTier,
    VisualizationSettings,
};
use crate::scene::{SceneGraph, TickSource};
use crate::weather::{find_preset, EffectParameters, TransitionManager, WeatherState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Ready,
    Disposed,
}

/// Controls requested before `initialize()`, applied once it completes
#[derive(Debug, Default)]
struct PendingControls {
    tier: Option<QualityTier>,
    toggles: Vec<(EffectKind, bool)>,
    weather: Option<(WeatherState, EffectParameters)>,
}

pub struct VisualizationOrchestrator {
    config: VisualizationConfig,
    host: Box<dyn HostEnvironment>,
    scene: Option<Box<dyn SceneGraph>>,
    tick_source: Option<Box<dyn TickSource>>,
    metrics_sink: Option<Box<dyn MetricsSink>>,
    /// Built from `monitor.metrics_capacity` when no sink is injected
    metrics: Option<SharedMetrics>,
    quality_override: QualityOverride,
    lifecycle: Lifecycle,

    profile: Option<CapabilityProfile>,
    battery: Option<BatteryQuery>,
    composer: Option<WeatherEffectComposer>,
    monitor: Option<PerformanceMonitor>,
    quality_changes: Option<flume::Receiver<QualityChange>>,

    transitions: TransitionManager,
    transition_frame: Rc<Cell<Option<WeatherState>>>,
    current: Option<WeatherState>,
    intensity: f32,
    animation_speed: f32,

    pending: PendingControls,
    diagnostics: Vec<Diagnostic>,
}

impl VisualizationOrchestrator {
    pub fn new(
        config: VisualizationConfig,
        host: Box<dyn HostEnvironment>,
        scene: Box<dyn SceneGraph>,
    ) -> Self {
        Self {
            config: config.validated(),
            host,
            scene: Some(scene),
            tick_source: None,
            metrics_sink: None,
            metrics: None,
            quality_override: QualityOverride::default(),
            lifecycle: Lifecycle::Created,
            profile: None,
            battery: None,
            composer: None,
            monitor: None,
            quality_changes: None,
            transitions: TransitionManager::new(),
            transition_frame: Rc::new(Cell::new(None)),
            current: None,
            intensity: 1.0,
            animation_speed: 1.0,
            pending: PendingControls::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Frame loop to register with on `initialize()`
    pub fn with_tick_source(mut self, tick_source: Box<dyn TickSource>) -> Self {
        self.tick_source = Some(tick_source);
        self
    }

    /// Where per-window monitor samples go
    pub fn with_metrics_sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.metrics_sink = Some(sink);
        self
    }

    pub fn with_quality_override(mut self, quality_override: QualityOverride) -> Self {
        self.quality_override = quality_override;
        self
    }

    /// Profile the host (unless `profile` is given), resolve settings and
    /// build the composer. GPU failures degrade to the CPU engine and are
    /// reported through `take_diagnostics()`.
    pub fn initialize(&mut self, profile: Option<CapabilityProfile>) -> VisualizationResult<()> {
        match self.lifecycle {
            Lifecycle::Disposed => return Err(VisualizationError::Disposed),
            Lifecycle::Ready => {
                log::warn!("[Orchestrator] initialize() called twice, ignoring");
                return Ok(());
            }
            Lifecycle::Created => {}
        }

        let profile = match profile {
            Some(profile) => profile,
            None => {
                let report = CapabilityProfiler::new(self.host.as_ref()).profile();
                for probe in report.failed_probes {
                    self.report(Diagnostic::ProbeFailed(probe));
                }
                self.battery = report.battery;
                report.profile
            }
        };

        let mut quality_override = self.quality_override;
        if !self.config.quality.adaptive_quality && quality_override.adaptive_quality.is_none() {
            quality_override.adaptive_quality = Some(false);
        }
        if !self.config.particles.prefer_gpu {
            quality_override.use_gpu = Some(false);
        }
        let settings = resolve_with_threshold(
            &profile,
            Some(&quality_override),
            self.config.quality.low_battery_threshold,
        );

        let gpu = if settings.use_gpu {
            match GpuContext::new() {
                Ok(context) => Some(Arc::new(context)),
                Err(e) => {
                    self.report(Diagnostic::GpuFallback(e.to_string()));
                    None
                }
            }
        } else {
            None
        };

        let scene = self.scene.take().ok_or(VisualizationError::Disposed)?;
        let mut composer =
            WeatherEffectComposer::new(scene, settings, &self.config.particles, gpu);
        composer.set_animation_speed(self.animation_speed);
        composer.set_global_intensity(self.intensity);
        for (kind, enabled) in self.pending.toggles.drain(..) {
            composer.toggle_effect(kind, enabled);
        }

        if settings.adaptive_quality {
            let (tx, rx) = flume::unbounded();
            let mut monitor =
                PerformanceMonitor::new(self.config.monitor.clone(), settings.quality_tier);
            let sink: Box<dyn MetricsSink> = match self.metrics_sink.take() {
                Some(sink) => sink,
                None => {
                    let metrics = shared_metrics(self.config.monitor.metrics_capacity);
                    self.metrics = Some(Arc::clone(&metrics));
                    Box::new(metrics)
                }
            };
            monitor = monitor.with_sink(sink);
            monitor.on_quality_change(move |change| {
                // receiver lives as long as the orchestrator
                let _ = tx.send(change);
            });
            monitor.start();
            self.monitor = Some(monitor);
            self.quality_changes = Some(rx);
        }

        if let Some(tick_source) = self.tick_source.as_mut() {
            tick_source.register();
        }

        log::info!(
            "[Orchestrator] Initialized at {:?} quality on {:?} (adaptive: {})",
            settings.quality_tier,
            composer.backend(),
            settings.adaptive_quality
        );

        self.profile = Some(profile);
        self.composer = Some(composer);
        self.lifecycle = Lifecycle::Ready;

        if let Some(tier) = self.pending.tier.take() {
            self.set_quality(tier);
        }
        if let Some((state, style)) = self.pending.weather.take() {
            self.apply_immediately(state, style);
        }
        Ok(())
    }

    /// Apply weather now, cancelling any running transition
    pub fn update_weather(&mut self, state: WeatherState) {
        self.note_clamping(&state);
        self.cancel_transition();
        self.apply_immediately(state, EffectParameters::default());
    }

    /// Interpolate from the current weather to `state` over `duration_ms`.
    /// Replaces any transition already running.
    pub fn transition_to_weather(&mut self, state: WeatherState, duration_ms: u64) {
        self.note_clamping(&state);
        self.start_transition(state, EffectParameters::default(), duration_ms);
    }

    /// Look up a preset and move to it. Unknown ids leave the weather
    /// untouched; a duration of zero applies immediately.
    pub fn apply_preset(&mut self, id: &str, duration_ms: u64) -> VisualizationResult<()> {
        let Some(preset) = find_preset(id) else {
            self.report(Diagnostic::UnknownPreset(id.to_string()));
            return Err(VisualizationError::UnknownPreset(id.to_string()));
        };

        log::info!("[Orchestrator] Applying preset '{}' over {}ms", id, duration_ms);
        if duration_ms == 0 {
            self.cancel_transition();
            self.apply_immediately(preset.conditions, preset.parameters);
        } else {
            self.start_transition(preset.conditions, preset.parameters, duration_ms);
        }
        Ok(())
    }

    /// Force a quality tier. A known low battery pins the tier to Low.
    pub fn set_quality(&mut self, tier: QualityTier) {
        let (Some(composer), Some(profile)) = (self.composer.as_mut(), self.profile.as_ref())
        else {
            if self.lifecycle == Lifecycle::Created {
                self.pending.tier = Some(tier);
            }
            return;
        };

        let tier = if tier != QualityTier::Low
            && is_low_battery(profile, self.config.quality.low_battery_threshold)
        {
            log::warn!("[Orchestrator] Battery low, keeping Low quality instead of {:?}", tier);
            QualityTier::Low
        } else {
            tier
        };

        if let Some(monitor) = self.monitor.as_mut() {
            monitor.set_quality_level(tier);
        }
        let current = *composer.settings();
        if current.quality_tier == tier {
            return;
        }
        composer.set_settings(VisualizationSettings {
            use_gpu: current.use_gpu,
            adaptive_quality: current.adaptive_quality,
            ..settings_for_tier(tier, profile)
        });
    }

    pub fn toggle_effect(&mut self, kind: EffectKind, enabled: bool) {
        match (self.lifecycle, self.composer.as_mut()) {
            (Lifecycle::Ready, Some(composer)) => composer.toggle_effect(kind, enabled),
            (Lifecycle::Created, _) => {
                self.pending.toggles.retain(|(k, _)| *k != kind);
                self.pending.toggles.push((kind, enabled));
            }
            _ => {}
        }
    }

    /// Global effect intensity, clamped to [0, 1]
    pub fn set_intensity(&mut self, intensity: f32) -> VisualizationResult<()> {
        if !intensity.is_finite() {
            return Err(VisualizationError::InvalidArgument {
                name: "intensity".to_string(),
                reason: format!("{intensity} is not a finite number"),
            });
        }
        self.intensity = intensity.clamp(0.0, 1.0);
        if let Some(composer) = self.composer.as_mut() {
            composer.set_global_intensity(self.intensity);
        }
        Ok(())
    }

    /// Animation speed multiplier, clamped to [0.1, 2]
    pub fn set_animation_speed(&mut self, speed: f32) -> VisualizationResult<()> {
        if !speed.is_finite() {
            return Err(VisualizationError::InvalidArgument {
                name: "animation_speed".to_string(),
                reason: format!("{speed} is not a finite number"),
            });
        }
        self.animation_speed = speed.clamp(
            crate::constants::particles::MIN_ANIMATION_SPEED,
            crate::constants::particles::MAX_ANIMATION_SPEED,
        );
        if let Some(composer) = self.composer.as_mut() {
            composer.set_animation_speed(self.animation_speed);
        }
        Ok(())
    }

    /// Advance one host frame of `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.lifecycle != Lifecycle::Ready {
            return;
        }
        if !dt.is_finite() || dt < 0.0 {
            log::debug!("[Orchestrator] Ignoring frame with dt={}", dt);
            return;
        }

        self.poll_battery();

        if self.transitions.update(dt) {
            log::debug!("[Orchestrator] Weather transition finished");
        }
        if let Some(frame) = self.transition_frame.take() {
            self.apply_state(frame);
        }

        if let Some(composer) = self.composer.as_mut() {
            composer.update(dt);
            for diagnostic in composer.take_diagnostics() {
                self.diagnostics.push(diagnostic);
            }
        }

        if let (Some(monitor), Ok(frame_time)) =
            (self.monitor.as_mut(), Duration::try_from_secs_f32(dt))
        {
            monitor.record_frame(frame_time);
        }
        self.apply_quality_changes();
    }

    /// Stop everything and release all engines. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        if let Some(mut monitor) = self.monitor.take() {
            monitor.dispose();
        }
        self.quality_changes = None;
        self.transitions.dispose();
        self.transition_frame.set(None);

        if let Some(mut composer) = self.composer.take() {
            composer.dispose();
            self.diagnostics.extend(composer.take_diagnostics());
        }
        if let Some(query) = self.battery.take() {
            if let BatteryStatus::Resolved(_) = query.poll() {
                self.report(Diagnostic::BatteryDiscarded);
            }
        }
        if self.lifecycle == Lifecycle::Ready {
            if let Some(tick_source) = self.tick_source.as_mut() {
                tick_source.unregister();
            }
        }
        self.scene = None;
        self.pending = PendingControls::default();
        self.lifecycle = Lifecycle::Disposed;
        log::info!("[Orchestrator] Disposed");
    }

    /// Drain degradations reported since the last call
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        if let Some(composer) = self.composer.as_mut() {
            self.diagnostics.extend(composer.take_diagnostics());
        }
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Weather most recently applied (or requested, before initialization)
    pub fn current_weather(&self) -> Option<WeatherState> {
        match self.lifecycle {
            Lifecycle::Created => self.pending.weather.map(|(state, _)| state),
            _ => self.current,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitions.is_active()
    }

    pub fn settings(&self) -> Option<&VisualizationSettings> {
        self.composer.as_ref().map(|c| c.settings())
    }

    pub fn quality_tier(&self) -> Option<QualityTier> {
        self.settings().map(|s| s.quality_tier)
    }

    pub fn profile(&self) -> Option<&CapabilityProfile> {
        self.profile.as_ref()
    }

    pub fn composer(&self) -> Option<&WeatherEffectComposer> {
        self.composer.as_ref()
    }

    pub fn composer_mut(&mut self) -> Option<&mut WeatherEffectComposer> {
        self.composer.as_mut()
    }

    pub fn monitor(&self) -> Option<&PerformanceMonitor> {
        self.monitor.as_ref()
    }

    /// Built-in sample buffer, present only when no sink was injected
    pub fn metrics(&self) -> Option<&SharedMetrics> {
        self.metrics.as_ref()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    fn start_transition(&mut self, target: WeatherState, style: EffectParameters, duration_ms: u64) {
        let target = target.clamped();
        match (self.lifecycle, self.current) {
            (Lifecycle::Ready, Some(start)) => {
                if let Some(composer) = self.composer.as_mut() {
                    composer.set_style(style);
                }
                let frame = Rc::clone(&self.transition_frame);
                self.transitions
                    .transition_to(start, target, duration_ms, move |state| {
                        frame.set(Some(*state))
                    });
            }
            // Nothing on screen yet to interpolate from
            _ => {
                self.cancel_transition();
                self.apply_immediately(target, style);
            }
        }
    }

    fn cancel_transition(&mut self) {
        self.transitions.cancel();
        self.transition_frame.set(None);
    }

    fn apply_immediately(&mut self, state: WeatherState, style: EffectParameters) {
        match self.lifecycle {
            Lifecycle::Created => self.pending.weather = Some((state.clamped(), style)),
            Lifecycle::Ready => {
                if let Some(composer) = self.composer.as_mut() {
                    composer.set_style(style);
                }
                self.apply_state(state);
            }
            Lifecycle::Disposed => {}
        }
    }

    fn apply_state(&mut self, state: WeatherState) {
        let state = state.clamped();
        if let Some(composer) = self.composer.as_mut() {
            composer.apply(&state, self.intensity);
        }
        self.current = Some(state);
    }

    fn note_clamping(&mut self, state: &WeatherState) {
        if state.is_out_of_range() {
            self.report(Diagnostic::InputClamped);
        }
    }

    fn poll_battery(&mut self) {
        let Some(query) = self.battery.as_ref() else {
            return;
        };
        let level = match query.poll() {
            BatteryStatus::Pending => return,
            BatteryStatus::Abandoned => {
                log::debug!("[Orchestrator] Battery query abandoned by host");
                self.battery = None;
                return;
            }
            BatteryStatus::Resolved(level) => level,
        };
        self.battery = None;

        let Some(profile) = self.profile.map(|p| p.with_battery_level(level)) else {
            return;
        };
        self.profile = Some(profile);
        log::info!("[Orchestrator] Battery level resolved: {:?}", profile.battery_level);

        let threshold = self.config.quality.low_battery_threshold;
        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        if !is_low_battery(&profile, threshold) {
            return;
        }

        let current = *composer.settings();
        let low = resolve_with_threshold(&profile, Some(&self.quality_override), threshold);
        if low.quality_tier != current.quality_tier
            || low.particle_multiplier != current.particle_multiplier
        {
            log::warn!("[Orchestrator] Low battery, dropping to {:?}", low.quality_tier);
            composer.set_settings(VisualizationSettings {
                use_gpu: current.use_gpu,
                adaptive_quality: current.adaptive_quality,
                ..low
            });
            if let Some(monitor) = self.monitor.as_mut() {
                monitor.set_quality_level(low.quality_tier);
            }
        }
    }

    fn apply_quality_changes(&mut self) {
        let Some(changes) = self.quality_changes.as_ref() else {
            return;
        };
        let changes: Vec<QualityChange> = changes.try_iter().collect();
        for change in changes {
            let (Some(composer), Some(profile)) = (self.composer.as_mut(), self.profile.as_ref())
            else {
                return;
            };
            let current = *composer.settings();
            if change.to > current.quality_tier
                && is_low_battery(profile, self.config.quality.low_battery_threshold)
            {
                log::debug!("[Orchestrator] Ignoring upgrade to {:?} on low battery", change.to);
                if let Some(monitor) = self.monitor.as_mut() {
                    monitor.set_quality_level(current.quality_tier);
                }
                continue;
            }
            composer.set_settings(VisualizationSettings {
                use_gpu: current.use_gpu,
                adaptive_quality: current.adaptive_quality,
                ..settings_for_tier(change.to, profile)
            });
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("[Orchestrator] {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

impl Drop for VisualizationOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ProbeError;
    use crate::scene::NullScene;

    struct FixedHost;

    impl HostEnvironment for FixedHost {
        fn is_mobile(&self) -> Result<bool, ProbeError> {
            Ok(false)
        }
        fn supports_compute(&self) -> Result<bool, ProbeError> {
            Ok(false)
        }
        fn supports_float_buffers(&self) -> Result<bool, ProbeError> {
            Ok(false)
        }
        fn logical_cores(&self) -> Result<usize, ProbeError> {
            Ok(4)
        }
        fn device_memory_gb(&self) -> Result<f32, ProbeError> {
            Err(ProbeError::Unsupported)
        }
        fn is_low_power_mode(&self) -> Result<bool, ProbeError> {
            Ok(false)
        }
    }

    fn small_config() -> VisualizationConfig {
        let mut config = VisualizationConfig::default();
        config.particles.rain_base_count = 200;
        config.particles.snow_base_count = 100;
        config.particles.prefer_gpu = false;
        config
    }

    fn orchestrator() -> VisualizationOrchestrator {
        VisualizationOrchestrator::new(small_config(), Box::new(FixedHost), Box::new(NullScene::default()))
    }

    #[test]
    fn test_initialize_profiles_host() {
        let mut orch = orchestrator();
        orch.initialize(None).unwrap();
        assert!(orch.is_initialized());
        assert_eq!(orch.quality_tier(), Some(QualityTier::Medium));
        assert!(orch.monitor().unwrap().is_running());
        assert_eq!(
            orch.take_diagnostics(),
            vec![Diagnostic::ProbeFailed("device_memory_gb")]
        );
    }

    #[test]
    fn test_unknown_preset_leaves_weather_untouched() {
        let mut orch = orchestrator();
        orch.initialize(Some(CapabilityProfile::conservative())).unwrap();
        orch.apply_preset("lightRain", 0).unwrap();
        let before = orch.current_weather();

        let err = orch.apply_preset("doesNotExist", 0).unwrap_err();
        assert!(matches!(err, VisualizationError::UnknownPreset(_)));
        assert_eq!(orch.current_weather(), before);
        assert!(orch
            .take_diagnostics()
            .contains(&Diagnostic::UnknownPreset("doesNotExist".to_string())));
    }

    #[test]
    fn test_setters_before_initialize_are_buffered() {
        let mut orch = orchestrator();
        orch.set_intensity(0.5).unwrap();
        orch.set_quality(QualityTier::Low);
        orch.toggle_effect(EffectKind::Fog, false);
        orch.apply_preset("heavyRain", 2000).unwrap();
        assert!(orch.composer().is_none());

        orch.initialize(Some(CapabilityProfile::conservative())).unwrap();
        let composer = orch.composer().unwrap();
        assert_eq!(composer.settings().quality_tier, QualityTier::Low);
        assert!(!composer.is_enabled(EffectKind::Fog));
        assert!(composer.active_effects().rain);
        let rain = composer.effect_intensity(EffectKind::Rain).unwrap();
        assert!((rain - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_transition_reaches_target() {
        let mut orch = orchestrator();
        orch.initialize(Some(CapabilityProfile::conservative())).unwrap();
        orch.update_weather(WeatherState::clear());

        let target = find_preset("heavySnow").unwrap().conditions;
        orch.transition_to_weather(target, 1000);
        assert!(orch.is_transitioning());
        for _ in 0..70 {
            orch.update(1.0 / 60.0);
        }
        assert!(!orch.is_transitioning());
        assert_eq!(orch.current_weather(), Some(target.clamped()));
        assert!(orch.composer().unwrap().active_effects().snow);
    }

    #[test]
    fn test_update_weather_cancels_transition() {
        let mut orch = orchestrator();
        orch.initialize(Some(CapabilityProfile::conservative())).unwrap();
        orch.update_weather(WeatherState::clear());
        orch.apply_preset("thunderstorm", 5000).unwrap();
        orch.update(0.1);

        let calm = WeatherState::clear();
        orch.update_weather(calm);
        assert!(!orch.is_transitioning());
        orch.update(0.1);
        assert_eq!(orch.current_weather(), Some(calm));
    }

    #[test]
    fn test_invalid_setter_arguments() {
        let mut orch = orchestrator();
        assert!(orch.set_intensity(f32::NAN).is_err());
        orch.set_intensity(3.0).unwrap();
        assert_eq!(orch.intensity(), 1.0);
        orch.set_animation_speed(0.0).unwrap();
        assert_eq!(orch.animation_speed(), 0.1);
        assert!(orch.set_animation_speed(f32::INFINITY).is_err());
    }

    #[test]
    fn test_dispose_is_idempotent_and_final() {
        let mut orch = orchestrator();
        orch.initialize(Some(CapabilityProfile::conservative())).unwrap();
        orch.apply_preset("heavyRain", 0).unwrap();
        orch.dispose();
        orch.dispose();
        assert!(orch.is_disposed());
        assert!(orch.composer().is_none());
        orch.update(0.016);
        assert!(matches!(orch.initialize(None), Err(VisualizationError::Disposed)));
    }

    #[test]
    fn test_low_battery_blocks_forced_upgrade() {
        let mut orch = orchestrator();
        let profile = CapabilityProfile::conservative().with_battery_level(0.1);
        orch.initialize(Some(profile)).unwrap();
        assert_eq!(orch.quality_tier(), Some(QualityTier::Low));
        orch.set_quality(QualityTier::High);
        assert_eq!(orch.quality_tier(), Some(QualityTier::Low));
    }

    #[test]
    fn test_duplicate_ticks_do_not_raise_quality() {
        let mut orch = orchestrator();
        orch.initialize(None).unwrap();
        assert_eq!(orch.quality_tier(), Some(QualityTier::Medium));

        // 40 real fps with two empty ticks after every frame
        for _ in 0..250 {
            orch.update(1.0 / 40.0);
            orch.update(0.0);
            orch.update(0.0);
        }
        let monitor = orch.monitor().unwrap();
        assert_eq!(monitor.windows_recorded(), 1);
        assert!(monitor.current_fps() < 45.0);
        assert_eq!(orch.quality_tier(), Some(QualityTier::Medium));
    }

    #[test]
    fn test_forcing_current_tier_clears_cooldown() {
        let mut orch = orchestrator();
        orch.initialize(None).unwrap();
        for _ in 0..101 {
            orch.update(0.05);
        }
        assert_eq!(orch.quality_tier(), Some(QualityTier::Low));
        assert_eq!(orch.monitor().unwrap().remaining_cooldown(), 3);

        orch.set_quality(QualityTier::Low);
        assert_eq!(orch.quality_tier(), Some(QualityTier::Low));
        assert_eq!(orch.monitor().unwrap().remaining_cooldown(), 0);
    }

    #[test]
    fn test_default_metrics_buffer_uses_configured_capacity() {
        let mut config = small_config();
        config.monitor.metrics_capacity = 2;
        let mut orch =
            VisualizationOrchestrator::new(config, Box::new(FixedHost), Box::new(NullScene::default()));
        orch.initialize(None).unwrap();

        for _ in 0..(3 * 101) {
            orch.update(0.05);
        }
        let metrics = orch.metrics().unwrap().lock();
        assert_eq!(metrics.capacity(), 2);
        assert_eq!(metrics.len(), 2);
    }

}

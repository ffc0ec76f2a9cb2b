/// Orchestrator Integration Tests
///
/// Drives the public control surface against a recording scene graph and a
/// scripted host, the way an embedding application would.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use weather_viz_engine::capability::ProbeError;
use weather_viz_engine::profiling::shared_metrics;
use weather_viz_engine::scene::{NodeId, NodeUniforms, RenderNode, SceneGraph, TickSource};
use weather_viz_engine::{
    find_preset, resolve, CapabilityProfile, Diagnostic, EffectKind, EngineBackend,
    HostEnvironment, PrecipitationKind, QualityTier, VisualizationConfig,
    VisualizationOrchestrator, WeatherState,
};

#[derive(Debug, Clone, PartialEq)]
enum SceneEvent {
    Attach(NodeId, RenderNode),
    Detach(NodeId),
}

#[derive(Clone, Default)]
struct RecordingScene {
    events: Rc<RefCell<Vec<SceneEvent>>>,
    next_id: Rc<RefCell<NodeId>>,
}

impl RecordingScene {
    fn attached(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SceneEvent::Attach(..)))
            .count()
    }

    fn detached(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SceneEvent::Detach(_)))
            .count()
    }

    fn particle_capacities(&self) -> Vec<usize> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SceneEvent::Attach(_, RenderNode::Particles { capacity, .. }) => Some(*capacity),
                _ => None,
            })
            .collect()
    }
}

impl SceneGraph for RecordingScene {
    fn attach(&mut self, node: RenderNode) -> NodeId {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        self.events.borrow_mut().push(SceneEvent::Attach(*next, node));
        *next
    }

    fn update(&mut self, _id: NodeId, _uniforms: &NodeUniforms) {}

    fn detach(&mut self, id: NodeId) {
        self.events.borrow_mut().push(SceneEvent::Detach(id));
    }
}

#[derive(Clone, Default)]
struct CountingTicker {
    registered: Rc<RefCell<i32>>,
    unregistered: Rc<RefCell<i32>>,
}

impl TickSource for CountingTicker {
    fn register(&mut self) {
        *self.registered.borrow_mut() += 1;
    }

    fn unregister(&mut self) {
        *self.unregistered.borrow_mut() += 1;
    }
}

/// Desktop host whose battery reading is delivered by the test
struct ScriptedHost {
    battery: Option<flume::Receiver<f32>>,
}

impl HostEnvironment for ScriptedHost {
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
        Ok(16)
    }
    fn device_memory_gb(&self) -> Result<f32, ProbeError> {
        Ok(32.0)
    }
    fn is_low_power_mode(&self) -> Result<bool, ProbeError> {
        Ok(false)
    }
    fn request_battery_level(&self) -> Option<flume::Receiver<f32>> {
        self.battery.clone()
    }
}

fn test_config() -> VisualizationConfig {
    let mut config = VisualizationConfig::default();
    config.particles.rain_base_count = 200;
    config.particles.snow_base_count = 120;
    config.particles.prefer_gpu = false;
    config
}

fn high_end_cpu_profile() -> CapabilityProfile {
    CapabilityProfile {
        is_high_end: true,
        ..CapabilityProfile::conservative()
    }
}

fn build(scene: &RecordingScene) -> VisualizationOrchestrator {
    VisualizationOrchestrator::new(
        test_config(),
        Box::new(ScriptedHost { battery: None }),
        Box::new(scene.clone()),
    )
}

#[test]
fn test_mobile_without_compute_resolves_low() {
    let profile = CapabilityProfile {
        is_mobile: true,
        has_compute: false,
        ..CapabilityProfile::conservative()
    };
    let settings = resolve(&profile, None);
    assert_eq!(settings.quality_tier, QualityTier::Low);
    assert!(!settings.shadows_enabled);
    assert_eq!(settings.particle_multiplier, 0.5);

    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(profile)).unwrap();
    assert_eq!(orchestrator.settings(), Some(&settings));
    assert_eq!(orchestrator.composer().unwrap().backend(), EngineBackend::Cpu);
}

#[test]
fn test_heavy_rain_preset_scales_with_global_intensity() {
    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();

    for global in [1.0, 0.5, 0.25] {
        orchestrator.set_intensity(global).unwrap();
        orchestrator.apply_preset("heavyRain", 0).unwrap();
        let composer = orchestrator.composer().unwrap();
        assert!(composer.active_effects().rain);
        assert!(!composer.active_effects().snow);
        let rain = composer.effect_intensity(EffectKind::Rain).unwrap();
        assert!((rain - 0.8 * global).abs() < 1e-5, "global {global}: {rain}");
    }
}

#[test]
fn test_reapplying_preset_allocates_nothing() {
    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();

    orchestrator.apply_preset("thunderstorm", 0).unwrap();
    let attached = scene.attached();
    let composer = orchestrator.composer().unwrap();
    let ids: Vec<_> = EffectKind::ALL
        .iter()
        .map(|kind| composer.instance_id(*kind))
        .collect();
    assert!(composer.active_effects().lightning);

    orchestrator.apply_preset("thunderstorm", 0).unwrap();
    assert_eq!(scene.attached(), attached);
    let composer = orchestrator.composer().unwrap();
    let again: Vec<_> = EffectKind::ALL
        .iter()
        .map(|kind| composer.instance_id(*kind))
        .collect();
    assert_eq!(ids, again);
}

#[test]
fn test_unknown_preset_reports_and_keeps_state() {
    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();
    orchestrator.apply_preset("foggy", 0).unwrap();
    orchestrator.take_diagnostics();

    let before = orchestrator.current_weather();
    let events = scene.events.borrow().len();
    assert!(orchestrator.apply_preset("doesNotExist", 0).is_err());
    assert_eq!(orchestrator.current_weather(), before);
    assert_eq!(scene.events.borrow().len(), events);
    assert_eq!(
        orchestrator.take_diagnostics(),
        vec![Diagnostic::UnknownPreset("doesNotExist".to_string())]
    );
}

#[test]
fn test_slow_frames_downgrade_once_and_rebuild_pools() {
    let scene = RecordingScene::default();
    let metrics = shared_metrics(100);
    let mut orchestrator = VisualizationOrchestrator::new(
        test_config(),
        Box::new(ScriptedHost { battery: None }),
        Box::new(scene.clone()),
    )
    .with_metrics_sink(Box::new(Arc::clone(&metrics)));
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();
    orchestrator.apply_preset("heavyRain", 0).unwrap();
    assert_eq!(orchestrator.quality_tier(), Some(QualityTier::High));

    // Five windows at 25 fps
    for _ in 0..(5 * 5 * 25 + 10) {
        orchestrator.update(1.0 / 25.0);
    }

    assert_eq!(orchestrator.quality_tier(), Some(QualityTier::Medium));
    assert_eq!(metrics.lock().len(), 5);
    // High pool first, then the Medium rebuild
    assert_eq!(scene.particle_capacities(), vec![300, 200]);
    let rain = orchestrator
        .composer()
        .unwrap()
        .particle_engine(PrecipitationKind::Rain)
        .unwrap();
    assert_eq!(rain.capacity(), 200);
}

#[test]
fn test_low_battery_arriving_later_forces_low() {
    let (tx, rx) = flume::unbounded();
    let scene = RecordingScene::default();
    let mut orchestrator = VisualizationOrchestrator::new(
        test_config(),
        Box::new(ScriptedHost { battery: Some(rx) }),
        Box::new(scene.clone()),
    );
    orchestrator.initialize(None).unwrap();
    assert_eq!(orchestrator.quality_tier(), Some(QualityTier::High));
    assert_eq!(orchestrator.profile().unwrap().battery_level, None);

    orchestrator.update(0.016);
    assert_eq!(orchestrator.quality_tier(), Some(QualityTier::High));

    tx.send(0.1).unwrap();
    orchestrator.update(0.016);
    let settings = orchestrator.settings().unwrap();
    assert_eq!(settings.quality_tier, QualityTier::Low);
    assert_eq!(settings.particle_multiplier, 0.2);
    assert_eq!(orchestrator.profile().unwrap().battery_level, Some(0.1));

    // Explicit upgrades stay pinned while the battery is low
    orchestrator.set_quality(QualityTier::High);
    assert_eq!(orchestrator.quality_tier(), Some(QualityTier::Low));
}

#[test]
fn test_battery_reading_after_dispose_is_discarded() {
    let (tx, rx) = flume::unbounded();
    let scene = RecordingScene::default();
    let mut orchestrator = VisualizationOrchestrator::new(
        test_config(),
        Box::new(ScriptedHost { battery: Some(rx) }),
        Box::new(scene.clone()),
    );
    orchestrator.initialize(None).unwrap();
    orchestrator.take_diagnostics();

    tx.send(0.05).unwrap();
    orchestrator.dispose();
    assert_eq!(orchestrator.take_diagnostics(), vec![Diagnostic::BatteryDiscarded]);
    assert!(orchestrator.profile().unwrap().battery_level.is_none());
}

#[test]
fn test_dispose_detaches_everything_and_unregisters_once() {
    let scene = RecordingScene::default();
    let ticker = CountingTicker::default();
    let mut orchestrator = build(&scene).with_tick_source(Box::new(ticker.clone()));
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();
    assert_eq!(*ticker.registered.borrow(), 1);

    orchestrator.apply_preset("thunderstorm", 0).unwrap();
    orchestrator.update(0.016);
    assert!(scene.attached() > 0);

    orchestrator.dispose();
    orchestrator.dispose();
    drop(orchestrator);
    assert_eq!(scene.attached(), scene.detached());
    assert_eq!(*ticker.unregistered.borrow(), 1);
}

#[test]
fn test_transition_between_presets_is_smooth() {
    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();
    orchestrator.apply_preset("clearSky", 0).unwrap();

    let start = orchestrator.current_weather().unwrap();
    let end = find_preset("lightSnow").unwrap().conditions;
    orchestrator.apply_preset("lightSnow", 1000).unwrap();

    let mut last_temperature = start.temperature;
    while orchestrator.is_transitioning() {
        orchestrator.update(0.05);
        let frame = orchestrator.current_weather().unwrap();
        assert!(frame.temperature <= last_temperature + 1e-4);
        assert!(frame.temperature >= end.temperature - 1e-4);
        last_temperature = frame.temperature;
    }
    assert_eq!(orchestrator.current_weather(), Some(end));
    assert!(orchestrator.composer().unwrap().active_effects().snow);
}

#[test]
fn test_out_of_range_input_is_clamped() {
    let scene = RecordingScene::default();
    let mut orchestrator = build(&scene);
    orchestrator.initialize(Some(high_end_cpu_profile())).unwrap();

    let wild = WeatherState {
        precipitation: f32::NAN,
        wind_speed: 1e9,
        visibility: -10.0,
        ..WeatherState::clear()
    };
    orchestrator.update_weather(wild);
    let applied = orchestrator.current_weather().unwrap();
    assert_eq!(applied.wind_speed, 200.0);
    assert_eq!(applied.visibility, 0.0);
    assert!(applied.precipitation.is_finite());
    assert!(orchestrator
        .take_diagnostics()
        .contains(&Diagnostic::InputClamped));
}

#[test]
fn test_gpu_request_falls_back_or_runs_on_gpu() {
    let mut config = test_config();
    config.particles.prefer_gpu = true;
    let profile = CapabilityProfile {
        has_compute: true,
        supports_float_buffers: true,
        ..high_end_cpu_profile()
    };

    let scene = RecordingScene::default();
    let mut orchestrator = VisualizationOrchestrator::new(
        config,
        Box::new(ScriptedHost { battery: None }),
        Box::new(scene.clone()),
    );
    orchestrator.initialize(Some(profile)).unwrap();
    orchestrator.apply_preset("heavyRain", 0).unwrap();
    orchestrator.update(0.016);

    let diagnostics = orchestrator.take_diagnostics();
    let composer = orchestrator.composer().unwrap();
    match composer.backend() {
        EngineBackend::Gpu => assert!(composer.settings().use_gpu),
        EngineBackend::Cpu => {
            println!("No usable GPU - checking CPU fallback");
            assert!(!composer.settings().use_gpu);
            assert!(diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::GpuFallback(_))));
        }
    }
    assert!(composer.active_effects().rain);
}

//! Headless weather demo
//!
//! Runs the orchestrator through every preset on a logging scene at a fixed
//! 60 Hz tick and prints the collected frame-rate samples as JSON.
//!
//! Usage: weather_demo [config.toml]

use std::sync::Arc;
use std::time::Instant;

use weather_viz_engine::profiling::shared_metrics;
use weather_viz_engine::scene::{NodeId, NodeUniforms, RenderNode, SceneGraph, TickSource};
use weather_viz_engine::weather::PRESET_IDS;
use weather_viz_engine::{NativeHost, VisualizationConfig, VisualizationOrchestrator};

const TICK: f32 = 1.0 / 60.0;
const SECONDS_PER_PRESET: f32 = 6.0;

/// Scene that logs node lifecycle instead of drawing
#[derive(Default)]
struct LoggingScene {
    next_id: NodeId,
    updates: u64,
}

impl SceneGraph for LoggingScene {
    fn attach(&mut self, node: RenderNode) -> NodeId {
        self.next_id += 1;
        log::info!("[Scene] attach #{} {:?}", self.next_id, node);
        self.next_id
    }

    fn update(&mut self, id: NodeId, uniforms: &NodeUniforms) {
        self.updates += 1;
        if self.updates % 600 == 0 {
            log::debug!("[Scene] update #{} {:?}", id, uniforms);
        }
    }

    fn detach(&mut self, id: NodeId) {
        log::info!("[Scene] detach #{}", id);
    }
}

struct LoopTicker;

impl TickSource for LoopTicker {
    fn register(&mut self) {
        log::info!("[Demo] Frame loop registered");
    }

    fn unregister(&mut self) {
        log::info!("[Demo] Frame loop unregistered");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => VisualizationConfig::load(&path)?,
        None => VisualizationConfig::default(),
    };
    let transition_ms = config.transitions.default_duration_ms;

    let metrics = shared_metrics(config.monitor.metrics_capacity);
    let mut orchestrator = VisualizationOrchestrator::new(
        config,
        Box::new(NativeHost::new()),
        Box::new(LoggingScene::default()),
    )
    .with_tick_source(Box::new(LoopTicker))
    .with_metrics_sink(Box::new(Arc::clone(&metrics)));

    orchestrator.initialize(None)?;
    for diagnostic in orchestrator.take_diagnostics() {
        println!("diagnostic: {diagnostic}");
    }

    let ticks_per_preset = (SECONDS_PER_PRESET / TICK) as usize;
    for id in PRESET_IDS {
        orchestrator.apply_preset(id, transition_ms)?;

        let started = Instant::now();
        for _ in 0..ticks_per_preset {
            let frame = Instant::now();
            orchestrator.update(TICK);
            let spent = frame.elapsed().as_secs_f32();
            if spent > TICK {
                log::debug!("[Demo] Frame over budget: {:.2}ms", spent * 1000.0);
            }
        }

        let composer = orchestrator
            .composer()
            .ok_or_else(|| anyhow::anyhow!("orchestrator lost its composer"))?;
        println!(
            "{:<14} tier={:?} backend={:?} effects={:?} ({:.2}s wall)",
            id,
            composer.settings().quality_tier,
            composer.backend(),
            composer.active_effects(),
            started.elapsed().as_secs_f32()
        );
    }

    for diagnostic in orchestrator.take_diagnostics() {
        println!("diagnostic: {diagnostic}");
    }
    orchestrator.dispose();

    println!("{}", metrics.lock().to_json()?);
    Ok(())
}

//! Weather Effect Composer
//!
//! Maps a `WeatherState` onto the set of live effects. Effects are created on
//! an inactive -> active edge, disposed on active -> inactive, and only have
//! their uniforms refreshed while they stay active, so applying the same state
//! twice never reallocates anything.

pub mod atmosphere;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ParticleConfig;
use crate::constants::activation::{
    CLOUD_COVER_THRESHOLD, FOG_VISIBILITY, FREEZING_POINT, PRECIPITATION_THRESHOLD,
    WIND_STRENGTH_THRESHOLD,
};
use crate::constants::particles::{MAX_ANIMATION_SPEED, MIN_ANIMATION_SPEED};
use crate::error::{Diagnostic, VisualizationResult};
use crate::gpu::GpuContext;
use crate::particles::engine::next_instance_id;
use crate::particles::{
    create_engine, EngineBackend, GlobalParams, Particle, ParticleEngine, ParticleRenderSource,
    PrecipitationKind, SimulationBounds,
};
use crate::quality::VisualizationSettings;
use crate::scene::{NodeId, NodeUniforms, RenderNode, SceneGraph};
use crate::weather::{EffectParameters, WeatherState, WindField};

pub use atmosphere::{AtmosphereEffect, CloudLayer, FogLayer, LightningFlash, WindEffect};

/// Every effect the composer can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Rain,
    Snow,
    Fog,
    Clouds,
    Lightning,
    Wind,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Rain,
        EffectKind::Snow,
        EffectKind::Fog,
        EffectKind::Clouds,
        EffectKind::Lightning,
        EffectKind::Wind,
    ];

    fn precipitation(self) -> Option<PrecipitationKind> {
        match self {
            EffectKind::Rain => Some(PrecipitationKind::Rain),
            EffectKind::Snow => Some(PrecipitationKind::Snow),
            _ => None,
        }
    }
}

/// Which effects a weather state calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActiveEffects {
    pub rain: bool,
    pub snow: bool,
    pub fog: bool,
    pub clouds: bool,
    pub lightning: bool,
    pub wind: bool,
}

impl ActiveEffects {
    pub fn from_state(state: &WeatherState) -> Self {
        let wet = state.precipitation > PRECIPITATION_THRESHOLD;
        Self {
            rain: wet && state.temperature > FREEZING_POINT,
            snow: wet && state.temperature <= FREEZING_POINT,
            fog: state.visibility < FOG_VISIBILITY,
            clouds: state.cloud_cover > CLOUD_COVER_THRESHOLD,
            lightning: state.storm,
            wind: state.wind_strength() > WIND_STRENGTH_THRESHOLD,
        }
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Rain => self.rain,
            EffectKind::Snow => self.snow,
            EffectKind::Fog => self.fog,
            EffectKind::Clouds => self.clouds,
            EffectKind::Lightning => self.lightning,
            EffectKind::Wind => self.wind,
        }
    }

    /// Drop effects the host switched off
    fn without(mut self, disabled: &HashSet<EffectKind>) -> Self {
        for kind in disabled {
            match kind {
                EffectKind::Rain => self.rain = false,
                EffectKind::Snow => self.snow = false,
                EffectKind::Fog => self.fog = false,
                EffectKind::Clouds => self.clouds = false,
                EffectKind::Lightning => self.lightning = false,
                EffectKind::Wind => self.wind = false,
            }
        }
        self
    }
}

/// Unscaled strength of an effect for a weather state
pub fn raw_intensity(kind: EffectKind, state: &WeatherState) -> f32 {
    match kind {
        EffectKind::Rain | EffectKind::Snow => state.precipitation,
        EffectKind::Fog => (FOG_VISIBILITY - state.visibility) / FOG_VISIBILITY,
        EffectKind::Clouds => state.cloud_cover,
        EffectKind::Lightning => 1.0,
        EffectKind::Wind => state.wind_strength(),
    }
}

/// `min(1, raw) * global`, never negative
pub fn effect_intensity(raw: f32, global_intensity: f32) -> f32 {
    raw.clamp(0.0, 1.0) * global_intensity.clamp(0.0, 1.0)
}

struct ParticleSlot {
    node: NodeId,
    engine: Box<dyn ParticleEngine>,
}

struct AtmosphereSlot<T> {
    node: NodeId,
    instance_id: u64,
    intensity: f32,
    effect: T,
}

pub struct WeatherEffectComposer {
    scene: Box<dyn SceneGraph>,
    gpu: Option<Arc<GpuContext>>,
    settings: VisualizationSettings,
    rain_base_count: usize,
    snow_base_count: usize,
    bounds: SimulationBounds,

    state: Option<WeatherState>,
    style: EffectParameters,
    global_intensity: f32,
    animation_speed: f32,
    disabled: HashSet<EffectKind>,

    rain: Option<ParticleSlot>,
    snow: Option<ParticleSlot>,
    fog: Option<AtmosphereSlot<FogLayer>>,
    clouds: Option<AtmosphereSlot<CloudLayer>>,
    lightning: Option<AtmosphereSlot<LightningFlash>>,
    wind: Option<AtmosphereSlot<WindEffect>>,

    wind_field: WindField,
    time: f32,
    diagnostics: Vec<Diagnostic>,
}

impl WeatherEffectComposer {
    /// `gpu` is only used when `settings.use_gpu` is set
    pub fn new(
        scene: Box<dyn SceneGraph>,
        settings: VisualizationSettings,
        particles: &ParticleConfig,
        gpu: Option<Arc<GpuContext>>,
    ) -> Self {
        let gpu = if settings.use_gpu { gpu } else { None };
        let settings = VisualizationSettings {
            use_gpu: gpu.is_some(),
            ..settings
        };

        log::info!(
            "[Composer] Created with {:?} quality on {:?}",
            settings.quality_tier,
            if gpu.is_some() {
                EngineBackend::Gpu
            } else {
                EngineBackend::Cpu
            }
        );

        Self {
            scene,
            gpu,
            settings,
            rain_base_count: particles.rain_base_count,
            snow_base_count: particles.snow_base_count,
            bounds: SimulationBounds::new(
                particles.bounds_min,
                particles.bounds_max,
                particles.spawn_depth,
            ),
            state: None,
            style: EffectParameters::default(),
            global_intensity: 1.0,
            animation_speed: 1.0,
            disabled: HashSet::new(),
            rain: None,
            snow: None,
            fog: None,
            clouds: None,
            lightning: None,
            wind: None,
            wind_field: WindField::new(),
            time: 0.0,
            diagnostics: Vec::new(),
        }
    }

    /// Reconcile live effects with `state`
    pub fn apply(&mut self, state: &WeatherState, global_intensity: f32) {
        let state = state.clamped();
        let first = self.state.is_none();
        self.state = Some(state);
        self.global_intensity = if global_intensity.is_finite() {
            global_intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.wind_field
            .set_target(state.wind_direction_deg, state.wind_strength());
        if first {
            self.wind_field.snap_to_target();
        }

        self.reconcile();
    }

    fn reconcile(&mut self) {
        let Some(state) = self.state else {
            return;
        };
        let active = ActiveEffects::from_state(&state).without(&self.disabled);
        let global = self.global_intensity;
        let style = self.style;

        for kind in [EffectKind::Rain, EffectKind::Snow] {
            let intensity = effect_intensity(raw_intensity(kind, &state), global);
            self.sync_particles(kind, active.contains(kind), intensity);
        }

        let scene = self.scene.as_mut();
        let intensity = |kind| effect_intensity(raw_intensity(kind, &state), global);
        sync_atmosphere(
            scene,
            &mut self.fog,
            active.fog,
            (&state, &style, intensity(EffectKind::Fog)),
            FogLayer::new,
        );
        sync_atmosphere(
            scene,
            &mut self.clouds,
            active.clouds,
            (&state, &style, intensity(EffectKind::Clouds)),
            CloudLayer::new,
        );
        sync_atmosphere(
            scene,
            &mut self.lightning,
            active.lightning,
            (&state, &style, intensity(EffectKind::Lightning)),
            LightningFlash::new,
        );
        sync_atmosphere(
            scene,
            &mut self.wind,
            active.wind,
            (&state, &style, intensity(EffectKind::Wind)),
            WindEffect::new,
        );
    }

    fn particle_slot(&mut self, kind: PrecipitationKind) -> &mut Option<ParticleSlot> {
        match kind {
            PrecipitationKind::Rain => &mut self.rain,
            PrecipitationKind::Snow => &mut self.snow,
        }
    }

    fn sync_particles(&mut self, kind: EffectKind, active: bool, intensity: f32) {
        let Some(precipitation) = kind.precipitation() else {
            return;
        };

        let next = match (self.particle_slot(precipitation).take(), active) {
            (None, true) => self.create_particles(precipitation, intensity),
            (Some(slot), false) => {
                self.scene.detach(slot.node);
                log::debug!("[Composer] Disposed {:?} particles", precipitation);
                None
            }
            (Some(mut slot), true) => {
                slot.engine.set_intensity(intensity);
                self.scene.update(slot.node, &particle_uniforms(slot.engine.as_ref()));
                Some(slot)
            }
            (None, false) => None,
        };
        *self.particle_slot(precipitation) = next;
    }

    fn create_particles(&mut self, kind: PrecipitationKind, intensity: f32) -> Option<ParticleSlot> {
        let base = kind.base_count(self.rain_base_count, self.snow_base_count);
        let capacity = self.settings.particle_capacity(base);

        let mut engine = match create_engine(kind, capacity, self.bounds, self.gpu.as_ref()) {
            Ok(engine) => engine,
            Err(e) if self.gpu.is_some() => {
                self.fall_back_to_cpu(e.to_string());
                match create_engine(kind, capacity, self.bounds, None) {
                    Ok(engine) => engine,
                    Err(e) => {
                        log::error!("[Composer] Could not create {:?} particles: {}", kind, e);
                        return None;
                    }
                }
            }
            Err(e) => {
                log::error!("[Composer] Could not create {:?} particles: {}", kind, e);
                return None;
            }
        };
        engine.set_intensity(intensity);

        let props = *engine.properties();
        let node = self.scene.attach(RenderNode::Particles {
            kind,
            backend: engine.backend(),
            capacity: engine.capacity(),
            size: props.size,
            color: props.color,
        });
        self.scene.update(node, &particle_uniforms(engine.as_ref()));

        log::debug!(
            "[Composer] Created {:?} particles: {} on {:?}",
            kind,
            engine.capacity(),
            engine.backend()
        );
        Some(ParticleSlot { node, engine })
    }

    /// Permanently switch this session to CPU particles
    fn fall_back_to_cpu(&mut self, reason: String) {
        if self.gpu.take().is_none() {
            return;
        }
        self.settings.use_gpu = false;
        log::warn!("[Composer] GPU particles failed, falling back to CPU: {}", reason);
        self.diagnostics.push(Diagnostic::GpuFallback(reason));
    }

    /// Drop and recreate live particle engines (new capacity or backend)
    fn rebuild_particles(&mut self) {
        for kind in [PrecipitationKind::Rain, PrecipitationKind::Snow] {
            if let Some(slot) = self.particle_slot(kind).take() {
                let intensity = slot.engine.intensity();
                self.scene.detach(slot.node);
                drop(slot);
                let rebuilt = self.create_particles(kind, intensity);
                *self.particle_slot(kind) = rebuilt;
            }
        }
    }

    /// Advance every live effect by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.time += dt;
        let scaled_dt = dt * self.animation_speed;

        self.wind_field.update(scaled_dt);
        let wind = self.wind_field.wind_vector();
        let params = GlobalParams {
            time: self.time,
            wind,
            wind_enabled: self.wind.is_some(),
            turbulence: 1.0,
            velocity_scale: self.animation_speed,
        };

        let mut failure = None;
        for slot in [self.rain.as_mut(), self.snow.as_mut()].into_iter().flatten() {
            if let Err(e) = slot.engine.step(dt, &params) {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            self.handle_step_failure(e.to_string());
        }

        let scene = self.scene.as_mut();
        tick_atmosphere(scene, &mut self.clouds, scaled_dt, wind);
        tick_atmosphere(scene, &mut self.lightning, scaled_dt, wind);
        tick_atmosphere(scene, &mut self.wind, scaled_dt, wind);
    }

    fn handle_step_failure(&mut self, reason: String) {
        if self.gpu.is_some() {
            self.fall_back_to_cpu(reason);
            self.rebuild_particles();
        } else {
            log::error!("[Composer] Particle step failed: {}", reason);
        }
    }

    /// Replace settings wholesale; engines are rebuilt if their size or
    /// backend changed
    pub fn set_settings(&mut self, settings: VisualizationSettings) {
        let settings = VisualizationSettings {
            use_gpu: settings.use_gpu && self.gpu.is_some(),
            ..settings
        };
        let rebuild = settings.particle_multiplier != self.settings.particle_multiplier
            || settings.use_gpu != self.settings.use_gpu;

        if settings.use_gpu != self.settings.use_gpu {
            // Only reachable when turning the GPU off
            self.gpu = None;
        }
        self.settings = settings;

        if rebuild {
            log::info!(
                "[Composer] Rebuilding particles for {:?} quality",
                settings.quality_tier
            );
            self.rebuild_particles();
        }
    }

    pub fn settings(&self) -> &VisualizationSettings {
        &self.settings
    }

    pub fn set_style(&mut self, style: EffectParameters) {
        self.style = style;
    }

    pub fn style(&self) -> &EffectParameters {
        &self.style
    }

    pub fn set_global_intensity(&mut self, intensity: f32) {
        self.global_intensity = if intensity.is_finite() {
            intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.reconcile();
    }

    pub fn global_intensity(&self) -> f32 {
        self.global_intensity
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        self.animation_speed = if speed.is_finite() {
            speed.clamp(MIN_ANIMATION_SPEED, MAX_ANIMATION_SPEED)
        } else {
            1.0
        };
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    /// Enable or disable an effect independently of the weather
    pub fn toggle_effect(&mut self, kind: EffectKind, enabled: bool) {
        let changed = if enabled {
            self.disabled.remove(&kind)
        } else {
            self.disabled.insert(kind)
        };
        if changed {
            log::debug!("[Composer] {:?} {}", kind, if enabled { "enabled" } else { "disabled" });
            self.reconcile();
        }
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        !self.disabled.contains(&kind)
    }

    pub fn current_state(&self) -> Option<&WeatherState> {
        self.state.as_ref()
    }

    pub fn backend(&self) -> EngineBackend {
        if self.gpu.is_some() {
            EngineBackend::Gpu
        } else {
            EngineBackend::Cpu
        }
    }

    /// Effects currently alive
    pub fn active_effects(&self) -> ActiveEffects {
        ActiveEffects {
            rain: self.rain.is_some(),
            snow: self.snow.is_some(),
            fog: self.fog.is_some(),
            clouds: self.clouds.is_some(),
            lightning: self.lightning.is_some(),
            wind: self.wind.is_some(),
        }
    }

    /// Identity of the live object behind an effect; changes only when the
    /// effect is recreated
    pub fn instance_id(&self, kind: EffectKind) -> Option<u64> {
        match kind {
            EffectKind::Rain => self.rain.as_ref().map(|s| s.engine.instance_id()),
            EffectKind::Snow => self.snow.as_ref().map(|s| s.engine.instance_id()),
            EffectKind::Fog => self.fog.as_ref().map(|s| s.instance_id),
            EffectKind::Clouds => self.clouds.as_ref().map(|s| s.instance_id),
            EffectKind::Lightning => self.lightning.as_ref().map(|s| s.instance_id),
            EffectKind::Wind => self.wind.as_ref().map(|s| s.instance_id),
        }
    }

    /// Current scaled intensity of a live effect
    pub fn effect_intensity(&self, kind: EffectKind) -> Option<f32> {
        match kind {
            EffectKind::Rain => self.rain.as_ref().map(|s| s.engine.intensity()),
            EffectKind::Snow => self.snow.as_ref().map(|s| s.engine.intensity()),
            EffectKind::Fog => self.fog.as_ref().map(|s| s.intensity),
            EffectKind::Clouds => self.clouds.as_ref().map(|s| s.intensity),
            EffectKind::Lightning => self.lightning.as_ref().map(|s| s.intensity),
            EffectKind::Wind => self.wind.as_ref().map(|s| s.intensity),
        }
    }

    pub fn particle_engine(&self, kind: PrecipitationKind) -> Option<&dyn ParticleEngine> {
        let slot = match kind {
            PrecipitationKind::Rain => self.rain.as_ref(),
            PrecipitationKind::Snow => self.snow.as_ref(),
        };
        slot.map(|s| s.engine.as_ref())
    }

    pub fn render_source(&self, kind: PrecipitationKind) -> Option<ParticleRenderSource<'_>> {
        self.particle_engine(kind).map(|engine| engine.render_source())
    }

    pub fn snapshot(&mut self, kind: PrecipitationKind) -> Option<VisualizationResult<Vec<Particle>>> {
        self.particle_slot(kind)
            .as_mut()
            .map(|slot| slot.engine.snapshot())
    }

    pub fn fog(&self) -> Option<&FogLayer> {
        self.fog.as_ref().map(|s| &s.effect)
    }

    pub fn clouds(&self) -> Option<&CloudLayer> {
        self.clouds.as_ref().map(|s| &s.effect)
    }

    pub fn lightning(&self) -> Option<&LightningFlash> {
        self.lightning.as_ref().map(|s| &s.effect)
    }

    pub fn wind_field(&self) -> &WindField {
        &self.wind_field
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Detach and free every effect
    pub fn dispose(&mut self) {
        for kind in [PrecipitationKind::Rain, PrecipitationKind::Snow] {
            if let Some(slot) = self.particle_slot(kind).take() {
                self.scene.detach(slot.node);
            }
        }
        let scene = self.scene.as_mut();
        dispose_atmosphere(scene, &mut self.fog);
        dispose_atmosphere(scene, &mut self.clouds);
        dispose_atmosphere(scene, &mut self.lightning);
        dispose_atmosphere(scene, &mut self.wind);
        self.gpu = None;
        self.state = None;
        log::debug!("[Composer] Disposed");
    }
}

impl Drop for WeatherEffectComposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn particle_uniforms(engine: &dyn ParticleEngine) -> NodeUniforms {
    NodeUniforms::Particles {
        intensity: engine.intensity(),
        visible_count: engine.active_count(),
    }
}

fn sync_atmosphere<T: AtmosphereEffect>(
    scene: &mut dyn SceneGraph,
    slot: &mut Option<AtmosphereSlot<T>>,
    active: bool,
    (state, style, intensity): (&WeatherState, &EffectParameters, f32),
    create: impl FnOnce(&WeatherState, &EffectParameters, f32) -> T,
) {
    match (slot.is_some(), active) {
        (false, true) => {
            let effect = create(state, style, intensity);
            let node = scene.attach(effect.render_node());
            scene.update(node, &effect.uniforms());
            *slot = Some(AtmosphereSlot {
                node,
                instance_id: next_instance_id(),
                intensity,
                effect,
            });
        }
        (true, true) => {
            if let Some(existing) = slot.as_mut() {
                existing.effect.configure(state, style, intensity);
                existing.intensity = intensity;
                scene.update(existing.node, &existing.effect.uniforms());
            }
        }
        (true, false) => dispose_atmosphere(scene, slot),
        (false, false) => {}
    }
}

fn tick_atmosphere<T: AtmosphereEffect>(
    scene: &mut dyn SceneGraph,
    slot: &mut Option<AtmosphereSlot<T>>,
    dt: f32,
    wind: glam::Vec3,
) {
    if let Some(existing) = slot.as_mut() {
        existing.effect.tick(dt, wind);
        scene.update(existing.node, &existing.effect.uniforms());
    }
}

fn dispose_atmosphere<T>(scene: &mut dyn SceneGraph, slot: &mut Option<AtmosphereSlot<T>>) {
    if let Some(existing) = slot.take() {
        scene.detach(existing.node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NullScene;
    use crate::weather::find_preset;

    fn composer() -> WeatherEffectComposer {
        let particles = ParticleConfig {
            rain_base_count: 200,
            snow_base_count: 100,
            ..ParticleConfig::default()
        };
        WeatherEffectComposer::new(
            Box::new(NullScene::default()),
            VisualizationSettings::default(),
            &particles,
            None,
        )
    }

    fn preset(id: &str) -> WeatherState {
        find_preset(id).unwrap().conditions
    }

    #[test]
    fn test_activation_thresholds() {
        let mut state = WeatherState::clear();
        assert_eq!(ActiveEffects::from_state(&state), ActiveEffects::default());

        state.precipitation = 0.5;
        assert!(!ActiveEffects::from_state(&state).rain);
        state.precipitation = 0.51;
        assert!(ActiveEffects::from_state(&state).rain);

        state.temperature = 0.0;
        let active = ActiveEffects::from_state(&state);
        assert!(active.snow && !active.rain);

        state.visibility = 4999.0;
        state.cloud_cover = 0.6;
        state.storm = true;
        state.wind_speed = 6.0;
        let active = ActiveEffects::from_state(&state);
        assert!(active.fog && active.clouds && active.lightning && active.wind);

        state.wind_speed = 5.0;
        assert!(!ActiveEffects::from_state(&state).wind);
    }

    #[test]
    fn test_heavy_rain_intensity_scales_with_global() {
        let mut composer = composer();
        composer.apply(&preset("heavyRain"), 0.5);
        assert!(composer.active_effects().rain);
        let intensity = composer.effect_intensity(EffectKind::Rain).unwrap();
        assert!((intensity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_apply_same_state_is_idempotent() {
        let mut composer = composer();
        let storm = preset("thunderstorm");
        composer.apply(&storm, 1.0);
        let before: Vec<_> = EffectKind::ALL.iter().map(|k| composer.instance_id(*k)).collect();
        composer.apply(&storm, 1.0);
        let after: Vec<_> = EffectKind::ALL.iter().map(|k| composer.instance_id(*k)).collect();
        assert_eq!(before, after);
        assert!(before[0].is_some());
    }

    #[test]
    fn test_deactivation_disposes_and_reactivation_recreates() {
        let mut composer = composer();
        composer.apply(&preset("heavyRain"), 1.0);
        let first = composer.instance_id(EffectKind::Rain).unwrap();

        composer.apply(&WeatherState::clear(), 1.0);
        assert!(composer.instance_id(EffectKind::Rain).is_none());

        composer.apply(&preset("heavyRain"), 1.0);
        assert_ne!(composer.instance_id(EffectKind::Rain).unwrap(), first);
    }

    #[test]
    fn test_capacity_follows_quality() {
        let mut composer = composer();
        composer.apply(&preset("heavyRain"), 1.0);
        let engine = composer.particle_engine(PrecipitationKind::Rain).unwrap();
        assert_eq!(engine.capacity(), 200);

        composer.set_settings(VisualizationSettings::for_tier(crate::quality::QualityTier::Low));
        let engine = composer.particle_engine(PrecipitationKind::Rain).unwrap();
        assert_eq!(engine.capacity(), 100);
    }

    #[test]
    fn test_toggle_disables_and_restores() {
        let mut composer = composer();
        composer.apply(&preset("foggy"), 1.0);
        assert!(composer.active_effects().fog);

        composer.toggle_effect(EffectKind::Fog, false);
        assert!(!composer.active_effects().fog);
        assert!(!composer.is_enabled(EffectKind::Fog));

        composer.toggle_effect(EffectKind::Fog, true);
        assert!(composer.active_effects().fog);
    }

    #[test]
    fn test_update_steps_live_engines() {
        let mut composer = composer();
        composer.apply(&preset("heavySnow"), 1.0);
        for _ in 0..30 {
            composer.update(1.0 / 30.0);
        }
        let snapshot = composer.snapshot(PrecipitationKind::Snow).unwrap().unwrap();
        assert_eq!(snapshot.len(), 100);
        assert!(composer.wind_field().speed() > 0.0);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let mut composer = composer();
        let mut wild = preset("heavyRain");
        wild.precipitation = 7.0;
        wild.visibility = f32::NAN;
        composer.apply(&wild, 2.0);
        let state = composer.current_state().unwrap();
        assert_eq!(state.precipitation, 1.0);
        assert_eq!(composer.global_intensity(), 1.0);
        assert_eq!(composer.effect_intensity(EffectKind::Rain), Some(1.0));
    }

    #[test]
    fn test_dispose_clears_everything() {
        let mut composer = composer();
        composer.apply(&preset("thunderstorm"), 1.0);
        composer.dispose();
        assert_eq!(composer.active_effects(), ActiveEffects::default());
        composer.dispose();
    }
}

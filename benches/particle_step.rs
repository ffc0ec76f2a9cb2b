// CPU particle stepping across quality tiers
//
// Pool sizes are the default rain and snow base counts scaled by each
// tier's particle multiplier, i.e. exactly what the composer allocates.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use weather_viz_engine::constants::particles::{RAIN_BASE_COUNT, SNOW_BASE_COUNT};
use weather_viz_engine::particles::{
    CpuParticleSystem, GlobalParams, ParticleEngine, PrecipitationKind, SimulationBounds,
};
use weather_viz_engine::{QualityTier, VisualizationSettings};

const FRAME: f32 = 1.0 / 60.0;

fn windy() -> GlobalParams {
    GlobalParams {
        wind: Vec3::new(6.0, 0.0, -3.0),
        wind_enabled: true,
        ..GlobalParams::default()
    }
}

fn bench_kind(c: &mut Criterion, kind: PrecipitationKind, base: usize) {
    let mut group = c.benchmark_group(format!("{:?}_step", kind).to_lowercase());

    for tier in QualityTier::ALL {
        let capacity = VisualizationSettings::for_tier(tier).particle_capacity(base);
        group.bench_with_input(
            BenchmarkId::new(format!("{:?}", tier), capacity),
            &capacity,
            |b, &capacity| {
                let mut system =
                    CpuParticleSystem::with_seed(kind, capacity, SimulationBounds::default(), 7);
                let mut params = windy();
                b.iter(|| {
                    params.time += FRAME;
                    system
                        .step(black_box(FRAME), &params)
                        .expect("CPU step is infallible");
                });
            },
        );
    }

    group.finish();
}

fn bench_rain(c: &mut Criterion) {
    bench_kind(c, PrecipitationKind::Rain, RAIN_BASE_COUNT);
}

fn bench_snow(c: &mut Criterion) {
    bench_kind(c, PrecipitationKind::Snow, SNOW_BASE_COUNT);
}

criterion_group!(benches, bench_rain, bench_snow);
criterion_main!(benches);

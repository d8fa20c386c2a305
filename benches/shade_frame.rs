//! Shading benchmarks: the per-pixel pass alone and a full software frame.
//! Run: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vhs_glitch::config::Config;
use vhs_glitch::effect::{shade, ParamHandle, ParameterSet, Uniforms};
use vhs_glitch::engine::{GlitchEngine, StopCondition};
use vhs_glitch::surface::{SoftwareBackend, SurfaceSize, Texture};

fn gradient(width: u32, height: u32) -> Texture {
    Texture::from_fn(width, height, |x, y| {
        [x as f32 / width as f32, y as f32 / height as f32, 0.5]
    })
}

fn bench_shade_pixels(c: &mut Criterion) {
    let texture = gradient(512, 512);
    let uniforms = Uniforms {
        time: 3.2,
        glitch_intensity: 0.8,
        resolution: [1280.0, 720.0],
        image_size: [512.0, 512.0],
        params: ParameterSet::new().snapshot(),
    };

    c.bench_function("shade_64k_pixels", |b| {
        b.iter(|| {
            let mut acc = 0.0f32;
            for y in 0..256 {
                for x in 0..256 {
                    let uv = [x as f32 / 256.0, y as f32 / 256.0];
                    acc += shade(black_box(uv), &uniforms, &texture)[0];
                }
            }
            black_box(acc)
        });
    });
}

fn bench_software_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("shade_frame");
    group.sample_size(20);

    group.bench_function("software_720p_10_frames", |b| {
        b.iter(|| {
            let mut config = Config::default();
            config.scheduler.seed = Some(7);
            let params = ParamHandle::new(config.params.clone());
            let backend = SoftwareBackend::new(SurfaceSize::new(1280, 720), config.surface.render_threads)
                .expect("create backend");
            let mut engine = GlitchEngine::new(&config, params, Box::new(backend)).expect("create engine");
            engine.post_asset(Ok(gradient(512, 512)));
            black_box(engine.run_until(&StopCondition::frames(10)).expect("render"))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_shade_pixels, bench_software_frame);
criterion_main!(benches);

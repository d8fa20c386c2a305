use image::{Rgb, RgbImage};
use tempfile::tempdir;

use vhs_glitch::{
    animation::GlitchPhase,
    config::Config,
    control::{ControlCommand, ControlScript},
    effect::{
        params::{GLITCH_DURATION, GLITCH_FREQUENCY, MAX_GLITCH_INTENSITY, MIN_GLITCH_INTENSITY},
        ParamHandle,
    },
    engine::{GlitchEngine, StopCondition},
    surface::{AssetLoader, AssetStatus, HeadlessBackend, SoftwareBackend, SurfaceSize, Texture},
};

fn seeded(seed: u64) -> Config {
    let mut config = Config::default();
    config.scheduler.seed = Some(seed);
    config
}

fn headless(config: &Config, params: &ParamHandle) -> GlitchEngine {
    let backend = HeadlessBackend::new(SurfaceSize::new(320, 180)).unwrap();
    GlitchEngine::new(config, params.clone(), Box::new(backend)).unwrap()
}

fn flat_texture() -> Texture {
    Texture::from_fn(16, 16, |_, _| [0.4, 0.5, 0.6])
}

#[test]
fn intensity_stays_within_configured_range() {
    let config = seeded(99);
    let params = ParamHandle::new(config.params.clone());
    params.set(GLITCH_FREQUENCY, 1.0).unwrap();
    params.set(GLITCH_DURATION, 120.0).unwrap();
    let max = params.snapshot().max_glitch_intensity;

    let mut engine = headless(&config, &params);
    engine.post_asset(Ok(flat_texture()));

    for frames in 1..=20_000 {
        engine.run_until(&StopCondition::frames(frames)).unwrap();
        let current = engine.state().current_intensity();
        assert!(current >= 0.0 && current <= max, "intensity {} out of [0, {}]", current, max);
    }
    assert!(engine.summary().glitches > 50);
}

#[test]
fn manual_trigger_holds_for_the_glitch_duration() {
    let config = seeded(3);
    let params = ParamHandle::new(config.params.clone());
    params.set(GLITCH_FREQUENCY, 0.0).unwrap();
    params.set(MIN_GLITCH_INTENSITY, 0.3).unwrap();
    params.set(MAX_GLITCH_INTENSITY, 1.0).unwrap();
    params.set(GLITCH_DURATION, 250.0).unwrap();

    let mut engine = headless(&config, &params);
    engine.post_control(ControlCommand::Trigger);

    // The trigger dispatches right after the first tick
    engine.run_until(&StopCondition::frames(2)).unwrap();
    let target = engine.state().target_intensity();
    assert!((0.3..=1.0).contains(&target));
    assert_eq!(engine.glitch_phase(), GlitchPhase::Active);

    // Frame 15 ticks at 233ms, frame 16 at 250.005ms, just after the expiry
    engine.run_until(&StopCondition::frames(15)).unwrap();
    assert_eq!(engine.state().target_intensity(), target);
    engine.run_until(&StopCondition::frames(16)).unwrap();
    assert_eq!(engine.state().target_intensity(), 0.0);
    assert_eq!(engine.glitch_phase(), GlitchPhase::Idle);
}

#[test]
fn intensity_decays_geometrically_after_a_glitch() {
    let config = seeded(5);
    let params = ParamHandle::new(config.params.clone());
    params.set(GLITCH_FREQUENCY, 0.0).unwrap();
    params.set(GLITCH_DURATION, 100.0).unwrap();

    let mut engine = headless(&config, &params);
    engine.post_control(ControlCommand::Trigger);
    engine.run_until(&StopCondition::frames(20)).unwrap();
    assert_eq!(engine.state().target_intensity(), 0.0);

    let mut previous = engine.state().current_intensity();
    assert!(previous > 0.0);
    for frames in 21..=40 {
        engine.run_until(&StopCondition::frames(frames)).unwrap();
        let current = engine.state().current_intensity();
        assert!((current - previous * 0.9).abs() < 1e-6);
        previous = current;
    }

    engine.run_until(&StopCondition::frames(400)).unwrap();
    assert!(engine.state().current_intensity() < 1e-6);
}

#[test]
fn scripted_pause_freezes_time_while_intensity_relaxes() {
    let config = seeded(8);
    let params = ParamHandle::new(config.params.clone());
    params.set(GLITCH_FREQUENCY, 0.0).unwrap();
    params.set(GLITCH_DURATION, 5000.0).unwrap();

    let mut engine = headless(&config, &params);
    let script = ControlScript::parse("@10 trigger\n@10 pause\n@110 resume\n").unwrap();
    engine.schedule_script(&script);

    engine.run_until(&StopCondition::frames(10)).unwrap();
    let frozen = engine.state().elapsed_time();

    for frames in 11..=110 {
        engine.run_until(&StopCondition::frames(frames)).unwrap();
        assert_eq!(engine.state().elapsed_time(), frozen);
    }
    let target = engine.state().target_intensity();
    assert!((engine.state().current_intensity() - target).abs() < 1e-3);

    engine.run_until(&StopCondition::frames(111)).unwrap();
    assert!(engine.state().elapsed_time() > frozen);
}

#[test]
fn same_seed_same_run() {
    let run = |seed| {
        let config = seeded(seed);
        let params = ParamHandle::new(config.params.clone());
        params.set(GLITCH_FREQUENCY, 0.7).unwrap();
        let mut engine = headless(&config, &params);
        engine.run_until(&StopCondition::frames(3_000)).unwrap()
    };
    assert_eq!(run(42), run(42));
}

#[tokio::test]
async fn missing_image_only_clears() {
    let dir = tempdir().unwrap();
    let config = seeded(1);
    let params = ParamHandle::new(config.params.clone());
    let mut engine = headless(&config, &params);

    let result = AssetLoader::default().load(dir.path().join("nope.png")).await;
    assert!(result.is_err());
    engine.post_asset(result);

    let summary = engine.run(StopCondition::frames(200)).await.unwrap();
    assert_eq!(summary.drawn, 0);
    assert_eq!(summary.skipped, 200);
    assert_eq!(engine.asset_status(), AssetStatus::Failed);
}

#[tokio::test]
async fn loaded_image_is_drawn_centered_on_background() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("card.png");
    RgbImage::from_pixel(16, 16, Rgb([200, 30, 30])).save(&path).unwrap();

    let config = seeded(2);
    let params = ParamHandle::new(config.params.clone());
    let backend = SoftwareBackend::new(SurfaceSize::new(64, 36), 2).unwrap();
    let mut engine = GlitchEngine::new(&config, params, Box::new(backend)).unwrap();
    engine.post_asset(AssetLoader::default().load(&path).await);

    let summary = engine.run(StopCondition::frames(4)).await.unwrap();
    assert_eq!(summary.drawn, 3);

    let frame = engine.backend().frame().unwrap();
    assert_eq!(frame.get_pixel(0, 0), [255, 255, 255]);
    let center = frame.get_pixel(32, 18);
    assert!(center[0] > center[1] && center[0] > center[2], "center {:?}", center);
}

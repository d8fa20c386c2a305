// Minimal smoke run: render a colour-bar card through one forced glitch

use vhs_glitch::{
    config::Config,
    control::ControlCommand,
    effect::ParamHandle,
    engine::{GlitchEngine, StopCondition},
    surface::{SoftwareBackend, SurfaceSize, Texture},
};

const BARS: [[f32; 3]; 7] = [
    [0.75, 0.75, 0.75],
    [0.75, 0.75, 0.0],
    [0.0, 0.75, 0.75],
    [0.0, 0.75, 0.0],
    [0.75, 0.0, 0.75],
    [0.75, 0.0, 0.0],
    [0.0, 0.0, 0.75],
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing vhs-glitch core functionality");

    println!("\n1. Building test card...");
    let card = Texture::from_fn(448, 320, |x, _| BARS[(x / 64) as usize % BARS.len()]);
    let dims = card.dimensions();
    println!("   Card: {}x{}", dims.width, dims.height);

    println!("\n2. Creating engine...");
    let mut config = Config::default();
    config.scheduler.seed = Some(1985);
    let params = ParamHandle::new(config.params.clone());
    let backend = SoftwareBackend::new(SurfaceSize::new(640, 360), config.surface.render_threads)?;
    let mut engine = GlitchEngine::new(&config, params, Box::new(backend))?;
    engine.post_asset(Ok(card));

    println!("\n3. Rendering 30 frames with a forced glitch...");
    engine.post_control(ControlCommand::Trigger);
    let summary = engine.run_until(&StopCondition::frames(30))?;
    println!("   Frames: {} ({} drawn)", summary.frames, summary.drawn);
    println!("   Intensity: {:.3}", engine.state().current_intensity());

    println!("\n4. Saving last frame...");
    match engine.backend().frame() {
        Some(frame) => match frame.save_png("minimal_test_output.png") {
            Ok(()) => println!("   Output saved to: minimal_test_output.png"),
            Err(e) => println!("   Could not save file: {}", e),
        },
        None => println!("   Backend keeps no pixels"),
    }

    println!("\nDone.");
    Ok(())
}

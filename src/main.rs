use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};

use vhs_glitch::{
    config::Config,
    control::{parse_assignment, ControlPanel, ControlScript},
    effect::{ParamHandle, ParamValue},
    engine::{GlitchEngine, StopCondition},
    error::GlitchError,
    surface::{AssetLoader, FrameRecorder, HeadlessBackend, RenderBackend, SoftwareBackend, SurfaceSize},
};

#[derive(Parser)]
#[command(
    name = "vhs-glitch",
    version,
    about = "Render a still image through an animated VHS glitch effect",
    long_about = "vhs-glitch draws an image through an analog-video shading pass (scanlines, tearing, chromatic aberration, grain, vignette) while a scheduler fires irregular glitch bursts. Frames can be written out as a PNG sequence."
)]
struct Cli {
    /// Source image (PNG or JPEG)
    #[arg(short, long, required_unless_present = "list_params")]
    image: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to render (unbounded when omitted)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Directory to write the PNG frame sequence to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write every Nth drawn frame
    #[arg(long)]
    every: Option<u64>,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Seed for the glitch scheduler
    #[arg(long)]
    seed: Option<u64>,

    /// Control script with `@<frame> <command>` lines
    #[arg(long)]
    script: Option<PathBuf>,

    /// Override a parameter, e.g. `--set glitch_frequency=0.9`
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    overrides: Vec<(String, ParamValue)>,

    /// Count draw calls without rasterizing
    #[arg(long)]
    headless: bool,

    /// Pace frames against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Print every parameter with its range and exit
    #[arg(long)]
    list_params: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<GlitchError>() {
            Some(glitch) => error!("{}", glitch.user_message()),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    config.validate()?;

    let params = ParamHandle::new(config.params.clone());
    let panel = ControlPanel::new(params.clone());
    for (name, value) in &cli.overrides {
        let stored = panel.set(name, *value).with_context(|| format!("--set {}", name))?;
        info!("Override: {} = {}", name, stored);
    }

    if cli.list_params {
        for line in panel.describe() {
            println!("{}", line);
        }
        return Ok(());
    }

    info!("Starting vhs-glitch v{}", env!("CARGO_PKG_VERSION"));

    let size = SurfaceSize::new(config.surface.width, config.surface.height);
    let backend: Box<dyn RenderBackend> = if cli.headless {
        Box::new(HeadlessBackend::new(size).map_err(GlitchError::from)?)
    } else {
        Box::new(SoftwareBackend::new(size, config.surface.render_threads).map_err(GlitchError::from)?)
    };

    let mut engine = GlitchEngine::new(&config, params, backend)?;

    if let Some(dir) = &config.output.dir {
        if cli.headless {
            warn!("Headless run: no frames will be written to {:?}", dir);
        } else {
            engine.set_recorder(FrameRecorder::new(dir, config.output.every_n_frames)?);
        }
    }

    if let Some(script_path) = &cli.script {
        let script = ControlScript::from_file(script_path)?;
        engine.schedule_script(&script);
    }

    if let Some(image) = &cli.image {
        info!("Image: {:?}", image);
        let loader = AssetLoader::new(config.playback.background);
        engine.post_asset(loader.load(image).await);
    }

    let stop = StopCondition {
        max_frames: config.playback.max_frames,
        handle: None,
    };
    if stop.max_frames.is_none() && !config.playback.realtime {
        warn!("No frame limit given; running until interrupted");
    }

    let summary = engine.run(stop).await?;

    info!("Rendered {} frames ({} drawn, {} skipped), {} glitches",
          summary.frames, summary.drawn, summary.skipped, summary.glitches);
    if summary.frames_written > 0 {
        info!("Wrote {} frame(s) to {:?}", summary.frames_written, config.output.dir);
    }
    Ok(())
}

/// CLI flags win over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(frames) = cli.frames {
        config.playback.max_frames = Some(frames);
    }
    if cli.realtime {
        config.playback.realtime = true;
    }
    if let Some(width) = cli.width {
        config.surface.width = width;
    }
    if let Some(height) = cli.height {
        config.surface.height = height;
    }
    if let Some(seed) = cli.seed {
        config.scheduler.seed = Some(seed);
    }
    if let Some(dir) = &cli.output {
        config.output.dir = Some(dir.clone());
    }
    if let Some(every) = cli.every {
        config.output.every_n_frames = every;
    }
}

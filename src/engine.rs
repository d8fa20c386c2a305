use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::{
    animation::{
        events::{Event, EventQueue, VirtualTime},
        scheduler::{GlitchPhase, GlitchScheduler},
        state::AnimationState,
        driver::{FrameDriver, FrameOutcome},
    },
    config::Config,
    control::{ControlCommand, ControlPanel, ControlScript, Routed},
    effect::{
        params::ParamHandle,
        program::{ProgramSource, ShaderProgram},
    },
    error::{AssetError, Result},
    surface::{
        backend::RenderBackend,
        loader::AssetStatus,
        recorder::FrameRecorder,
        texture::Texture,
        types::SurfaceSize,
    },
};

/// Shared flag that ends a run from outside the loop
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// When a run ends; with neither limit set it runs until the queue drains
#[derive(Debug, Clone, Default)]
pub struct StopCondition {
    pub max_frames: Option<u64>,
    pub handle: Option<StopHandle>,
}

impl StopCondition {
    pub fn frames(max_frames: u64) -> Self {
        Self { max_frames: Some(max_frames), handle: None }
    }

    pub fn with_handle(mut self, handle: StopHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    fn reached(&self, frames: u64) -> bool {
        self.max_frames.map_or(false, |max| frames >= max)
            || self.handle.as_ref().map_or(false, StopHandle::is_stopped)
    }
}

/// What a run did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub drawn: u64,
    pub skipped: u64,
    pub glitches: u64,
    pub virtual_time_ms: f64,
    pub frames_written: u64,
}

/// Main engine that owns the effect and runs its event loop
///
/// Everything happens inside event dispatch on one thread:
/// 1. Frame ticks run the driver and re-arm one refresh interval later
/// 2. Glitch timers are routed to the scheduler
/// 3. Control commands edit parameters, trigger glitches or resize
/// 4. Asset completion hands the texture to the driver
pub struct GlitchEngine {
    queue: EventQueue,
    state: AnimationState,
    scheduler: GlitchScheduler,
    driver: FrameDriver,
    backend: Box<dyn RenderBackend>,
    recorder: Option<FrameRecorder>,
    panel: ControlPanel,
    params: ParamHandle,
    asset: AssetStatus,
    frame_interval: Duration,
    realtime: bool,
}

impl GlitchEngine {
    /// Create an engine with the built-in shader program
    pub fn new(config: &Config, params: ParamHandle, backend: Box<dyn RenderBackend>) -> Result<Self> {
        Self::with_program_source(config, params, backend, &ProgramSource::default())
    }

    /// Create an engine from a custom program source
    ///
    /// Fails when the program does not compile or link.
    pub fn with_program_source(
        config: &Config,
        params: ParamHandle,
        backend: Box<dyn RenderBackend>,
        source: &ProgramSource,
    ) -> Result<Self> {
        let program = ShaderProgram::build(source)?;
        debug!("Shader program linked with {} uniforms", program.uniform_count());

        let mut queue = EventQueue::new();
        let mut scheduler = GlitchScheduler::new(params.clone(), &config.scheduler);
        let driver = FrameDriver::new(params.clone(), program, &config.playback);

        queue.post(Event::Frame);
        scheduler.start(&mut queue);

        let frame_interval = config.playback.frame_interval();
        let size = backend.size();
        info!("Glitch engine ready: {}x{} surface, frame every {:.3}ms",
              size.width, size.height, frame_interval.as_secs_f64() * 1000.0);

        Ok(Self {
            queue,
            state: AnimationState::new(),
            scheduler,
            driver,
            backend,
            recorder: None,
            panel: ControlPanel::new(params.clone()),
            params,
            asset: AssetStatus::Pending,
            frame_interval,
            realtime: config.playback.realtime,
        })
    }

    /// Save drawn frames through `recorder`
    pub fn set_recorder(&mut self, recorder: FrameRecorder) {
        self.recorder = Some(recorder);
    }

    /// Deliver the outcome of loading the source image
    pub fn post_asset(&mut self, result: std::result::Result<Texture, AssetError>) {
        match result {
            Ok(texture) => self.queue.post(Event::AssetLoaded(texture)),
            Err(e) => self.queue.post(Event::AssetFailed(e.to_string())),
        }
    }

    /// Queue a control command for the next dispatch
    pub fn post_control(&mut self, command: ControlCommand) {
        self.queue.post(Event::Control(command));
    }

    /// Queue a surface resize
    pub fn post_resize(&mut self, size: SurfaceSize) {
        self.queue.post(Event::Resize(size));
    }

    /// Schedule every script command just before the frame it names
    pub fn schedule_script(&mut self, script: &ControlScript) {
        let interval = self.frame_interval.as_micros() as u64;
        for (frame, command) in script.entries() {
            let at = VirtualTime::from_micros(interval.saturating_mul(*frame));
            self.queue.post_at(at, Event::Control(command.clone()));
        }
        if !script.is_empty() {
            info!("Scheduled {} control command(s)", script.len());
        }
    }

    pub fn params(&self) -> &ParamHandle {
        &self.params
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn glitch_phase(&self) -> GlitchPhase {
        self.scheduler.phase()
    }

    pub fn asset_status(&self) -> AssetStatus {
        self.asset
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.driver.frames()
    }

    pub fn now(&self) -> VirtualTime {
        self.queue.now()
    }

    /// Dispatch the next event; `None` once the queue is empty
    pub fn dispatch_next(&mut self) -> Result<Option<VirtualTime>> {
        let (due, event) = match self.queue.pop() {
            Some(next) => next,
            None => return Ok(None),
        };

        match event {
            Event::Frame => self.on_frame()?,
            Event::GlitchWake { token } => {
                self.scheduler.on_wake(token, &mut self.state, &mut self.queue)
            }
            Event::GlitchExpire { token } => {
                self.scheduler.on_expire(token, &mut self.state, &mut self.queue)
            }
            Event::Resize(size) => self.on_resize(size),
            Event::Control(command) => self.on_control(&command),
            Event::AssetLoaded(texture) => {
                self.driver.set_texture(texture);
                self.asset = AssetStatus::Ready;
            }
            Event::AssetFailed(reason) => {
                if self.asset != AssetStatus::Failed {
                    error!("Image unavailable, nothing will be drawn: {}", reason);
                }
                self.asset = AssetStatus::Failed;
            }
        }

        Ok(Some(due))
    }

    /// Dispatch events until `stop` holds or the queue drains
    pub fn run_until(&mut self, stop: &StopCondition) -> Result<RunSummary> {
        while !stop.reached(self.driver.frames()) {
            if self.dispatch_next()?.is_none() {
                break;
            }
        }
        Ok(self.summary())
    }

    /// Run the event loop, pacing frame ticks against the wall clock in real-time mode
    pub async fn run(&mut self, stop: StopCondition) -> Result<RunSummary> {
        info!("Running ({})", if self.realtime { "real-time" } else { "as fast as possible" });
        let start = tokio::time::Instant::now();
        let origin = self.queue.now().since_start();

        while !stop.reached(self.driver.frames()) {
            if let Some(due) = self.queue.peek_due() {
                if self.realtime {
                    let offset = due.since_start().saturating_sub(origin);
                    tokio::time::sleep_until(start + offset).await;
                }
            }

            if self.dispatch_next()?.is_none() {
                break;
            }

            if !self.realtime && self.driver.frames() % 64 == 0 {
                tokio::task::yield_now().await;
            }
        }

        let summary = self.summary();
        info!("Run finished: {} frames ({} drawn), {} glitches, {:.0}ms virtual time",
              summary.frames, summary.drawn, summary.glitches, summary.virtual_time_ms);
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.driver.frames(),
            drawn: self.driver.draws(),
            skipped: self.driver.frames() - self.driver.draws(),
            glitches: self.scheduler.glitch_count(),
            virtual_time_ms: self.queue.now().as_millis_f64(),
            frames_written: self.recorder.as_ref().map_or(0, FrameRecorder::written),
        }
    }

    fn on_frame(&mut self) -> Result<()> {
        let outcome = self.driver.advance(&mut self.state, self.backend.as_mut())?;

        if outcome == FrameOutcome::Drawn {
            if let (Some(recorder), Some(frame)) = (self.recorder.as_mut(), self.backend.frame()) {
                recorder.record(frame)?;
            }
        }

        self.queue.post_after(self.frame_interval, Event::Frame);
        Ok(())
    }

    fn on_resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            warn!("Ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        match self.backend.resize(size) {
            Ok(()) => info!("Surface resized to {}x{}", size.width, size.height),
            Err(e) => warn!("Ignoring resize: {}", e),
        }
    }

    fn on_control(&mut self, command: &ControlCommand) {
        match self.panel.apply(command) {
            Ok(Routed::Applied) => {}
            Ok(Routed::Trigger) => self.scheduler.trigger(&mut self.state, &mut self.queue),
            Ok(Routed::Resize(size)) => self.on_resize(size),
            Err(e) => warn!("Rejected control command: {}", e),
        }
    }
}

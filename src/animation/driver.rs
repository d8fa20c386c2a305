use tracing::{debug, info};

use super::state::AnimationState;
use crate::config::PlaybackConfig;
use crate::effect::params::ParamHandle;
use crate::effect::program::ShaderProgram;
use crate::effect::shader::Uniforms;
use crate::effect::vertex::{placed_quad, quad_scale};
use crate::error::RenderError;
use crate::surface::backend::{DrawCall, RenderBackend};
use crate::surface::texture::Texture;
use crate::surface::types::{Color, ImageDimensions};

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Surface cleared and the quad drawn
    Drawn,
    /// Surface cleared only; no texture was ready
    Skipped,
}

/// Runs once per display refresh: advances time, smooths the glitch
/// intensity, clears the surface and draws the quad.
pub struct FrameDriver {
    params: ParamHandle,
    program: ShaderProgram,
    texture: Option<Texture>,
    image: ImageDimensions,
    time_step: f32,
    smoothing_factor: f32,
    background: Color,
    frames: u64,
    draws: u64,
}

impl FrameDriver {
    pub fn new(params: ParamHandle, program: ShaderProgram, playback: &PlaybackConfig) -> Self {
        Self {
            params,
            program,
            texture: None,
            image: ImageDimensions::default(),
            time_step: playback.time_step,
            smoothing_factor: playback.smoothing_factor,
            background: playback.background,
            frames: 0,
            draws: 0,
        }
    }

    /// Hand over the decoded source image; frames draw from now on
    pub fn set_texture(&mut self, texture: Texture) {
        self.image = texture.dimensions();
        info!("Texture ready ({}x{})", self.image.width, self.image.height);
        self.texture = Some(texture);
    }

    pub fn image_dimensions(&self) -> ImageDimensions {
        self.image
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Run one frame.
    ///
    /// Pausing freezes the clock only; the intensity keeps relaxing toward
    /// its target either way. A target above the current
    /// `max_glitch_intensity` is lowered to it first.
    pub fn advance(
        &mut self,
        state: &mut AnimationState,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameOutcome, RenderError> {
        self.frames += 1;

        let set = self.params.borrow();
        let params = set.snapshot();

        if !params.paused {
            state.advance_time(self.time_step);
        }
        state.cap_target(params.max_glitch_intensity);
        state.relax(self.smoothing_factor);

        backend.clear(self.background);

        let texture = match self.texture.as_ref() {
            Some(texture) => texture,
            None => return Ok(FrameOutcome::Skipped),
        };

        let surface = backend.size();
        let uniforms = Uniforms {
            time: state.time(),
            glitch_intensity: state.current_intensity(),
            resolution: surface.as_vec2(),
            image_size: self.image.as_vec2(),
            params,
        };
        let scale = quad_scale(surface, self.image, params.image_scale);
        let bound = self.program.bind(&uniforms, &set);
        drop(set);

        let call = DrawCall {
            program: &self.program,
            vertices: placed_quad(scale),
            uniforms,
            bound,
            texture,
        };
        backend.draw(&call)?;
        self.draws += 1;

        if self.draws == 1 {
            debug!("First draw: quad scale {:?} on {}x{}", scale, surface.width, surface.height);
        }
        Ok(FrameOutcome::Drawn)
    }
}

//! Glitch scheduling: when bursts happen and how strong they are.
//!
//! The scheduler cycles IDLE -> ACTIVE -> IDLE forever. While idle it sleeps
//! for a randomized delay, then rolls against `glitch_frequency`; a hit draws a
//! target intensity and holds it for `glitch_duration` milliseconds. Misses
//! simply re-arm. The irregular spacing is what makes the activity read as
//! tape dropout rather than a metronome.
//!
//! Every armed timer carries the generation token current when it was posted.
//! Activating or returning to idle bumps the token, so a timer superseded by a
//! manual trigger is recognised as stale and dropped when it fires.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::events::{millis, Event, EventQueue};
use super::state::AnimationState;
use crate::config::SchedulerConfig;
use crate::effect::params::{EffectParams, ParamHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchPhase {
    Idle,
    Active,
}

pub struct GlitchScheduler {
    params: ParamHandle,
    rng: SmallRng,
    phase: GlitchPhase,
    token: u64,
    base_delay_ms: f64,
    delay_spread_ms: f64,
    glitches: u64,
}

impl GlitchScheduler {
    pub fn new(params: ParamHandle, config: &SchedulerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Self {
            params,
            rng,
            phase: GlitchPhase::Idle,
            token: 0,
            base_delay_ms: config.base_delay_ms,
            delay_spread_ms: config.delay_spread_ms,
            glitches: 0,
        }
    }

    pub fn phase(&self) -> GlitchPhase {
        self.phase
    }

    /// Number of bursts started so far, manual triggers included
    pub fn glitch_count(&self) -> u64 {
        self.glitches
    }

    /// Arm the first wake-up
    pub fn start(&mut self, queue: &mut EventQueue) {
        self.arm_wake(queue);
    }

    /// Handle a wake-up timer
    pub fn on_wake(&mut self, token: u64, state: &mut AnimationState, queue: &mut EventQueue) {
        if token != self.token || self.phase != GlitchPhase::Idle {
            debug!("Dropping stale glitch wake-up (token {}, current {})", token, self.token);
            return;
        }

        let params = self.params.snapshot();
        if self.rng.gen::<f32>() < params.glitch_frequency {
            self.activate(&params, state, queue);
        } else {
            self.arm_wake(queue);
        }
    }

    /// Handle the end of an active glitch
    pub fn on_expire(&mut self, token: u64, state: &mut AnimationState, queue: &mut EventQueue) {
        if token != self.token || self.phase != GlitchPhase::Active {
            debug!("Dropping stale glitch expiry (token {}, current {})", token, self.token);
            return;
        }

        state.set_target(0.0);
        self.phase = GlitchPhase::Idle;
        self.token += 1;
        debug!("Glitch ended");
        self.arm_wake(queue);
    }

    /// Force a glitch now, regardless of phase and frequency
    pub fn trigger(&mut self, state: &mut AnimationState, queue: &mut EventQueue) {
        let params = self.params.snapshot();
        debug!("Manual glitch trigger");
        self.activate(&params, state, queue);
    }

    /// Delay before the next wake-up; higher frequency waits less on average
    pub fn next_wake_delay(&mut self, frequency: f32) -> Duration {
        let r = self.rng.gen::<f64>();
        let frequency = frequency.clamp(0.0, 1.0) as f64;
        millis(self.base_delay_ms + r * (1.0 - frequency) * self.delay_spread_ms)
    }

    /// Target intensity for a new burst, within `[min, max]`
    pub fn draw_intensity(&mut self, params: &EffectParams) -> f32 {
        let hi = params.max_glitch_intensity;
        let lo = params.min_glitch_intensity.min(hi);
        lo + self.rng.gen::<f32>() * (hi - lo)
    }

    fn activate(&mut self, params: &EffectParams, state: &mut AnimationState, queue: &mut EventQueue) {
        let target = self.draw_intensity(params);
        state.set_target(target);

        self.phase = GlitchPhase::Active;
        self.token += 1;
        self.glitches += 1;

        debug!("Glitch {} started: target {:.3} for {:.0}ms",
               self.glitches, target, params.glitch_duration_ms);
        queue.post_after(
            millis(params.glitch_duration_ms as f64),
            Event::GlitchExpire { token: self.token },
        );
    }

    fn arm_wake(&mut self, queue: &mut EventQueue) {
        let frequency = self.params.snapshot().glitch_frequency;
        let delay = self.next_wake_delay(frequency);
        queue.post_after(delay, Event::GlitchWake { token: self.token });
    }
}

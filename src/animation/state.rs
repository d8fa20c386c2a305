/// Fraction of the gap to the target intensity closed per frame
pub const SMOOTHING_FACTOR: f32 = 0.1;

/// Clock advance per frame, in seconds, independent of wall time
pub const TIME_STEP: f32 = 0.016;

/// Animation clock and glitch intensity
///
/// `current_intensity` is never assigned directly: it starts at zero and only
/// moves through [`AnimationState::relax`], a first-order low-pass filter
/// toward `target_intensity`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    elapsed_time: f64,
    current_intensity: f32,
    target_intensity: f32,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed animation time in seconds
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Elapsed time as handed to the shading stage
    pub fn time(&self) -> f32 {
        self.elapsed_time as f32
    }

    pub fn current_intensity(&self) -> f32 {
        self.current_intensity
    }

    pub fn target_intensity(&self) -> f32 {
        self.target_intensity
    }

    pub fn set_target(&mut self, target: f32) {
        self.target_intensity = target.max(0.0);
    }

    /// Lower the target to `max` when it lies above it
    pub fn cap_target(&mut self, max: f32) {
        if self.target_intensity > max {
            self.set_target(max);
        }
    }

    /// Advance the clock by a fixed step
    pub fn advance_time(&mut self, step: f32) {
        self.elapsed_time += step.max(0.0) as f64;
    }

    /// Move `current_intensity` a fraction of the way toward the target
    pub fn relax(&mut self, factor: f32) {
        self.current_intensity += (self.target_intensity - self.current_intensity) * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_rest() {
        let state = AnimationState::new();
        assert_eq!(state.elapsed_time(), 0.0);
        assert_eq!(state.current_intensity(), 0.0);
        assert_eq!(state.target_intensity(), 0.0);
    }

    #[test]
    fn test_relax_closes_ten_percent_of_the_gap() {
        let mut state = AnimationState::new();
        state.set_target(1.0);
        state.relax(SMOOTHING_FACTOR);
        assert!((state.current_intensity() - 0.1).abs() < 1e-7);
        state.relax(SMOOTHING_FACTOR);
        assert!((state.current_intensity() - 0.19).abs() < 1e-7);
    }

    #[test]
    fn test_error_decays_geometrically() {
        let mut state = AnimationState::new();
        let target = 0.85;
        state.set_target(target);

        let mut previous_error = target;
        for _ in 0..50 {
            state.relax(SMOOTHING_FACTOR);
            let error = (target - state.current_intensity()).abs();
            assert!((error - previous_error * 0.9).abs() < 1e-5);
            previous_error = error;
        }

        for _ in 0..200 {
            state.relax(SMOOTHING_FACTOR);
        }
        assert!((state.current_intensity() - target).abs() < 1e-6);
    }

    #[test]
    fn test_negative_targets_are_floored() {
        let mut state = AnimationState::new();
        state.set_target(-1.0);
        assert_eq!(state.target_intensity(), 0.0);
    }

    #[test]
    fn test_cap_target_only_lowers() {
        let mut state = AnimationState::new();
        state.set_target(0.9);
        state.cap_target(1.0);
        assert_eq!(state.target_intensity(), 0.9);
        state.cap_target(0.2);
        assert_eq!(state.target_intensity(), 0.2);
        // Current intensity still only moves by relaxing
        assert_eq!(state.current_intensity(), 0.0);
    }

    #[test]
    fn test_advance_time() {
        let mut state = AnimationState::new();
        for _ in 0..10 {
            state.advance_time(TIME_STEP);
        }
        assert!((state.elapsed_time() - 0.16).abs() < 1e-6);
    }
}

//! Per-pixel VHS shading.
//!
//! [`shade`] is a pure function of the sample coordinate, the frame's
//! [`Uniforms`] and the source texture. The passes run in a fixed order: each
//! one perturbs the sampling coordinate or the accumulated colour seen by the
//! next, so reordering them changes the look.

use super::hash::{cell_hash, hash2, step};
use super::params::EffectParams;

/// Spatial frequency of the fine scanlines
const SCANLINE_FREQUENCY: f32 = 800.0;
/// Spatial frequency of the thick scanline bands
const THICK_SCANLINE_FREQUENCY: f32 = 50.0;
/// Hash threshold for the sparse wonky scanlines
const JITTER_THRESHOLD: f32 = 0.985;
/// Hash threshold for the sparse vertical glitch bars
const BAR_THRESHOLD: f32 = 0.98;
/// Colour bleed added to a glitching scanline
const BLEED_RED: f32 = 0.06;
const BLEED_GREEN: f32 = 0.03;

/// Everything the shading pipeline reads for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// Animation clock in seconds
    pub time: f32,
    /// Smoothed glitch intensity
    pub glitch_intensity: f32,
    /// Output surface size in pixels
    pub resolution: [f32; 2],
    /// Source image size in pixels
    pub image_size: [f32; 2],
    pub params: EffectParams,
}

/// Source of texels for the shading stage
pub trait Sampler: Sync {
    /// Sample RGB at normalized texture coordinates; `(0, 0)` is the top-left texel.
    fn sample(&self, u: f32, v: f32) -> [f32; 3];
}

/// Scanline darkening for a row, and whether the row is glitching.
pub fn scanline(v: f32, time: f32, params: &EffectParams) -> (f32, bool) {
    let scroll_y = v + time * params.scanline_speed;
    let mut value = (scroll_y * SCANLINE_FREQUENCY).sin() * params.scanline_intensity;

    let roll = cell_hash(scroll_y, 100.0, time, 5.0);
    let glitching = roll > params.scanline_glitch_threshold;
    if glitching {
        value *= 2.0;
    }

    value += ((scroll_y + time * params.thick_scanline_speed) * THICK_SCANLINE_FREQUENCY).sin()
        * params.thick_scanline_intensity;

    (value, glitching)
}

/// Horizontal sampling offset for a row: tearing, jitter and glitch bars.
pub fn horizontal_offset(v: f32, time: f32, intensity: f32, params: &EffectParams) -> f32 {
    let scroll_y = v + time * params.scanline_speed;

    let noise = cell_hash(v, 150.0, time, 10.0);
    let mut distortion = (noise - 0.5) * intensity * params.horizontal_distortion;

    let jitter = step(JITTER_THRESHOLD, cell_hash(scroll_y, 200.0, time, 8.0));
    distortion += jitter * (noise - 0.5) * params.scanline_jitter;

    let bar = step(BAR_THRESHOLD, cell_hash(v, 25.0, time, 15.0));
    distortion + bar * (noise - 0.5) * intensity * params.vertical_glitch_bars
}

/// Shade one sample. Channels are not clamped.
pub fn shade<S: Sampler + ?Sized>(uv: [f32; 2], uniforms: &Uniforms, texture: &S) -> [f32; 3] {
    let params = &uniforms.params;
    let time = uniforms.time;
    let intensity = uniforms.glitch_intensity;

    let (scan, glitching) = scanline(uv[1], time, params);

    let u = uv[0] + horizontal_offset(uv[1], time, intensity, params);
    let v = uv[1];

    // Chromatic misalignment: red one way, blue the other, green in place
    let shift = params.rgb_shift_intensity * intensity;
    let mut color = [
        texture.sample(u + shift, v)[0],
        texture.sample(u, v)[1],
        texture.sample(u - shift, v)[2],
    ];

    for c in color.iter_mut() {
        *c -= scan;
    }

    if glitching {
        color[0] += BLEED_RED;
        color[1] -= BLEED_GREEN;
    }

    for (c, grade) in color.iter_mut().zip(params.color_grade) {
        *c *= grade;
    }

    let grain = hash2(u + time, v + time) * params.noise_intensity;
    for c in color.iter_mut() {
        *c += grain;
    }

    let (dx, dy) = (u - 0.5, v - 0.5);
    let vignette = 1.0 - (dx * dx + dy * dy) * params.vignette_strength;
    for c in color.iter_mut() {
        *c *= vignette;
    }

    color
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat([f32; 3]);

    impl Sampler for Flat {
        fn sample(&self, _u: f32, _v: f32) -> [f32; 3] {
            self.0
        }
    }

    /// Horizontal ramp: every channel equals the clamped u coordinate
    struct Ramp;

    impl Sampler for Ramp {
        fn sample(&self, u: f32, _v: f32) -> [f32; 3] {
            let u = u.clamp(0.0, 1.0);
            [u, u, u]
        }
    }

    fn neutral_params() -> EffectParams {
        EffectParams {
            scanline_intensity: 0.0,
            thick_scanline_intensity: 0.0,
            scanline_glitch_threshold: 1.0,
            horizontal_distortion: 0.0,
            scanline_jitter: 0.0,
            vertical_glitch_bars: 0.0,
            rgb_shift_intensity: 0.0,
            color_grade: [1.0, 1.0, 1.0],
            noise_intensity: 0.0,
            vignette_strength: 0.0,
            ..EffectParams::default()
        }
    }

    fn uniforms(params: EffectParams, intensity: f32) -> Uniforms {
        Uniforms {
            time: 1.234,
            glitch_intensity: intensity,
            resolution: [640.0, 360.0],
            image_size: [512.0, 512.0],
            params,
        }
    }

    fn assert_close(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_neutral_params_pass_texture_through() {
        let out = shade([0.3, 0.7], &uniforms(neutral_params(), 1.0), &Flat([0.2, 0.4, 0.6]));
        assert_close(out, [0.2, 0.4, 0.6]);
    }

    #[test]
    fn test_color_grade_multiplies_channels() {
        let params = EffectParams { color_grade: [1.1, 0.95, 0.9], ..neutral_params() };
        let out = shade([0.5, 0.5], &uniforms(params, 0.0), &Flat([0.5, 0.5, 0.5]));
        assert_close(out, [0.55, 0.475, 0.45]);
    }

    #[test]
    fn test_vignette_darkens_corners_not_center() {
        let params = EffectParams { vignette_strength: 0.3, ..neutral_params() };
        let u = uniforms(params, 0.0);
        let center = shade([0.5, 0.5], &u, &Flat([1.0; 3]));
        let corner = shade([0.0, 0.0], &u, &Flat([1.0; 3]));
        assert_close(center, [1.0; 3]);
        // 1 - 0.5 * 0.3
        assert_close(corner, [0.85; 3]);
    }

    #[test]
    fn test_grain_adds_the_same_value_to_every_channel() {
        let params = EffectParams { noise_intensity: 0.2, ..neutral_params() };
        let u = uniforms(params, 1.0);
        let out = shade([0.3, 0.7], &u, &Flat([0.2, 0.4, 0.6]));

        let grain = hash2(0.3 + u.time, 0.7 + u.time) * 0.2;
        assert!(grain > 0.01);
        assert_close(out, [0.2 + grain, 0.4 + grain, 0.6 + grain]);
    }

    #[test]
    fn test_vignette_follows_the_torn_coordinate() {
        let params = EffectParams {
            horizontal_distortion: 0.3,
            vignette_strength: 0.8,
            ..neutral_params()
        };
        let u = uniforms(params, 1.0);
        let offset = horizontal_offset(0.25, u.time, 1.0, &params);
        assert!(offset.abs() > 0.05, "row not torn: {}", offset);

        let out = shade([0.5, 0.25], &u, &Flat([1.0; 3]));
        let dx = offset;
        let torn = 1.0 - (dx * dx + 0.0625) * 0.8;
        assert_close(out, [torn; 3]);
        // Untorn centre would give 1 - 0.0625 * 0.8
        assert!((out[0] - 0.95).abs() > 1e-3);
    }

    #[test]
    fn test_scanlines_subtract_from_color() {
        let params = EffectParams { scanline_intensity: 0.04, ..neutral_params() };
        let u = uniforms(params, 0.0);
        let (scan, glitching) = scanline(0.42, u.time, &params);
        assert!(!glitching);
        let out = shade([0.5, 0.42], &u, &Flat([0.5; 3]));
        assert_close(out, [0.5 - scan; 3]);
        assert!(scan.abs() <= 0.04 + 1e-6);
    }

    #[test]
    fn test_glitching_scanline_bleeds_red() {
        // A zero threshold makes (nearly) every row glitch
        let params = EffectParams { scanline_glitch_threshold: 0.0, ..neutral_params() };
        let u = uniforms(params, 0.0);
        let (_, glitching) = scanline(0.25, u.time, &params);
        assert!(glitching);
        let out = shade([0.5, 0.25], &u, &Flat([0.5; 3]));
        assert_close(out, [0.56, 0.47, 0.5]);
    }

    #[test]
    fn test_rgb_shift_separates_red_and_blue() {
        let params = EffectParams { rgb_shift_intensity: 0.01, ..neutral_params() };
        let out = shade([0.5, 0.5], &uniforms(params, 2.0), &Ramp);
        assert_close(out, [0.52, 0.5, 0.48]);
    }

    #[test]
    fn test_zero_intensity_has_no_tearing() {
        let params = EffectParams {
            horizontal_distortion: 0.5,
            vertical_glitch_bars: 1.0,
            ..neutral_params()
        };
        for row in 0..100 {
            let v = row as f32 / 100.0;
            assert_eq!(horizontal_offset(v, 3.0, 0.0, &params), 0.0);
        }
    }

    #[test]
    fn test_tearing_is_bounded_by_intensity() {
        let params = EffectParams {
            horizontal_distortion: 0.1,
            vertical_glitch_bars: 0.2,
            scanline_jitter: 0.0,
            ..neutral_params()
        };
        let intensity = 1.3;
        let bound = 0.5 * intensity * (0.1 + 0.2) + 1e-6;
        for row in 0..500 {
            let v = row as f32 / 500.0;
            let offset = horizontal_offset(v, 0.75, intensity, &params);
            assert!(offset.abs() <= bound, "row {} offset {}", row, offset);
        }
    }

    #[test]
    fn test_shading_is_deterministic() {
        let params = EffectParams::default();
        let u = uniforms(params, 0.8);
        assert_eq!(shade([0.1, 0.9], &u, &Ramp), shade([0.1, 0.9], &u, &Ramp));
    }
}

//! Stateless 2D hash noise.
//!
//! The classic `fract(sin(dot(p, k)) * 43758.5453)` construction. Every effect
//! layer quantizes its own coordinate grid and time bucket before hashing, so
//! the same `(cell, bucket)` always yields the same value within a frame and
//! the layers decorrelate because their grids differ.

const DOT_X: f32 = 12.9898;
const DOT_Y: f32 = 78.233;
const SCALE: f32 = 43758.5453123;

/// Deterministic pseudo-random value in `[0, 1)` for a 2D coordinate.
#[inline]
pub fn hash2(x: f32, y: f32) -> f32 {
    // Evaluated in f64 so large time buckets keep enough fractional bits.
    let d = x as f64 * DOT_X as f64 + y as f64 * DOT_Y as f64;
    let v = d.sin() * SCALE as f64;
    let f = (v - v.floor()) as f32;
    // Rounding on the f64 -> f32 cast can land exactly on 1.0
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Hash of a grid cell: `hash2(floor(x * x_scale), floor(t * t_scale))`.
#[inline]
pub fn cell_hash(x: f32, x_scale: f32, t: f32, t_scale: f32) -> f32 {
    hash2((x * x_scale).floor(), (t * t_scale).floor())
}

/// GLSL-style `step(edge, x)`.
#[inline]
pub fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

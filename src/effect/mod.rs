//! # VHS Effect
//!
//! The single shading pass and its inputs.
//!
//! - [`hash`]: stateless 2D hash noise shared by every glitch layer
//! - [`shader`]: per-pixel shading (scanlines, tearing, RGB shift, grading,
//!   grain, vignette)
//! - [`vertex`]: aspect-preserving quad placement
//! - [`program`]: declared stage interfaces, build validation and uniform binding
//! - [`params`]: the named tunables and the shared handle to them
//!
//! ## Usage
//!
//! ```rust
//! use vhs_glitch::effect::{params::ParameterSet, shader::{shade, Sampler, Uniforms}};
//!
//! struct Gray;
//! impl Sampler for Gray {
//!     fn sample(&self, _u: f32, _v: f32) -> [f32; 3] { [0.5; 3] }
//! }
//!
//! let uniforms = Uniforms {
//!     time: 0.5,
//!     glitch_intensity: 0.0,
//!     resolution: [640.0, 360.0],
//!     image_size: [512.0, 512.0],
//!     params: ParameterSet::new().snapshot(),
//! };
//! let color = shade([0.5, 0.5], &uniforms, &Gray);
//! assert!(color.iter().all(|c| c.is_finite()));
//! ```

pub mod hash;
pub mod params;
pub mod program;
pub mod shader;
pub mod vertex;

pub use params::{EffectParams, ParamHandle, ParamSpec, ParamValue, ParameterSet};
pub use program::{ProgramSource, ShaderProgram};
pub use shader::{shade, Sampler, Uniforms};
pub use vertex::quad_scale;

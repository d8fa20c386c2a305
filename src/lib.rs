//! # vhs-glitch
//!
//! A VHS tape-glitch overlay for still images.
//!
//! One image is drawn as a scaled, aspect-preserving quad on a software
//! surface and run through a per-pixel pass that imitates analog video:
//! rolling scanlines, horizontal tearing, chromatic aberration, colour bleed,
//! grain, colour grading and a vignette. A scheduler fires irregular glitch
//! bursts whose intensity is smoothed frame to frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vhs_glitch::{
//!     config::Config,
//!     effect::ParamHandle,
//!     engine::{GlitchEngine, StopCondition},
//!     surface::{AssetLoader, SoftwareBackend, SurfaceSize},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let params = ParamHandle::new(config.params.clone());
//! let backend = SoftwareBackend::new(SurfaceSize::new(640, 360), 4)?;
//!
//! let mut engine = GlitchEngine::new(&config, params, Box::new(backend))?;
//! engine.post_asset(AssetLoader::default().load("photo.png").await);
//!
//! let summary = engine.run(StopCondition::frames(300)).await?;
//! println!("{} glitches in {} frames", summary.glitches, summary.frames);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`effect`] - Parameters, hash, pixel shading, quad placement and the program interface
//! - [`animation`] - Clock, intensity smoothing, glitch scheduler and frame driver
//! - [`surface`] - Render backends, textures, image loading and frame output
//! - [`control`] - Runtime parameter access and control scripts
//! - [`engine`] - The event loop tying it all together
//! - [`config`] - Configuration management

pub mod animation;
pub mod config;
pub mod control;
pub mod effect;
pub mod engine;
pub mod error;
pub mod surface;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    effect::{ParamHandle, ParameterSet},
    engine::{GlitchEngine, RunSummary, StopCondition},
    error::{GlitchError, Result},
};

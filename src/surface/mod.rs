//! # Surface Module
//!
//! Everything between the frame driver and actual pixels: surface and image
//! sizes, the source texture and its loader, the render backends and the PNG
//! frame recorder.

pub mod backend;
pub mod loader;
pub mod recorder;
pub mod texture;
pub mod types;

pub use backend::{DrawCall, HeadlessBackend, RenderBackend, SoftwareBackend};
pub use loader::{AssetLoader, AssetStatus};
pub use recorder::FrameRecorder;
pub use texture::Texture;
pub use types::{Color, Frame, ImageDimensions, SurfaceSize};

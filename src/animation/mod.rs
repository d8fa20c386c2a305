//! # Animation Model
//!
//! The time-varying half of the effect: the animation clock, the glitch
//! intensity filter, the glitch scheduler and the per-frame driver, all
//! coordinated through a single-threaded virtual-clock event queue.

pub mod driver;
pub mod events;
pub mod scheduler;
pub mod state;

pub use driver::{FrameDriver, FrameOutcome};
pub use events::{Event, EventQueue, VirtualTime};
pub use scheduler::{GlitchPhase, GlitchScheduler};
pub use state::AnimationState;

//! Stagehand Fade - full-screen fade-to-black overlay
//!
//! [`FadeManager`] ramps the opacity of a host [`Overlay`] one step per
//! frame. Fading in darkens the screen (alpha toward 1.0), fading out clears
//! it (alpha toward 0.0). While any darkness is on screen the overlay
//! swallows pointer input.

pub mod manager;
pub mod overlay;

use stagehand_tick::TickError;
use thiserror::Error;

pub use manager::FadeManager;
pub use overlay::{MemoryOverlay, Overlay, OverlaySetup};

/// Fade errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FadeError {
    #[error("Fade rejected: {0}")]
    Tick(#[from] TickError),
}

pub type FadeResult<T> = Result<T, FadeError>;

pub mod prelude {
    pub use crate::manager::FadeManager;
    pub use crate::overlay::{MemoryOverlay, Overlay, OverlaySetup};
    pub use crate::{FadeError, FadeResult};
}

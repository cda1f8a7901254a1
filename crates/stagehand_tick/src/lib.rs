//! Stagehand Tick - frame-driven state objects
//!
//! Nothing here owns a thread or a timer. The host calls `tick` once per
//! rendered frame and every state object advances by exactly one step:
//!
//! - [`RampController`] - linear interpolation over a fixed step count
//! - [`DeferredInvoker`] - callbacks that fire after N ticks or after a sequence
//! - [`OwnerToken`] - ties scheduled work to a component's lifetime
//!
//! # Example
//!
//! ```ignore
//! use stagehand_tick::prelude::*;
//!
//! let mut ramp = RampController::new(0.0);
//! ramp.start(1.0, 4, None)?;
//! while ramp.is_active() {
//!     ramp.tick();
//! }
//! assert_eq!(ramp.value(), 1.0);
//! ```

pub mod deferred;
pub mod ramp;

use thiserror::Error;

pub use deferred::{
    DeferredInvoker, OwnerToken, OwnerWatch, Sequence, SequenceStatus, TaskId, WaitTicks,
};
pub use ramp::{RampController, RampState, RampStep};

/// Tick errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickError {
    /// Rejected argument, e.g. a non-positive step count
    #[error("Invalid argument: {0}")]
    InvalidArgument(Box<str>),
}

/// Something the host frame loop advances once per frame
pub trait Tick {
    /// Advance by one frame
    fn tick(&mut self);
}

pub mod prelude {
    pub use crate::deferred::{
        DeferredInvoker, OwnerToken, Sequence, SequenceStatus, TaskId, WaitTicks,
    };
    pub use crate::ramp::{RampController, RampState, RampStep};
    pub use crate::{Tick, TickError};
}

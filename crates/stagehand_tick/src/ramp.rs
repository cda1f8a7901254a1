//! Linear ramps over a fixed number of ticks
//!
//! A ramp moves a scalar (volume, opacity) from its current value to a target
//! in `steps` equal increments, one per tick. On the last tick the value is
//! assigned the target exactly instead of trusting the accumulated sum, then
//! the completion callback fires once.
//!
//! Starting a ramp while one is in flight replaces it outright: the new
//! target and step count win and the old callback is dropped unfired.

use serde::{Deserialize, Serialize};
use stagehand_core::{invoke_if_set, Callback};

use crate::deferred::{Sequence, SequenceStatus};
use crate::TickError;

/// Ramp status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RampState {
    /// No ramp in flight
    #[default]
    Idle,
    /// Moving toward a target at or above the start value
    RampingUp,
    /// Moving toward a target below the start value
    RampingDown,
}

impl RampState {
    /// Check if a ramp is in flight
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Update produced by one tick, for mirroring onto driven values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampStep {
    /// Add this delta
    Advance(f32),
    /// Final tick: assign this exact value
    Settle(f32),
}

impl RampStep {
    /// Apply the step to a driven value
    #[inline]
    pub fn apply(self, value: &mut f32) {
        match self {
            Self::Advance(delta) => *value += delta,
            Self::Settle(target) => *value = target,
        }
    }
}

/// Tick-driven linear ramp of a single scalar
pub struct RampController {
    state: RampState,
    current: f32,
    target: f32,
    delta: f32,
    remaining: u32,
    on_complete: Option<Callback>,
}

impl RampController {
    /// Create an idle ramp resting at `initial`
    pub fn new(initial: f32) -> Self {
        Self {
            state: RampState::Idle,
            current: initial,
            target: initial,
            delta: 0.0,
            remaining: 0,
            on_complete: None,
        }
    }

    /// Ramp from the current value to `target` over `steps` ticks
    pub fn start(
        &mut self,
        target: f32,
        steps: i32,
        on_complete: Option<Callback>,
    ) -> Result<(), TickError> {
        let steps = validate_steps(steps)?;

        if self.state.is_active() {
            log::debug!(
                "Ramp to {} preempted by ramp to {} ({} steps left)",
                self.target,
                target,
                self.remaining
            );
        }

        self.state = if target >= self.current {
            RampState::RampingUp
        } else {
            RampState::RampingDown
        };
        self.target = target;
        self.delta = (target - self.current) / steps as f32;
        self.remaining = steps;
        self.on_complete = on_complete;
        Ok(())
    }

    /// Jump to `from`, then ramp to `target`
    pub fn start_from(
        &mut self,
        from: f32,
        target: f32,
        steps: i32,
        on_complete: Option<Callback>,
    ) -> Result<(), TickError> {
        validate_steps(steps)?;
        self.current = from;
        self.start(target, steps, on_complete)
    }

    /// Advance one tick, returning true on the tick that completes the ramp
    pub fn tick(&mut self) -> bool {
        self.tick_with(|_| {})
    }

    /// Advance one tick, passing the update to `apply` before any callback fires
    pub fn tick_with<F: FnMut(RampStep)>(&mut self, mut apply: F) -> bool {
        if !self.state.is_active() {
            return false;
        }

        self.remaining -= 1;
        if self.remaining > 0 {
            self.current += self.delta;
            apply(RampStep::Advance(self.delta));
            return false;
        }

        self.current = self.target;
        apply(RampStep::Settle(self.target));
        self.state = RampState::Idle;
        self.delta = 0.0;
        log::debug!("Ramp settled at {}", self.target);
        invoke_if_set(self.on_complete.take());
        true
    }

    /// Abort the ramp where it stands, dropping the callback unfired
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            log::debug!("Ramp to {} cancelled at {}", self.target, self.current);
        }
        self.state = RampState::Idle;
        self.delta = 0.0;
        self.remaining = 0;
        self.on_complete = None;
    }

    /// Set the value directly, cancelling any ramp in flight
    pub fn set_value(&mut self, value: f32) {
        self.cancel();
        self.current = value;
        self.target = value;
    }

    /// Current value
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Target of the current or last ramp
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Per-tick increment
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Ticks left before settling
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Current status
    pub fn state(&self) -> RampState {
        self.state
    }

    /// Check if a ramp is in flight
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

impl Default for RampController {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl std::fmt::Debug for RampController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RampController")
            .field("state", &self.state)
            .field("current", &self.current)
            .field("target", &self.target)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl Sequence for RampController {
    fn advance(&mut self) -> SequenceStatus {
        if self.is_active() {
            self.tick();
        }
        if self.is_active() {
            SequenceStatus::Pending
        } else {
            SequenceStatus::Complete
        }
    }
}

fn validate_steps(steps: i32) -> Result<u32, TickError> {
    if steps <= 0 {
        return Err(TickError::InvalidArgument(
            format!("ramp step count must be positive, got {}", steps).into(),
        ));
    }
    Ok(steps as u32)
}

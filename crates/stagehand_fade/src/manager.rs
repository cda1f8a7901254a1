//! Fade manager

use stagehand_core::Callback;
use stagehand_tick::{RampController, RampState, Tick};

use crate::overlay::{Overlay, OverlaySetup};
use crate::FadeResult;

/// Opacity of a fully dark screen
const OPAQUE: f32 = 1.0;
/// Opacity of a clear screen
const CLEAR: f32 = 0.0;

/// Drives a full-screen overlay's opacity one step per frame
pub struct FadeManager<O: Overlay> {
    overlay: O,
    setup: OverlaySetup,
    ramp: RampController,
}

impl<O: Overlay> FadeManager<O> {
    /// Take over `overlay` and lay it out with `setup`
    pub fn new(overlay: O, setup: OverlaySetup) -> Self {
        let mut manager = Self {
            overlay,
            setup,
            ramp: RampController::default(),
        };
        manager.initialize();
        manager
    }

    /// Re-apply the setup and drop any running fade
    pub fn initialize(&mut self) {
        if self.ramp.is_active() {
            log::debug!("Fade cancelled by initialize");
        }
        self.overlay.configure(&self.setup);
        self.ramp = RampController::new(self.overlay.alpha());
        self.sync_raycasts();
    }

    /// Current opacity
    pub fn alpha(&self) -> f32 {
        self.overlay.alpha()
    }

    /// Jump to `alpha`, cancelling any running fade
    pub fn set_alpha(&mut self, alpha: f32) {
        self.overlay.set_alpha(alpha);
        self.ramp.set_value(alpha);
        self.sync_raycasts();
    }

    /// Darken the screen over `steps` frames
    pub fn start_fade_in(&mut self, steps: i32, on_complete: Option<Callback>) -> FadeResult<()> {
        self.start(OPAQUE, steps, on_complete)
    }

    /// Clear the screen over `steps` frames
    pub fn start_fade_out(&mut self, steps: i32, on_complete: Option<Callback>) -> FadeResult<()> {
        self.start(CLEAR, steps, on_complete)
    }

    fn start(&mut self, target: f32, steps: i32, on_complete: Option<Callback>) -> FadeResult<()> {
        let from = self.overlay.alpha();
        self.ramp.start_from(from, target, steps, on_complete)?;
        Ok(())
    }

    /// Check if a fade is running
    pub fn is_fading(&self) -> bool {
        self.ramp.is_active()
    }

    /// Fade status
    pub fn state(&self) -> RampState {
        self.ramp.state()
    }

    /// Setup applied by [`initialize`](Self::initialize)
    pub fn setup(&self) -> &OverlaySetup {
        &self.setup
    }

    /// Replace the setup; takes effect on the next [`initialize`](Self::initialize)
    pub fn set_setup(&mut self, setup: OverlaySetup) {
        self.setup = setup;
    }

    /// Overlay being driven
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    fn sync_raycasts(&mut self) {
        let blocks = self.overlay.alpha() > CLEAR;
        self.overlay.set_blocks_raycasts(blocks);
    }
}

impl<O: Overlay> Tick for FadeManager<O> {
    fn tick(&mut self) {
        let overlay = &mut self.overlay;
        self.ramp.tick_with(|step| {
            let mut alpha = overlay.alpha();
            step.apply(&mut alpha);
            overlay.set_alpha(alpha);
            overlay.set_blocks_raycasts(alpha > CLEAR);
        });
    }
}

impl<O: Overlay> std::fmt::Debug for FadeManager<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FadeManager")
            .field("alpha", &self.overlay.alpha())
            .field("ramp", &self.ramp)
            .finish()
    }
}

//! Overlay surface and its setup

use serde::{Deserialize, Serialize};

/// Host full-screen panel the fade draws on
pub trait Overlay {
    /// Current opacity
    fn alpha(&self) -> f32;

    /// Set opacity
    fn set_alpha(&mut self, alpha: f32);

    /// Check if the overlay swallows pointer input
    fn blocks_raycasts(&self) -> bool;

    /// Set whether the overlay swallows pointer input
    fn set_blocks_raycasts(&mut self, blocks: bool);

    /// Set draw order relative to other canvases
    fn set_sort_order(&mut self, order: i32);

    /// Set panel color (RGBA)
    fn set_color(&mut self, color: [f32; 4]);

    /// Set panel size in pixels
    fn set_size(&mut self, size: [f32; 2]);

    /// Apply every field of `setup`
    fn configure(&mut self, setup: &OverlaySetup) {
        self.set_sort_order(setup.sort_order);
        self.set_color(setup.color);
        self.set_size(setup.size);
        self.set_alpha(setup.alpha);
        self.set_blocks_raycasts(setup.blocks_raycasts);
    }
}

/// How the overlay is laid out when (re)initialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySetup {
    /// Canvas sort order; high so the overlay covers everything
    pub sort_order: i32,
    /// Panel color (RGBA)
    pub color: [f32; 4],
    /// Panel size in pixels
    pub size: [f32; 2],
    /// Starting opacity
    pub alpha: f32,
    /// Starting input blocking
    pub blocks_raycasts: bool,
}

impl OverlaySetup {
    /// Create default setup
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sort order
    pub fn with_sort_order(mut self, order: i32) -> Self {
        self.sort_order = order;
        self
    }

    /// Set color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Set size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }
}

impl Default for OverlaySetup {
    fn default() -> Self {
        Self {
            sort_order: 999,
            color: [0.0, 0.0, 0.0, 1.0],
            size: [2000.0, 2000.0],
            alpha: 0.0,
            blocks_raycasts: false,
        }
    }
}

/// In-memory overlay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryOverlay {
    pub alpha: f32,
    pub blocks_raycasts: bool,
    pub sort_order: i32,
    pub color: [f32; 4],
    pub size: [f32; 2],
}

impl MemoryOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Overlay for MemoryOverlay {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn blocks_raycasts(&self) -> bool {
        self.blocks_raycasts
    }

    fn set_blocks_raycasts(&mut self, blocks: bool) {
        self.blocks_raycasts = blocks;
    }

    fn set_sort_order(&mut self, order: i32) {
        self.sort_order = order;
    }

    fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    fn set_size(&mut self, size: [f32; 2]) {
        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_applies_setup() {
        let mut overlay = MemoryOverlay::new();
        overlay.configure(&OverlaySetup::new().with_size(640.0, 480.0));

        assert_eq!(overlay.sort_order, 999);
        assert_eq!(overlay.color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(overlay.size, [640.0, 480.0]);
        assert_eq!(overlay.alpha, 0.0);
        assert!(!overlay.blocks_raycasts);
    }

    #[test]
    fn test_setup_deserialize_partial() {
        let setup: OverlaySetup = serde_json::from_str(r#"{"sort_order": 5}"#).unwrap();
        assert_eq!(setup.sort_order, 5);
        assert_eq!(setup.size, [2000.0, 2000.0]);
    }
}

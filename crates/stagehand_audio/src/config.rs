//! Sound manager settings

use serde::{Deserialize, Serialize};

/// Upper bound on playback channels
pub const MAX_CHANNELS: usize = 16;

/// Settings for a [`SoundManager`](crate::SoundManager)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundManagerConfig {
    /// Number of playback channels (1 - 16)
    pub channels: usize,
    /// Channel used for one-shot effects
    pub one_shot_channel: usize,
    /// Default fade-in target (toward silence)
    pub fade_in_volume: f32,
    /// Default fade-out target (back to full)
    pub fade_out_volume: f32,
}

impl SoundManagerConfig {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set channel count
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Set one-shot channel
    pub fn with_one_shot_channel(mut self, channel: usize) -> Self {
        self.one_shot_channel = channel;
        self
    }

    /// Set default fade targets
    pub fn with_fade_volumes(mut self, fade_in: f32, fade_out: f32) -> Self {
        self.fade_in_volume = fade_in;
        self.fade_out_volume = fade_out;
        self
    }

    /// Channel count pulled into `1..=MAX_CHANNELS`
    pub fn effective_channels(&self) -> usize {
        let clamped = self.channels.clamp(1, MAX_CHANNELS);
        if clamped != self.channels {
            log::warn!(
                "channel count {} out of range 1..={}, using {}",
                self.channels,
                MAX_CHANNELS,
                clamped
            );
        }
        clamped
    }
}

impl Default for SoundManagerConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            one_shot_channel: 0,
            fade_in_volume: 0.0,
            fade_out_volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_channels() {
        assert_eq!(SoundManagerConfig::new().with_channels(0).effective_channels(), 1);
        assert_eq!(SoundManagerConfig::new().with_channels(4).effective_channels(), 4);
        assert_eq!(SoundManagerConfig::new().with_channels(40).effective_channels(), MAX_CHANNELS);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: SoundManagerConfig = serde_json::from_str(r#"{"channels": 3}"#).unwrap();
        assert_eq!(config.channels, 3);
        assert_eq!(config.fade_out_volume, 1.0);
    }
}

//! Playback channels
//!
//! A channel is one independently addressable playback slot. The registry
//! owns a fixed number of them and never fails an index: anything outside
//! `[0, count)` is pulled to the nearest end and reported as a warning.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AudioError;

/// Host playback primitive behind a channel
pub trait Channel {
    /// Clip type this channel can play
    type Clip;

    /// Replace the current clip and start it
    fn play(&mut self, clip: &Self::Clip, looping: bool);

    /// Fire a clip over whatever is playing, scaled by `volume`
    fn play_one_shot(&mut self, clip: &Self::Clip, volume: f32);

    /// Pause the current clip
    fn pause(&mut self);

    /// Continue a paused clip
    fn unpause(&mut self);

    /// Stop and rewind the current clip
    fn stop(&mut self);

    /// Check if audio is currently audible
    fn is_playing(&self) -> bool;

    /// Check if a clip is paused mid-way
    fn is_paused(&self) -> bool;

    /// Channel volume
    fn volume(&self) -> f32;

    /// Set channel volume
    fn set_volume(&mut self, volume: f32);
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// In-memory channel that records what it was asked to do
#[derive(Debug, Clone)]
pub struct MemoryChannel<C> {
    clip: Option<C>,
    looping: bool,
    state: PlaybackState,
    volume: f32,
    one_shots: Vec<(C, f32)>,
}

impl<C> MemoryChannel<C> {
    /// Create a stopped channel at full volume
    pub fn new() -> Self {
        Self {
            clip: None,
            looping: false,
            state: PlaybackState::Stopped,
            volume: 1.0,
            one_shots: Vec::new(),
        }
    }

    /// Current clip
    pub fn clip(&self) -> Option<&C> {
        self.clip.as_ref()
    }

    /// Whether the current clip loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// One-shot clips fired so far with their volumes
    pub fn one_shots(&self) -> &[(C, f32)] {
        &self.one_shots
    }
}

impl<C> Default for MemoryChannel<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone> Channel for MemoryChannel<C> {
    type Clip = C;

    fn play(&mut self, clip: &C, looping: bool) {
        self.clip = Some(clip.clone());
        self.looping = looping;
        self.state = PlaybackState::Playing;
    }

    fn play_one_shot(&mut self, clip: &C, volume: f32) {
        self.one_shots.push((clip.clone(), volume));
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    fn unpause(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

/// Which bound an index crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    /// Below zero
    BelowMin,
    /// At or past the channel count
    AboveMax,
}

/// Result of clamping a caller-supplied channel index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedIndex {
    /// Valid index
    pub index: usize,
    /// Set when the request had to be clamped
    pub violation: Option<RangeViolation>,
}

impl ClampedIndex {
    /// Check if the request was out of range
    pub fn was_clamped(&self) -> bool {
        self.violation.is_some()
    }
}

/// Fixed-size set of playback channels
pub struct ChannelRegistry<Ch> {
    channels: Vec<Ch>,
}

impl<Ch> ChannelRegistry<Ch> {
    /// Take ownership of a non-empty set of channels
    pub fn new(channels: Vec<Ch>) -> Result<Self, AudioError> {
        if channels.is_empty() {
            return Err(AudioError::InvalidChannelCount(0));
        }
        Ok(Self { channels })
    }

    /// Build `count` channels with a factory
    pub fn with_count<F>(count: usize, factory: F) -> Result<Self, AudioError>
    where
        F: FnMut(usize) -> Ch,
    {
        Self::new((0..count).map(factory).collect())
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Pull `index` into `[0, count)`, warning when it had to move
    pub fn clamp_index(&self, index: isize) -> ClampedIndex {
        let count = self.channels.len();
        if index < 0 {
            log::warn!(
                "channel index is out of range (min over): 0 <= {} < {}",
                index,
                count
            );
            return ClampedIndex {
                index: 0,
                violation: Some(RangeViolation::BelowMin),
            };
        }
        if index as usize >= count {
            log::warn!(
                "channel index is out of range (max over): 0 <= {} < {}",
                index,
                count
            );
            return ClampedIndex {
                index: count - 1,
                violation: Some(RangeViolation::AboveMax),
            };
        }
        ClampedIndex {
            index: index as usize,
            violation: None,
        }
    }

    /// Channel at `index`, clamped
    pub fn get(&self, index: isize) -> &Ch {
        let slot = self.clamp_index(index).index;
        &self.channels[slot]
    }

    /// Mutable channel at `index`, clamped
    pub fn get_mut(&mut self, index: isize) -> &mut Ch {
        let slot = self.clamp_index(index).index;
        &mut self.channels[slot]
    }

    /// Channel at an index already known to be valid
    pub(crate) fn slot_mut(&mut self, slot: usize) -> &mut Ch {
        &mut self.channels[slot]
    }

    /// Iterate in channel order
    pub fn iter(&self) -> impl Iterator<Item = &Ch> {
        self.channels.iter()
    }

    /// Iterate mutably in channel order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ch> {
        self.channels.iter_mut()
    }
}

impl<Ch> fmt::Debug for ChannelRegistry<Ch> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels.len())
            .finish()
    }
}

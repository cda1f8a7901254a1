//! Stagehand Audio - channel-based sound manager
//!
//! # Features
//!
//! - Fixed set of playback channels with forgiving (clamped) indexing
//! - Sounds looked up by key or by position in a [`SoundTable`]
//! - Looping BGM and one-shot SE playback
//! - Per-channel and all-channel volume fades driven by the frame tick
//!
//! The host audio capability is reached through the [`Channel`] trait.
//! [`MemoryChannel`] records playback without a device; the `rodio-backend`
//! feature adds a real output.
//!
//! # Example
//!
//! ```ignore
//! use stagehand_audio::prelude::*;
//!
//! let mut sounds = SoundManager::new(SoundManagerConfig::default().with_channels(2), |_| {
//!     MemoryChannel::<String>::new()
//! })?;
//! sounds.register_sound_table(SoundTable::from_entries([("bgm_title".to_string(), "title.ogg".to_string())]));
//! sounds.play_bgm("bgm_title", 0)?;
//! sounds.start_fade_in(60, None, 0, None)?;
//! ```

pub mod channel;
pub mod config;
pub mod manager;
pub mod sound_list;

#[cfg(feature = "rodio-backend")]
pub mod rodio_channel;

use stagehand_core::TableError;
use stagehand_tick::TickError;
use thiserror::Error;

pub use channel::{Channel, ChannelRegistry, ClampedIndex, MemoryChannel, PlaybackState, RangeViolation};
pub use config::{SoundManagerConfig, MAX_CHANNELS};
pub use manager::SoundManager;
pub use sound_list::{SoundList, SoundTable};

#[cfg(feature = "rodio-backend")]
pub use rodio_channel::{AudioClip, RodioChannel, RodioOutput};

/// Audio errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("Sound lookup failed: {0}")]
    Table(#[from] TableError),

    #[error("Fade rejected: {0}")]
    Tick(#[from] TickError),

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

pub mod prelude {
    pub use crate::channel::{Channel, ChannelRegistry, MemoryChannel, PlaybackState};
    pub use crate::config::SoundManagerConfig;
    pub use crate::manager::SoundManager;
    pub use crate::sound_list::{SoundList, SoundTable};
    pub use crate::{AudioError, AudioResult};
}

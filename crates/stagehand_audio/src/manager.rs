//! Sound manager
//!
//! Plays sounds from the registered [`SoundTable`] on a fixed set of
//! channels and fades channel volumes over a number of frames.
//!
//! Lookup failures skip the requested operation: the error is logged and
//! returned, and nothing is played. Channel indices are never an error, they
//! are clamped by the [`ChannelRegistry`].

use stagehand_core::Callback;
use stagehand_tick::{RampController, RampState, Tick};

use crate::channel::{Channel, ChannelRegistry};
use crate::config::SoundManagerConfig;
use crate::sound_list::SoundTable;
use crate::{AudioError, AudioResult};

/// Quietest channel volume
const MIN_VOLUME: f32 = 0.0;
/// Loudest channel volume
const MAX_VOLUME: f32 = 1.0;

/// Channels driven by the active fade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeScope {
    Channel(usize),
    All,
}

/// Multi-channel sound player with volume fades
pub struct SoundManager<Ch: Channel> {
    config: SoundManagerConfig,
    channels: ChannelRegistry<Ch>,
    sounds: SoundTable<Ch::Clip>,
    fade: RampController,
    fade_scope: FadeScope,
}

impl<Ch: Channel> SoundManager<Ch> {
    /// Create a manager, building `config.channels` channels with `factory`
    pub fn new<F>(config: SoundManagerConfig, factory: F) -> AudioResult<Self>
    where
        F: FnMut(usize) -> Ch,
    {
        let channels = ChannelRegistry::with_count(config.effective_channels(), factory)?;
        Ok(Self::with_registry(config, channels))
    }

    /// Create a manager around existing channels
    pub fn with_registry(config: SoundManagerConfig, channels: ChannelRegistry<Ch>) -> Self {
        log::debug!("Sound manager ready with {} channels", channels.channel_count());
        Self {
            config,
            channels,
            sounds: SoundTable::new(),
            fade: RampController::default(),
            fade_scope: FadeScope::All,
        }
    }

    /// Settings in use
    pub fn config(&self) -> &SoundManagerConfig {
        &self.config
    }

    // ---- sound table ----

    /// Install the table sounds are looked up in
    pub fn register_sound_table(&mut self, table: SoundTable<Ch::Clip>) {
        self.sounds = table;
    }

    /// Forget every registered sound
    pub fn clear_sound_table(&mut self) {
        self.sounds.clear();
    }

    /// Registered sounds
    pub fn sound_table(&self) -> &SoundTable<Ch::Clip> {
        &self.sounds
    }

    // ---- playback ----

    /// Play the sound registered under `key` on `channel`
    pub fn play(&mut self, key: &str, channel: isize, looping: bool) -> AudioResult<()> {
        let clip = lookup_key(&self.sounds, key)?;
        self.channels.get_mut(channel).play(clip, looping);
        Ok(())
    }

    /// Play the sound at `index` in the table on `channel`
    pub fn play_index(&mut self, index: isize, channel: isize, looping: bool) -> AudioResult<()> {
        let clip = lookup_index(&self.sounds, index)?;
        self.channels.get_mut(channel).play(clip, looping);
        Ok(())
    }

    /// Play a looping background track by key
    pub fn play_bgm(&mut self, key: &str, channel: isize) -> AudioResult<()> {
        self.play(key, channel, true)
    }

    /// Play a looping background track by index
    pub fn play_bgm_index(&mut self, index: isize, channel: isize) -> AudioResult<()> {
        self.play_index(index, channel, true)
    }

    /// Fire a one-shot effect by key on the one-shot channel
    pub fn play_one_shot(&mut self, key: &str, volume: f32) -> AudioResult<()> {
        let clip = lookup_key(&self.sounds, key)?;
        let channel = self.config.one_shot_channel as isize;
        self.channels.get_mut(channel).play_one_shot(clip, volume);
        Ok(())
    }

    /// Fire a one-shot effect by index on the one-shot channel
    pub fn play_one_shot_index(&mut self, index: isize, volume: f32) -> AudioResult<()> {
        let clip = lookup_index(&self.sounds, index)?;
        let channel = self.config.one_shot_channel as isize;
        self.channels.get_mut(channel).play_one_shot(clip, volume);
        Ok(())
    }

    /// Pause `channel` if it is playing
    pub fn pause(&mut self, channel: isize) {
        let channel = self.channels.get_mut(channel);
        if channel.is_playing() {
            channel.pause();
        }
    }

    /// Continue `channel` if it is paused
    pub fn resume(&mut self, channel: isize) {
        let channel = self.channels.get_mut(channel);
        if !channel.is_playing() && channel.is_paused() {
            channel.unpause();
        }
    }

    /// Stop `channel` if anything is loaded on it
    pub fn stop(&mut self, channel: isize) {
        let channel = self.channels.get_mut(channel);
        if channel.is_playing() || channel.is_paused() {
            channel.stop();
        }
    }

    /// Channel at `index`, clamped
    pub fn channel(&self, index: isize) -> &Ch {
        self.channels.get(index)
    }

    /// Mutable channel at `index`, clamped
    pub fn channel_mut(&mut self, index: isize) -> &mut Ch {
        self.channels.get_mut(index)
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.channel_count()
    }

    /// All channels
    pub fn channels(&self) -> &ChannelRegistry<Ch> {
        &self.channels
    }

    // ---- fades ----

    /// Fade `channel` to `target` over `steps` ticks
    ///
    /// Replaces any fade already running, on any channel.
    pub fn start_fade(
        &mut self,
        steps: i32,
        target: f32,
        channel: isize,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let slot = self.channels.clamp_index(channel).index;
        let from = self.channels.slot_mut(slot).volume();
        self.fade.start_from(from, target, steps, on_complete)?;
        self.fade_scope = FadeScope::Channel(slot);
        Ok(())
    }

    /// Fade every channel to `target` over `steps` ticks, with one shared delta
    ///
    /// The delta is taken from the first channel's volume.
    pub fn start_fade_all(
        &mut self,
        steps: i32,
        target: f32,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let from = self.channels.slot_mut(0).volume();
        self.fade.start_from(from, target, steps, on_complete)?;
        self.fade_scope = FadeScope::All;
        Ok(())
    }

    /// Fade `channel` toward silence (`fade_in_volume` unless `target` is given)
    pub fn start_fade_in(
        &mut self,
        steps: i32,
        target: Option<f32>,
        channel: isize,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let target = target.unwrap_or(self.config.fade_in_volume);
        self.start_fade(steps, target, channel, on_complete)
    }

    /// Fade `channel` back up (`fade_out_volume` unless `target` is given)
    pub fn start_fade_out(
        &mut self,
        steps: i32,
        target: Option<f32>,
        channel: isize,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let target = target.unwrap_or(self.config.fade_out_volume);
        self.start_fade(steps, target, channel, on_complete)
    }

    /// Fade every channel toward silence
    pub fn start_fade_in_all(
        &mut self,
        steps: i32,
        target: Option<f32>,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let target = target.unwrap_or(self.config.fade_in_volume);
        self.start_fade_all(steps, target, on_complete)
    }

    /// Fade every channel back up
    pub fn start_fade_out_all(
        &mut self,
        steps: i32,
        target: Option<f32>,
        on_complete: Option<Callback>,
    ) -> AudioResult<()> {
        let target = target.unwrap_or(self.config.fade_out_volume);
        self.start_fade_all(steps, target, on_complete)
    }

    /// Abort the running fade, leaving volumes where they are
    pub fn cancel_fade(&mut self) {
        self.fade.cancel();
    }

    /// Check if a fade is running
    pub fn is_fading(&self) -> bool {
        self.fade.is_active()
    }

    /// Fade status
    pub fn fade_state(&self) -> RampState {
        self.fade.state()
    }
}

impl<Ch: Channel> Tick for SoundManager<Ch> {
    /// Advance the running fade by one step
    fn tick(&mut self) {
        let channels = &mut self.channels;
        let scope = self.fade_scope;
        self.fade.tick_with(|step| {
            let mut apply = |channel: &mut Ch| {
                let mut volume = channel.volume();
                step.apply(&mut volume);
                channel.set_volume(volume.clamp(MIN_VOLUME, MAX_VOLUME));
            };
            match scope {
                FadeScope::Channel(slot) => apply(channels.slot_mut(slot)),
                FadeScope::All => channels.iter_mut().for_each(apply),
            }
        });
    }
}

impl<Ch: Channel> std::fmt::Debug for SoundManager<Ch> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundManager")
            .field("channels", &self.channels.channel_count())
            .field("sounds", &self.sounds.count())
            .field("fade", &self.fade)
            .finish()
    }
}

fn lookup_key<'a, C>(sounds: &'a SoundTable<C>, key: &str) -> AudioResult<&'a C> {
    sounds.get(key).map_err(|e| {
        log::error!("sound key \"{}\" is not in the sound table, operation skipped", key);
        AudioError::from(e)
    })
}

fn lookup_index<C>(sounds: &SoundTable<C>, index: isize) -> AudioResult<&C> {
    sounds.entry_at(index).map(|entry| entry.value()).map_err(|e| {
        log::error!(
            "sound index is out of range: 0 <= {} < {}, operation skipped",
            index,
            sounds.count()
        );
        AudioError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MemoryChannel, PlaybackState};
    use approx::assert_relative_eq;
    use stagehand_core::TableError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type TestManager = SoundManager<MemoryChannel<&'static str>>;

    fn manager(channels: usize) -> TestManager {
        let mut manager = SoundManager::new(
            SoundManagerConfig::new().with_channels(channels),
            |_| MemoryChannel::new(),
        )
        .unwrap();
        manager.register_sound_table(SoundTable::from_entries([
            ("bgm_title".to_string(), "title.ogg"),
            ("se_jump".to_string(), "jump_a.wav"),
            ("se_jump".to_string(), "jump_b.wav"),
        ]));
        manager
    }

    #[test]
    fn test_play_by_key() {
        let mut sounds = manager(2);
        sounds.play("se_jump", 1, false).unwrap();

        let channel = sounds.channel(1);
        assert_eq!(channel.clip(), Some(&"jump_b.wav"));
        assert!(channel.is_playing());
        assert!(!channel.is_looping());
    }

    #[test]
    fn test_play_by_index_and_bgm() {
        let mut sounds = manager(2);
        sounds.play_bgm_index(1, 0).unwrap();
        assert_eq!(sounds.channel(0).clip(), Some(&"jump_a.wav"));
        assert!(sounds.channel(0).is_looping());

        sounds.play_bgm("bgm_title", 0).unwrap();
        assert_eq!(sounds.channel(0).clip(), Some(&"title.ogg"));
    }

    #[test]
    fn test_missing_sound_skips_play() {
        let mut sounds = manager(1);
        let err = sounds.play("nope", 0, false).unwrap_err();
        assert!(matches!(err, AudioError::Table(TableError::KeyNotFound(_))));
        assert_eq!(sounds.channel(0).state(), PlaybackState::Stopped);

        let err = sounds.play_index(3, 0, false).unwrap_err();
        assert_eq!(
            err,
            AudioError::Table(TableError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(sounds.channel(0).clip().is_none());
    }

    #[test]
    fn test_out_of_range_channel_is_clamped() {
        let mut sounds = manager(3);
        sounds.play("bgm_title", 5, false).unwrap();
        assert_eq!(sounds.channel(2).clip(), Some(&"title.ogg"));

        sounds.play("se_jump", -1, false).unwrap();
        assert_eq!(sounds.channel(0).clip(), Some(&"jump_b.wav"));
    }

    #[test]
    fn test_one_shot() {
        let mut sounds = manager(2);
        sounds.play_one_shot("se_jump", 0.5).unwrap();
        sounds.play_one_shot_index(0, 1.0).unwrap();
        assert_eq!(
            sounds.channel(0).one_shots(),
            &[("jump_b.wav", 0.5), ("title.ogg", 1.0)]
        );
        assert!(sounds.play_one_shot("missing", 1.0).is_err());
    }

    #[test]
    fn test_pause_resume_stop() {
        let mut sounds = manager(1);

        // Resume never starts a stopped channel
        sounds.resume(0);
        assert_eq!(sounds.channel(0).state(), PlaybackState::Stopped);

        sounds.play_bgm("bgm_title", 0).unwrap();
        sounds.pause(0);
        assert_eq!(sounds.channel(0).state(), PlaybackState::Paused);

        sounds.resume(0);
        assert_eq!(sounds.channel(0).state(), PlaybackState::Playing);

        sounds.pause(0);
        sounds.stop(0);
        assert_eq!(sounds.channel(0).state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_clear_sound_table() {
        let mut sounds = manager(1);
        sounds.clear_sound_table();
        assert!(sounds.sound_table().is_empty());
        assert!(sounds.play("bgm_title", 0, false).is_err());
    }

    #[test]
    fn test_fade_single_channel() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let mut sounds = manager(2);

        sounds
            .start_fade_in(
                4,
                None,
                1,
                Some(Box::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        assert_eq!(sounds.fade_state(), RampState::RampingDown);

        sounds.tick();
        assert_relative_eq!(sounds.channel(1).volume(), 0.75);
        assert_eq!(sounds.channel(0).volume(), 1.0);

        for _ in 0..3 {
            sounds.tick();
        }
        assert_eq!(sounds.channel(1).volume(), 0.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!sounds.is_fading());

        sounds.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fade_all_keeps_uneven_channels_in_range() {
        let mut sounds = manager(2);
        sounds.channel_mut(1).set_volume(0.2);

        sounds.start_fade_in_all(4, None, None).unwrap();
        while sounds.is_fading() {
            sounds.tick();
            for channel in sounds.channels().iter() {
                let volume = channel.volume();
                assert!((0.0..=1.0).contains(&volume), "volume {}", volume);
            }
        }
        assert_eq!(sounds.channel(1).volume(), 0.0);

        sounds.channel_mut(0).set_volume(0.1);
        sounds.start_fade_out_all(3, Some(1.0), None).unwrap();
        sounds.channel_mut(1).set_volume(0.9);
        while sounds.is_fading() {
            sounds.tick();
            assert!(sounds.channels().iter().all(|c| c.volume() <= 1.0));
        }
        assert!(sounds.channels().iter().all(|c| c.volume() == 1.0));
    }

    #[test]
    fn test_fade_all_completes_once_after_every_channel() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let mut sounds = manager(3);
        sounds.channel_mut(1).set_volume(0.6);
        sounds.channel_mut(2).set_volume(0.3);

        sounds
            .start_fade_out_all(
                3,
                Some(0.8),
                Some(Box::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        sounds.tick();
        sounds.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(sounds.channels().iter().any(|c| c.volume() != 0.8));

        sounds.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(sounds.channels().iter().all(|c| c.volume() == 0.8));

        sounds.tick();
        sounds.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fade_all_settles_every_channel() {
        let mut sounds = manager(3);
        sounds.channel_mut(2).set_volume(0.4);

        sounds.start_fade_out_all(3, Some(0.8), None).unwrap();
        sounds.start_fade_in_all(5, Some(0.2), None).unwrap();
        for _ in 0..5 {
            sounds.tick();
        }

        for channel in sounds.channels().iter() {
            assert_eq!(channel.volume(), 0.2);
        }
    }

    #[test]
    fn test_fade_rejects_bad_steps() {
        let mut sounds = manager(1);
        let err = sounds.start_fade_out(0, None, 0, None).unwrap_err();
        assert!(matches!(err, AudioError::Tick(_)));
        assert!(!sounds.is_fading());
    }

    #[test]
    fn test_new_fade_replaces_running_one() {
        let mut sounds = manager(2);
        sounds.start_fade_in(10, None, 0, None).unwrap();
        sounds.tick();

        sounds.start_fade(2, 0.5, 1, None).unwrap();
        sounds.tick();
        sounds.tick();

        assert_relative_eq!(sounds.channel(0).volume(), 0.9);
        assert_eq!(sounds.channel(1).volume(), 0.5);
        assert!(!sounds.is_fading());
    }
}

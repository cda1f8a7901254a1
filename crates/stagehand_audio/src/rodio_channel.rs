//! Real playback through rodio/cpal
//!
//! Each [`RodioChannel`] owns at most one sink for its main clip. One-shots
//! get their own detached sink so they never cut off the main clip.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::channel::Channel;
use crate::{AudioError, AudioResult};

/// Encoded audio (wav, mp3 or ogg) shared between channels
#[derive(Debug, Clone)]
pub struct AudioClip(Arc<[u8]>);

impl AudioClip {
    /// Wrap encoded bytes
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Self {
        Self(data.into())
    }

    /// Read an encoded file
    pub fn load(path: impl AsRef<Path>) -> AudioResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| AudioError::Backend(format!("{}: {}", path.display(), e)))?;
        Ok(Self(data.into()))
    }

    fn decode(&self) -> AudioResult<Decoder<Cursor<Arc<[u8]>>>> {
        Decoder::new(Cursor::new(self.0.clone())).map_err(|e| AudioError::Backend(e.to_string()))
    }
}

/// Default output device
pub struct RodioOutput {
    /// Output stream (must be kept alive)
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioOutput {
    /// Open the default output device
    pub fn try_default() -> AudioResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::Backend(e.to_string()))?;
        log::info!("Audio output opened");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// New channel playing on this device
    pub fn channel(&self) -> RodioChannel {
        RodioChannel::new(self.handle.clone())
    }
}

/// Channel backed by a rodio sink
pub struct RodioChannel {
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    volume: f32,
}

impl RodioChannel {
    /// Create a silent channel on `handle`
    pub fn new(handle: OutputStreamHandle) -> Self {
        Self {
            handle,
            sink: None,
            volume: 1.0,
        }
    }

    fn start(&self, clip: &AudioClip, looping: bool, volume: f32) -> AudioResult<Sink> {
        let source = clip.decode()?;
        let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::Backend(e.to_string()))?;
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        sink.set_volume(volume);
        sink.play();
        Ok(sink)
    }
}

impl Channel for RodioChannel {
    type Clip = AudioClip;

    fn play(&mut self, clip: &AudioClip, looping: bool) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        match self.start(clip, looping, self.volume) {
            Ok(sink) => self.sink = Some(sink),
            Err(e) => log::error!("Failed to play clip: {}", e),
        }
    }

    fn play_one_shot(&mut self, clip: &AudioClip, volume: f32) {
        match self.start(clip, false, self.volume * volume) {
            Ok(sink) => sink.detach(),
            Err(e) => log::error!("Failed to play one-shot: {}", e),
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map_or(false, |sink| !sink.is_paused() && !sink.empty())
    }

    fn is_paused(&self) -> bool {
        self.sink
            .as_ref()
            .map_or(false, |sink| sink.is_paused() && !sink.empty())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        // Negative sink volume inverts phase instead of silencing
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }
}

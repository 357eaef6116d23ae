use crate::assets::SoundBank;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;

const MUSIC_VOLUME: f32 = 0.5;

/// Owns the audio output device plus the encoded effect and music
/// buffers. Dropping the player tears the device down and stops the
/// looping background track.
pub struct AudioPlayer {
    _stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
    _music: Option<Sink>,
    correct: Vec<u8>,
    incorrect: Vec<u8>,
}

impl AudioPlayer {
    /// Open the default output device and start the background track on
    /// loop at half volume. With `mute` the device is never opened and
    /// every play call is a no-op.
    pub fn new(sounds: SoundBank, mute: bool) -> Result<Self> {
        if mute {
            tracing::info!("Audio muted");
            return Ok(Self {
                _stream: None,
                handle: None,
                _music: None,
                correct: sounds.correct,
                incorrect: sounds.incorrect,
            });
        }

        let (stream, handle) =
            OutputStream::try_default().context("Failed to open audio output device")?;

        let music = Sink::try_new(&handle).context("Failed to create music sink")?;
        let track = Decoder::new(Cursor::new(sounds.music))
            .context("Failed to decode background music")?;
        music.append(track.repeat_infinite());
        music.set_volume(MUSIC_VOLUME);

        tracing::info!("Audio initialized, background music looping");

        Ok(Self {
            _stream: Some(stream),
            handle: Some(handle),
            _music: Some(music),
            correct: sounds.correct,
            incorrect: sounds.incorrect,
        })
    }

    pub fn play_correct(&self) {
        self.play(&self.correct);
    }

    pub fn play_incorrect(&self) {
        self.play(&self.incorrect);
    }

    /// Fire-and-forget effect playback. Decode or device trouble is
    /// logged and swallowed; a missing effect never interrupts a round.
    fn play(&self, bytes: &[u8]) {
        let Some(handle) = &self.handle else {
            return;
        };
        match Decoder::new(Cursor::new(bytes.to_vec())) {
            Ok(source) => {
                if let Err(err) = handle.play_raw(source.convert_samples()) {
                    tracing::warn!("Effect playback failed: {err}");
                }
            }
            Err(err) => tracing::warn!("Failed to decode sound effect: {err}"),
        }
    }
}

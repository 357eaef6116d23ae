use anyhow::{ensure, Context, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Local collaborators loaded once at startup: two effect sounds, the
/// looping background track, the background animation, and the display
/// font. All are required; a missing file is a startup error.
pub struct GameAssets {
    pub sounds: SoundBank,
    pub background_frames: Vec<RgbaImage>,
    pub font: Vec<u8>,
}

/// Raw encoded audio, decoded lazily at playback time.
pub struct SoundBank {
    pub correct: Vec<u8>,
    pub incorrect: Vec<u8>,
    pub music: Vec<u8>,
}

impl GameAssets {
    pub fn load(dir: &Path) -> Result<Self> {
        tracing::info!("Loading assets from {}", dir.display());

        let sounds = SoundBank {
            correct: read(dir, "correct.wav")?,
            incorrect: read(dir, "incorrect.wav")?,
            music: read(dir, "bgm.mp3")?,
        };
        let font = read(dir, "display.ttf")?;
        let background_frames = load_gif_frames(&dir.join("bg.gif"))?;

        tracing::info!(
            "Assets loaded ({} background frames)",
            background_frames.len()
        );

        Ok(Self {
            sounds,
            background_frames,
            font,
        })
    }

    /// Pixel size of the background animation; the window is sized to it.
    pub fn background_size(&self) -> (u32, u32) {
        self.background_frames[0].dimensions()
    }
}

fn read(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    std::fs::read(&path).with_context(|| format!("Failed to read asset {}", path.display()))
}

fn load_gif_frames(path: &Path) -> Result<Vec<RgbaImage>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open background animation {}", path.display()))?;
    let decoder =
        GifDecoder::new(BufReader::new(file)).context("Failed to decode background animation")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("Failed to extract background animation frames")?;
    ensure!(!frames.is_empty(), "Background animation has no frames");

    Ok(frames.into_iter().map(|frame| frame.into_buffer()).collect())
}

mod pokedex;

pub use pokedex::{PokedexSource, DEFAULT_INDEX_URL};

use anyhow::Result;
use image::RgbaImage;

/// One entry of the species index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesEntry {
    /// Lowercase display name, the string guesses are checked against.
    pub name: String,
    /// Absolute URL of the sprite image.
    pub sprite_url: String,
}

/// Trait for species data sources
pub trait SpeciesSource {
    /// Download the full species index.
    fn fetch_index(&mut self) -> Result<Vec<SpeciesEntry>>;

    /// Download and decode one entry's sprite.
    fn fetch_sprite(&mut self, entry: &SpeciesEntry) -> Result<RgbaImage>;
}

/// Create the default source against the public species database.
pub fn create_default_source(index_url: &str) -> Result<Box<dyn SpeciesSource>> {
    let source = PokedexSource::new(index_url)?;
    Ok(Box::new(source))
}

use super::{SpeciesEntry, SpeciesSource};
use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// National index listing of the public species database.
pub const DEFAULT_INDEX_URL: &str = "https://pokemondb.net/pokedex/national";

/// The index page parsed, but no usable info card came out of it. Either
/// the page layout changed or the fetch was served an error page.
#[derive(Debug, Error)]
#[error("species index at {url} contained no usable info cards")]
pub struct IndexError {
    url: String,
}

/// Species source backed by the public database's national index page.
///
/// The index is one HTTP GET parsed for repeated info-card blocks, each
/// holding a name link and a sprite image. Sprites are fetched per round.
/// All fetches block the caller; failures propagate.
pub struct PokedexSource {
    client: Client,
    index_url: String,
    card: Selector,
    name: Selector,
    sprite: Selector,
}

impl PokedexSource {
    pub fn new(index_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sombra/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            index_url: index_url.to_string(),
            card: selector("div.infocard")?,
            name: selector("a.ent-name")?,
            sprite: selector("img.img-sprite")?,
        })
    }

    /// Pull the name/sprite-URL pairs out of the index markup. Cards
    /// missing either field are skipped.
    fn parse_index(&self, body: &str) -> Result<Vec<SpeciesEntry>> {
        let document = Html::parse_document(body);
        let mut entries = Vec::new();

        for card in document.select(&self.card) {
            let name = card
                .select(&self.name)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_lowercase());
            let sprite_url = card
                .select(&self.sprite)
                .next()
                .and_then(|el| el.value().attr("src"))
                .map(str::to_string);

            if let (Some(name), Some(sprite_url)) = (name, sprite_url) {
                entries.push(SpeciesEntry { name, sprite_url });
            }
        }

        if entries.is_empty() {
            return Err(IndexError {
                url: self.index_url.clone(),
            }
            .into());
        }

        Ok(entries)
    }
}

impl SpeciesSource for PokedexSource {
    fn fetch_index(&mut self) -> Result<Vec<SpeciesEntry>> {
        tracing::info!("Fetching species index from {}", self.index_url);

        let body = self
            .client
            .get(&self.index_url)
            .send()
            .with_context(|| format!("Failed to fetch species index from {}", self.index_url))?
            .error_for_status()
            .context("Species index request was refused")?
            .text()
            .context("Failed to read species index body")?;

        let entries = self.parse_index(&body)?;
        tracing::info!("Parsed {} species entries", entries.len());
        Ok(entries)
    }

    fn fetch_sprite(&mut self, entry: &SpeciesEntry) -> Result<RgbaImage> {
        tracing::debug!("Fetching sprite from {}", entry.sprite_url);

        let bytes = self
            .client
            .get(&entry.sprite_url)
            .send()
            .with_context(|| format!("Failed to fetch sprite from {}", entry.sprite_url))?
            .error_for_status()
            .context("Sprite request was refused")?
            .bytes()
            .context("Failed to read sprite body")?;

        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode sprite from {}", entry.sprite_url))?;

        Ok(image.to_rgba8())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("Invalid selector {css:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> PokedexSource {
        PokedexSource::new(DEFAULT_INDEX_URL).unwrap()
    }

    #[test]
    fn parses_info_cards_into_lowercase_entries() {
        let body = r#"
            <html><body>
            <div class="infocard">
                <a class="ent-name" href="/pokedex/bulbasaur">Bulbasaur</a>
                <img class="img-sprite" src="https://img.example/bulbasaur.png">
            </div>
            <div class="infocard">
                <a class="ent-name" href="/pokedex/mr-mime">Mr. Mime</a>
                <img class="img-sprite" src="https://img.example/mr-mime.png">
            </div>
            </body></html>
        "#;

        let entries = source().parse_index(body).unwrap();
        assert_eq!(
            entries,
            vec![
                SpeciesEntry {
                    name: "bulbasaur".to_string(),
                    sprite_url: "https://img.example/bulbasaur.png".to_string(),
                },
                SpeciesEntry {
                    name: "mr. mime".to_string(),
                    sprite_url: "https://img.example/mr-mime.png".to_string(),
                },
            ]
        );
    }

    #[test]
    fn cards_missing_a_field_are_skipped() {
        let body = r#"
            <div class="infocard">
                <a class="ent-name" href="/a">Kept</a>
                <img class="img-sprite" src="https://img.example/kept.png">
            </div>
            <div class="infocard">
                <a class="ent-name" href="/b">No Sprite</a>
            </div>
            <div class="infocard">
                <img class="img-sprite" src="https://img.example/no-name.png">
            </div>
        "#;

        let entries = source().parse_index(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "kept");
    }

    #[test]
    fn empty_page_is_an_index_error() {
        let err = source().parse_index("<html><body></body></html>").unwrap_err();
        assert!(err.is::<IndexError>());
    }
}

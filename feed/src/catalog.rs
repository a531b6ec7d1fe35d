//! Static artist reference data.

use dtg_core::model::{Artist, ArtistId};
use serde::{Deserialize, Serialize};

const BUILTIN: [(&str, &str); 8] = [
    ("phoebe-bridgers", "Phoebe Bridgers"),
    ("fred-again", "Fred again.."),
    ("boygenius", "boygenius"),
    ("khruangbin", "Khruangbin"),
    ("turnstile", "Turnstile"),
    ("caribou", "Caribou"),
    ("japanese-breakfast", "Japanese Breakfast"),
    ("bicep", "Bicep"),
];

/// The read-only list of artists events can be logged against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCatalog {
    artists: Vec<Artist>,
}

impl ArtistCatalog {
    /// A catalog over the given artists, in display order
    #[must_use]
    pub const fn new(artists: Vec<Artist>) -> Self {
        Self { artists }
    }

    /// The catalog shipped with the app
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(id, name)| Artist {
                    id: ArtistId::new(*id),
                    name: (*name).to_string(),
                })
                .collect(),
        )
    }

    /// Looks up an artist
    #[must_use]
    pub fn get(&self, id: &ArtistId) -> Option<&Artist> {
        self.artists.iter().find(|a| &a.id == id)
    }

    /// Display name of an artist; unknown ids render as the raw id
    #[must_use]
    pub fn name_of(&self, id: &ArtistId) -> String {
        self.get(id)
            .map_or_else(|| id.to_string(), |artist| artist.name.clone())
    }

    /// All artists in display order
    pub fn iter(&self) -> impl Iterator<Item = &Artist> {
        self.artists.iter()
    }

    /// Number of artists
    #[must_use]
    pub fn len(&self) -> usize {
        self.artists.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }
}

impl Default for ArtistCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

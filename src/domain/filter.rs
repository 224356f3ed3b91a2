use serde::Deserialize;

use super::OneOrMany;

/// Query parameters accepted by the title listing.
///
/// All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFilter {
    /// Case-insensitive substring of the title name.
    pub name: Option<String>,

    pub year: Option<i32>,

    /// Category slug, or its numeric id.
    pub category: Option<String>,

    /// Genre slugs; a title matches when it carries any of them.
    #[serde(default)]
    pub genre: Option<OneOrMany<String>>,
}

impl TitleFilter {
    /// Builds a filter from raw query pairs, collecting repeated `genre`
    /// keys (`?genre=a&genre=b`) into one list. Unknown keys and empty
    /// values are ignored.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut filter = Self::default();
        let mut genres = Vec::new();

        for (key, value) in pairs {
            if value.trim().is_empty() {
                continue;
            }
            match key.as_str() {
                "name" => filter.name = Some(value),
                "year" => {
                    let year = value
                        .trim()
                        .parse()
                        .map_err(|_| format!("Invalid year: {value}"))?;
                    filter.year = Some(year);
                }
                "category" => filter.category = Some(value),
                "genre" | "genres" => genres.push(value),
                _ => {}
            }
        }

        if !genres.is_empty() {
            filter.genre = Some(OneOrMany::Many(genres));
        }

        Ok(filter)
    }

    #[must_use]
    pub fn genre_slugs(&self) -> Vec<String> {
        self.genre
            .clone()
            .map(OneOrMany::into_slugs)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

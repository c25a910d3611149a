use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{GenreId, MovieId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    /// The API sends `""` for titles without a scheduled release; both the
    /// empty string and an absent field decode to `None`.
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    /// Derived locally from `genre_ids`; never carried on the wire.
    #[serde(default, skip_serializing)]
    pub genre_names: String,
}

/// One page of a category or search listing, together with the authoritative
/// total-page count as of this response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePage {
    pub page: u32,
    #[serde(rename = "results")]
    pub movies: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u32,
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(MovieId);
id_newtype!(GenreId);

/// Catalog list the browsing session is pinned to. `Upcoming` is the default
/// landing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieCategory {
    Upcoming,
    NowPlaying,
    Popular,
    TopRated,
}

impl MovieCategory {
    /// Path segment of the category's list endpoint, e.g. `movie/upcoming`.
    pub fn api_path(self) -> &'static str {
        match self {
            MovieCategory::Upcoming => "upcoming",
            MovieCategory::NowPlaying => "now_playing",
            MovieCategory::Popular => "popular",
            MovieCategory::TopRated => "top_rated",
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_path())
    }
}

#[derive(Debug, Error)]
#[error("unknown movie category '{0}'; expected one of upcoming, now_playing, popular, top_rated")]
pub struct UnknownCategory(pub String);

impl FromStr for MovieCategory {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "upcoming" => Ok(MovieCategory::Upcoming),
            "now_playing" => Ok(MovieCategory::NowPlaying),
            "popular" => Ok(MovieCategory::Popular),
            "top_rated" => Ok(MovieCategory::TopRated),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

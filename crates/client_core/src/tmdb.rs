//! TMDb HTTP adapter behind the `MovieCatalog` contract.

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::MovieCategory,
    error::{ApiException, ApiStatus},
    protocol::{Genre, GenreList, MoviePage},
};
use url::Url;

use crate::MovieCatalog;

pub const TMDB_API_BASE_URL: &str = "https://api.themoviedb.org/3/";
const TMDB_LANGUAGE: &str = "en-US";

pub struct TmdbCatalog {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl TmdbCatalog {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(TMDB_API_BASE_URL, api_key)
    }

    /// Points the catalog at an alternative API root, e.g. a local stub
    /// server. A missing trailing slash is tolerated.
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let mut raw = base_url.to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .with_context(|| format!("invalid catalog base url '{base_url}'"))?;
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid catalog endpoint '{path}'"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(url.clone())
            .query(&[("api_key", self.api_key.as_str()), ("language", TMDB_LANGUAGE)])
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url.path()))?;

        let status = response.status();
        if !status.is_success() {
            // TMDb wraps failures in a status payload; fall back to the bare
            // HTTP status when the body is not one.
            let detail = match response.json::<ApiStatus>().await {
                Ok(payload) => ApiException::from(payload).to_string(),
                Err(_) => format!("http status {status}"),
            };
            return Err(anyhow!("{detail}"))
                .with_context(|| format!("request to {} was rejected", url.path()));
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode response from {}", url.path()))
    }
}

#[async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn fetch_page(&self, page: u32, category: MovieCategory) -> Result<MoviePage> {
        ensure!(page >= 1, "catalog pages are numbered from 1, got {page}");
        let url = self.endpoint(&format!("movie/{}", category.api_path()))?;
        self.get_json(url, &[("page", page.to_string())]).await
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>> {
        let url = self.endpoint("genre/movie/list")?;
        let list: GenreList = self.get_json(url, &[]).await?;
        Ok(list.genres)
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage> {
        ensure!(page >= 1, "catalog pages are numbered from 1, got {page}");
        ensure!(!query.trim().is_empty(), "search query must not be empty");
        let url = self.endpoint("search/movie")?;
        self.get_json(url, &[("query", query.to_string()), ("page", page.to_string())])
            .await
    }
}

#[cfg(test)]
#[path = "tests/tmdb_tests.rs"]
mod tests;

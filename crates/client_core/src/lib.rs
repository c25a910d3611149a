use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{GenreId, MovieCategory},
    protocol::{Genre, Movie, MoviePage},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod error;
pub mod tmdb;

pub use error::BrowseError;
pub use tmdb::TmdbCatalog;

const FIRST_PAGE: u32 = 1;
/// Distance from the end of the loaded collection at which a visible item
/// triggers the next page fetch. A tunable constant, not derived from page
/// size.
pub const NEAR_END_LOOKAHEAD: usize = 2;

/// Remote movie catalog: paged category listings, the genre lookup table,
/// and title search. One page per call, 1-based numbering; every response
/// carries the authoritative total-page count as of that call, and any
/// transport or decode failure is an error rather than a partial page.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn fetch_page(&self, page: u32, category: MovieCategory) -> Result<MoviePage>;
    async fn fetch_genres(&self) -> Result<Vec<Genre>>;
    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage>;
}

/// Synchronous reachability check, queried once per reload attempt rather
/// than polled.
pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Probe for environments without a platform connectivity plugin.
pub struct AlwaysReachable;

impl ConnectivityProbe for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Receives the selected movie, by value, when the user opens its detail
/// view. Navigation itself is outside the core.
#[async_trait]
pub trait MovieDetailNavigator: Send + Sync {
    async fn show_detail(&self, movie: Movie) -> Result<()>;
}

pub struct MissingDetailNavigator;

#[async_trait]
impl MovieDetailNavigator for MissingDetailNavigator {
    async fn show_detail(&self, movie: Movie) -> Result<()> {
        Err(anyhow!("no detail navigator registered for '{}'", movie.title))
    }
}

/// Session-wide genre lookup, fetched at most once and shared read-only
/// afterwards.
pub struct GenreCache {
    catalog: Arc<dyn MovieCatalog>,
    entries: Mutex<Option<Arc<Vec<Genre>>>>,
}

impl GenreCache {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(None),
        }
    }

    /// Returns the cached genre list, fetching it on first use. The lock is
    /// held across the fetch, so concurrent first calls serialize behind a
    /// single request; a failed fetch leaves the cache unpopulated and the
    /// next call retries.
    pub async fn get(&self) -> Result<Arc<Vec<Genre>>> {
        let mut entries = self.entries.lock().await;
        if let Some(genres) = entries.as_ref() {
            return Ok(Arc::clone(genres));
        }
        let fetched = Arc::new(self.catalog.fetch_genres().await?);
        *entries = Some(Arc::clone(&fetched));
        Ok(fetched)
    }
}

/// Resolves a movie's genre identifiers against the genre table, joined with
/// `", "` in the original order. An unknown identifier contributes an empty
/// segment rather than failing the lookup.
pub fn resolve_genre_names(ids: &[GenreId], genres: &[Genre]) -> String {
    ids.iter()
        .map(|id| {
            genres
                .iter()
                .find(|genre| genre.id == *id)
                .map(|genre| genre.name.as_str())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    Loading,
    Exhausted,
    Error,
}

/// Outcome of one pager operation. A failure is terminal for the phase but
/// never crosses this boundary as `Err`.
#[derive(Debug)]
pub enum PageLoad {
    Loaded(Vec<Movie>),
    NoOp,
    Failed(BrowseError),
}

struct PagerState {
    phase: PagePhase,
    current_page: u32,
    total_pages: u32,
}

/// Sequences page loads for one category: owns the current/total page
/// counters, enforces the single-fetch-in-flight guard, and enriches each
/// fetched record with genre names before handing it back.
pub struct CategoryPager {
    catalog: Arc<dyn MovieCatalog>,
    genres: Arc<GenreCache>,
    category: MovieCategory,
    state: Mutex<PagerState>,
}

impl CategoryPager {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        genres: Arc<GenreCache>,
        category: MovieCategory,
    ) -> Self {
        Self {
            catalog,
            genres,
            category,
            state: Mutex::new(PagerState {
                phase: PagePhase::Idle,
                current_page: FIRST_PAGE,
                total_pages: 0,
            }),
        }
    }

    pub fn category(&self) -> MovieCategory {
        self.category
    }

    pub async fn phase(&self) -> PagePhase {
        self.state.lock().await.phase
    }

    pub async fn current_page(&self) -> u32 {
        self.state.lock().await.current_page
    }

    /// Total pages reported by the latest response; 0 until the first page
    /// has been fetched.
    pub async fn total_pages(&self) -> u32 {
        self.state.lock().await.total_pages
    }

    /// Restarts the sequence from page 1, clearing a prior `Error` or
    /// `Exhausted` phase. Ignored while a load is already in flight.
    pub async fn load_first_page(&self) -> PageLoad {
        {
            let mut state = self.state.lock().await;
            if state.phase == PagePhase::Loading {
                return PageLoad::NoOp;
            }
            state.phase = PagePhase::Loading;
            state.current_page = FIRST_PAGE;
            state.total_pages = 0;
        }
        self.fetch_current_page().await
    }

    /// Advances to the next page. A no-op, not an error, while loading,
    /// exhausted, or in the error phase; at most one fetch is ever in
    /// flight.
    pub async fn load_next_page(&self) -> PageLoad {
        {
            let mut state = self.state.lock().await;
            if state.phase != PagePhase::Idle {
                return PageLoad::NoOp;
            }
            if state.current_page >= state.total_pages {
                state.phase = PagePhase::Exhausted;
                return PageLoad::NoOp;
            }
            state.current_page += 1;
            state.phase = PagePhase::Loading;
        }
        self.fetch_current_page().await
    }

    async fn fetch_current_page(&self) -> PageLoad {
        let page = self.state.lock().await.current_page;
        match self.fetch_and_enrich(page).await {
            Ok((movies, total_pages)) => {
                let mut state = self.state.lock().await;
                state.total_pages = total_pages;
                state.phase = if state.current_page >= total_pages {
                    PagePhase::Exhausted
                } else {
                    PagePhase::Idle
                };
                info!(
                    category = %self.category,
                    page = state.current_page,
                    total_pages,
                    records = movies.len(),
                    "page loaded"
                );
                PageLoad::Loaded(movies)
            }
            Err(error) => {
                warn!(category = %self.category, page, "page load failed: {error}");
                self.state.lock().await.phase = PagePhase::Error;
                PageLoad::Failed(error)
            }
        }
    }

    async fn fetch_and_enrich(&self, page: u32) -> Result<(Vec<Movie>, u32), BrowseError> {
        let genres = self
            .genres
            .get()
            .await
            .map_err(|source| BrowseError::GenreFetch { source })?;
        let fetched = self
            .catalog
            .fetch_page(page, self.category)
            .await
            .map_err(|source| BrowseError::PageFetch {
                category: self.category,
                page,
                source,
            })?;
        let movies = fetched
            .movies
            .into_iter()
            .map(|mut movie| {
                movie.genre_names = resolve_genre_names(&movie.genre_ids, &genres);
                movie
            })
            .collect();
        Ok((movies, fetched.total_pages))
    }
}

#[derive(Debug, Clone)]
pub enum BrowserEvent {
    CollectionCleared,
    MoviesAppended { movies: Vec<Movie> },
    BusyChanged(bool),
    ConnectivityChanged(bool),
    Error(String),
}

struct BrowserState {
    movies: Vec<Movie>,
    busy: bool,
    connected: bool,
}

/// Presentation-facing session: owns the visible collection and the busy and
/// connectivity flags, and drives the pager from UI signals.
pub struct MovieBrowser {
    pager: CategoryPager,
    probe: Arc<dyn ConnectivityProbe>,
    navigator: Arc<dyn MovieDetailNavigator>,
    inner: Mutex<BrowserState>,
    events: broadcast::Sender<BrowserEvent>,
}

impl MovieBrowser {
    pub fn new(catalog: Arc<dyn MovieCatalog>, probe: Arc<dyn ConnectivityProbe>) -> Arc<Self> {
        Self::new_with_category(catalog, probe, MovieCategory::Upcoming)
    }

    pub fn new_with_category(
        catalog: Arc<dyn MovieCatalog>,
        probe: Arc<dyn ConnectivityProbe>,
        category: MovieCategory,
    ) -> Arc<Self> {
        Self::new_with_dependencies(catalog, probe, Arc::new(MissingDetailNavigator), category)
    }

    pub fn new_with_dependencies(
        catalog: Arc<dyn MovieCatalog>,
        probe: Arc<dyn ConnectivityProbe>,
        navigator: Arc<dyn MovieDetailNavigator>,
        category: MovieCategory,
    ) -> Arc<Self> {
        let genres = Arc::new(GenreCache::new(Arc::clone(&catalog)));
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            pager: CategoryPager::new(catalog, genres, category),
            probe,
            navigator,
            inner: Mutex::new(BrowserState {
                movies: Vec::new(),
                busy: false,
                connected: false,
            }),
            events,
        })
    }

    pub fn pager(&self) -> &CategoryPager {
        &self.pager
    }

    /// Snapshot of the visible collection, in load order.
    pub async fn movies(&self) -> Vec<Movie> {
        self.inner.lock().await.movies.clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.lock().await.busy
    }

    /// Reachability as of the last reload attempt.
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.connected
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BrowserEvent> {
        self.events.subscribe()
    }

    /// Clears the collection and restarts from page 1. The connectivity
    /// probe is consulted once at entry; the call is a silent no-op while a
    /// load is in flight or the network is unreachable.
    pub async fn reload(&self) {
        let reachable = self.probe.is_reachable();
        {
            let mut state = self.inner.lock().await;
            if state.connected != reachable {
                state.connected = reachable;
                let _ = self
                    .events
                    .send(BrowserEvent::ConnectivityChanged(reachable));
            }
            if !reachable {
                info!("reload skipped: {}", BrowseError::NetworkUnavailable);
                return;
            }
            if state.busy {
                info!("reload skipped: a load is already in flight");
                return;
            }
            state.busy = true;
        }
        let _ = self.events.send(BrowserEvent::BusyChanged(true));

        {
            let mut state = self.inner.lock().await;
            state.movies.clear();
        }
        let _ = self.events.send(BrowserEvent::CollectionCleared);

        let outcome = self.pager.load_first_page().await;
        self.apply_page_outcome(outcome).await;
        self.clear_busy().await;
    }

    /// Signal that `movie` became visible. When it sits within
    /// [`NEAR_END_LOOKAHEAD`] items of the end of the loaded collection the
    /// next page load is triggered; unknown movies are ignored.
    pub async fn on_item_visible(&self, movie: &Movie) {
        let near_end = {
            let state = self.inner.lock().await;
            match state.movies.iter().position(|m| m.id == movie.id) {
                Some(index) => state.movies.len().saturating_sub(NEAR_END_LOOKAHEAD) <= index,
                None => false,
            }
        };
        if near_end {
            self.load_next_page().await;
        }
    }

    /// Hands the selected movie, by value, to the injected navigator.
    pub async fn show_movie_detail(&self, movie: Movie) {
        if let Err(err) = self.navigator.show_detail(movie).await {
            let _ = self
                .events
                .send(BrowserEvent::Error(format!("failed to open movie detail: {err}")));
        }
    }

    async fn load_next_page(&self) {
        {
            let mut state = self.inner.lock().await;
            if state.busy {
                return;
            }
            state.busy = true;
        }
        let _ = self.events.send(BrowserEvent::BusyChanged(true));

        let outcome = self.pager.load_next_page().await;
        self.apply_page_outcome(outcome).await;
        self.clear_busy().await;
    }

    async fn apply_page_outcome(&self, outcome: PageLoad) {
        match outcome {
            PageLoad::Loaded(movies) => {
                if movies.is_empty() {
                    return;
                }
                {
                    let mut state = self.inner.lock().await;
                    state.movies.extend(movies.iter().cloned());
                }
                let _ = self.events.send(BrowserEvent::MoviesAppended { movies });
            }
            PageLoad::NoOp => {}
            PageLoad::Failed(error) => {
                let _ = self.events.send(BrowserEvent::Error(error.to_string()));
            }
        }
    }

    async fn clear_busy(&self) {
        {
            let mut state = self.inner.lock().await;
            state.busy = false;
        }
        let _ = self.events.send(BrowserEvent::BusyChanged(false));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

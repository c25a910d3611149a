use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    resolve_genre_names, AlwaysReachable, BrowserEvent, GenreCache, MovieBrowser, MovieCatalog,
    TmdbCatalog,
};
use shared::{domain::MovieCategory, protocol::Movie};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
struct Args {
    /// TMDb API key; falls back to tmdb.toml or TMDB_API_KEY.
    #[arg(long)]
    api_key: Option<String>,
    /// Category to browse: upcoming, now_playing, popular, or top_rated.
    #[arg(long, default_value = "upcoming")]
    category: String,
    /// How many pages to pull by simulating near-end scrolling.
    #[arg(long, default_value_t = 2)]
    pages: u32,
    /// Search the catalog for a title instead of browsing a category.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = load_settings();

    let api_key = args.api_key.or(settings.api_key).context(
        "no TMDb API key; pass --api-key, set TMDB_API_KEY, or add api_key to tmdb.toml",
    )?;
    let base_url = args.base_url.unwrap_or(settings.base_url);
    let category: MovieCategory = args.category.parse()?;
    let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbCatalog::with_base_url(&base_url, api_key)?);

    if let Some(query) = args.search {
        return search_titles(catalog, &query).await;
    }

    let browser = MovieBrowser::new_with_category(
        Arc::clone(&catalog),
        Arc::new(AlwaysReachable),
        category,
    );
    let mut events = browser.subscribe_events();

    browser.reload().await;
    for _ in 1..args.pages {
        let Some(last) = browser.movies().await.last().cloned() else {
            break;
        };
        browser.on_item_visible(&last).await;
    }

    while let Ok(event) = events.try_recv() {
        if let BrowserEvent::Error(message) = event {
            eprintln!("warning: {message}");
        }
    }

    let movies = browser.movies().await;
    println!(
        "{} {} movie(s), page {} of {}",
        movies.len(),
        category,
        browser.pager().current_page().await,
        browser.pager().total_pages().await
    );
    for movie in movies {
        print_movie(&movie, &movie.genre_names);
    }

    Ok(())
}

async fn search_titles(catalog: Arc<dyn MovieCatalog>, query: &str) -> Result<()> {
    let genres = GenreCache::new(Arc::clone(&catalog));
    let genre_table = genres.get().await?;
    let page = catalog.search_movies(query, 1).await?;

    println!(
        "{} result(s) for '{query}', page 1 of {}",
        page.movies.len(),
        page.total_pages
    );
    for movie in page.movies {
        let names = resolve_genre_names(&movie.genre_ids, &genre_table);
        print_movie(&movie, &names);
    }

    Ok(())
}

fn print_movie(movie: &Movie, genre_names: &str) {
    let release = movie
        .release_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "TBA".to_string());
    println!("{release}  {}  [{genre_names}]", movie.title);
}

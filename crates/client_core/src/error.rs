use shared::domain::MovieCategory;
use thiserror::Error;

/// Failure classification for catalog loads. These never propagate as `Err`
/// past the pager boundary; they are logged, turned into the `Error` phase,
/// and surfaced to presentation layers as an event.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("network is unreachable")]
    NetworkUnavailable,
    #[error("failed to fetch the genre list: {source}")]
    GenreFetch { source: anyhow::Error },
    #[error("failed to fetch {category} page {page}: {source}")]
    PageFetch {
        category: MovieCategory,
        page: u32,
        source: anyhow::Error,
    },
}

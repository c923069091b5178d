use std::collections::HashMap;
use std::path::Path;

use crate::models::{Mood, Movie};

/// Regional catalog source the engine draws from
///
/// Lookups are in-memory and side-effect-free; the engine snapshots the
/// region's movies at construction and never calls back mid-session.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogProvider: Send + Sync {
    /// All movies available in a region
    ///
    /// `None` means the region is unknown (a configuration error for the
    /// caller); `Some(vec![])` means a known region with no content.
    fn list_movies(&self, region: &str) -> Option<Vec<Movie>>;

    /// Pure mood filter
    ///
    /// The engine knows no mood semantics beyond `Short`; everything else is
    /// a provider-defined grouping over the movie's mood tags.
    fn filter_by_mood(&self, movies: &[Movie], mood: Mood) -> Vec<Movie> {
        movies
            .iter()
            .filter(|movie| movie.has_mood(mood))
            .cloned()
            .collect()
    }
}

/// Catalog provider backed by a plain region -> movies map
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    regions: HashMap<String, Vec<Movie>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a region, empty if it does not exist yet
    pub fn add_region(&mut self, region: impl Into<String>) {
        self.regions.entry(region.into()).or_default();
    }

    /// Adds a movie to a region, creating the region if needed
    pub fn add_movie(&mut self, region: impl Into<String>, movie: Movie) {
        self.regions.entry(region.into()).or_default().push(movie);
    }

    /// Known region codes
    pub fn regions(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    /// Loads a `{ "REGION": [movie, ...] }` JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let regions: HashMap<String, Vec<Movie>> = serde_json::from_str(&raw)?;
        tracing::info!(
            region_count = regions.len(),
            movie_count = regions.values().map(Vec::len).sum::<usize>(),
            "Loaded catalog from file"
        );
        Ok(Self { regions })
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn list_movies(&self, region: &str) -> Option<Vec<Movie>> {
        self.regions.get(region).cloned()
    }
}

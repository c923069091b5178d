use serde::{Deserialize, Serialize};

use super::Movie;

/// The bucket a feed item was drawn from
///
/// `Exploit`/`Explore`/`Wildcard` come from the allocator's direct-catalog
/// path; the remaining tags name the candidate store's quality buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServingBucket {
    Exploit,
    Explore,
    Wildcard,
    Trending,
    TopRated,
    Popular,
    NewNoteworthy,
    HiddenGems,
    Personalized,
}

impl ServingBucket {
    /// Human-readable explanation shown alongside the card
    pub fn reason(&self, movie: &Movie) -> String {
        match self {
            ServingBucket::Exploit => match movie.primary_genre() {
                Some(genre) => format!("Close to the {genre} you've been liking"),
                None => "Close match to your taste".to_string(),
            },
            ServingBucket::Explore => "Broadening your range".to_string(),
            ServingBucket::Wildcard => "Wildcard pick".to_string(),
            ServingBucket::Trending => "Trending right now".to_string(),
            ServingBucket::TopRated => "Critically acclaimed".to_string(),
            ServingBucket::Popular => "Crowd favorite".to_string(),
            ServingBucket::NewNoteworthy => "New and noteworthy".to_string(),
            ServingBucket::HiddenGems => "Hidden gem".to_string(),
            ServingBucket::Personalized => "Picked for your taste".to_string(),
        }
    }
}

/// A movie ready to be served, wrapped with its provenance
///
/// Feed items are produced and consumed within one session; they are never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedItem {
    pub movie: Movie,
    pub bucket: ServingBucket,
    pub score: f64,
    pub reason: String,
}

impl FeedItem {
    pub fn new(movie: Movie, bucket: ServingBucket, score: f64) -> Self {
        let reason = bucket.reason(&movie);
        Self {
            movie,
            bucket,
            score,
            reason,
        }
    }
}

/// Normalized exploit/explore/wildcard draw probabilities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BucketRatios {
    pub exploit: f64,
    pub explore: f64,
    pub wildcard: f64,
}

/// Diagnostic snapshot of an engine; not load-bearing for correctness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStats {
    pub queue_length: usize,
    pub history_size: usize,
    pub bucket_ratios: BucketRatios,
    pub fallback_level: u8,
}

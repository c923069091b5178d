//! Quality-bucketed candidate store
//!
//! Partitions a catalog into six quality buckets, keeps each sorted by a
//! bucket-local score, and serves one candidate at a time under a fixed
//! bucket distribution and a diversity constraint over the last five served
//! movies. The store never fails for "no candidates": its internal ladder
//! loosens the rules until only truly empty buckets remain.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{Datelike, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::models::{Era, FeedItem, Movie, ServingBucket, SwipeAction, TasteProfile};
use crate::services::scorer;

/// Serving distribution over the quality buckets
const SERVE_DISTRIBUTION: [(ServingBucket, f64); 6] = [
    (ServingBucket::Personalized, 0.50),
    (ServingBucket::Trending, 0.15),
    (ServingBucket::TopRated, 0.15),
    (ServingBucket::Popular, 0.10),
    (ServingBucket::NewNoteworthy, 0.05),
    (ServingBucket::HiddenGems, 0.05),
];

/// Bucket/candidate retries before falling back to the largest bucket
const MAX_DRAW_ATTEMPTS: usize = 10;

/// Diversity caps over any trailing window of 5 served movies
const DIVERSITY_WINDOW: usize = 5;
const MIN_SERVED_FOR_DIVERSITY: usize = 3;
const MAX_SAME_GENRE: usize = 3;
const MAX_SAME_DIRECTOR: usize = 2;
const MAX_SAME_ERA: usize = 4;

// Admission thresholds
const TRENDING_MIN_POPULARITY: f64 = 60.0;
const TRENDING_MIN_RATING: f64 = 6.0;
const TRENDING_MIN_VOTES: u32 = 100;
const TOP_RATED_MIN_RATING: f64 = 7.5;
const TOP_RATED_MIN_VOTES: u32 = 500;
const POPULAR_MIN_VOTES: u32 = 1000;
const POPULAR_MIN_RATING: f64 = 6.0;
const NEW_MAX_AGE_YEARS: i32 = 2;
const NEW_MIN_RATING: f64 = 6.5;
const NEW_MIN_VOTES: u32 = 50;
const HIDDEN_MIN_RATING: f64 = 7.3;
const HIDDEN_MIN_VOTES: u32 = 20;
const HIDDEN_MAX_VOTES: u32 = 300;
const PERSONALIZED_MIN_RATING: f64 = 5.5;

#[derive(Debug, Clone)]
struct ScoredCandidate {
    movie: Movie,
    score: f64,
}

/// Classification of one served movie, kept for the diversity window
#[derive(Debug, Clone)]
struct ServedTraits {
    genre: Option<String>,
    director: Option<String>,
    era: Era,
}

impl ServedTraits {
    fn of(movie: &Movie) -> Self {
        Self {
            genre: movie.primary_genre().map(str::to_string),
            director: movie.primary_director().map(str::to_string),
            era: movie.era,
        }
    }
}

pub struct CandidateStore {
    buckets: HashMap<ServingBucket, Vec<ScoredCandidate>>,
    profile: TasteProfile,
    shown: HashSet<Uuid>,
    recent: VecDeque<ServedTraits>,
    served_count: usize,
    current_year: i32,
}

impl CandidateStore {
    /// Builds the six buckets from a catalog snapshot
    ///
    /// A movie may land in several buckets; each bucket is sorted descending
    /// by its own score.
    pub fn new(catalog: &[Movie], profile: TasteProfile) -> Self {
        let current_year = Utc::now().year();
        let mut buckets: HashMap<ServingBucket, Vec<ScoredCandidate>> = HashMap::new();

        for (bucket, _) in SERVE_DISTRIBUTION {
            let mut candidates: Vec<ScoredCandidate> = catalog
                .iter()
                .filter(|movie| admits(bucket, movie, current_year))
                .map(|movie| ScoredCandidate {
                    score: bucket_score(bucket, movie, &profile, current_year),
                    movie: movie.clone(),
                })
                .collect();
            sort_descending(&mut candidates);
            buckets.insert(bucket, candidates);
        }

        Self {
            buckets,
            profile,
            shown: HashSet::new(),
            recent: VecDeque::new(),
            served_count: 0,
            current_year,
        }
    }

    /// Serves the next candidate, or `None` when every bucket is empty
    pub fn get_next<R: Rng>(&mut self, rng: &mut R) -> Option<FeedItem> {
        for _ in 0..MAX_DRAW_ATTEMPTS {
            let bucket = draw_bucket(rng);
            if let Some(candidate) = self.best_eligible(bucket, true) {
                return Some(self.serve(bucket, candidate));
            }
        }

        // Ladder: largest bucket, diversity dropped, then repeats allowed
        let bucket = self.largest_bucket()?;
        if let Some(candidate) = self.best_eligible(bucket, false) {
            return Some(self.serve(bucket, candidate));
        }
        let repeat = self.buckets.get(&bucket)?.first().cloned()?;
        Some(self.serve(bucket, repeat))
    }

    /// Removes a swiped movie from every bucket so it cannot resurface
    pub fn record_swipe(&mut self, movie_id: Uuid, _action: SwipeAction) {
        for candidates in self.buckets.values_mut() {
            candidates.retain(|candidate| candidate.movie.id != movie_id);
        }
        self.shown.insert(movie_id);
    }

    /// Replaces the profile and re-scores the personalized bucket
    ///
    /// Other buckets' scores are profile-independent and keep their order.
    pub fn update_profile(&mut self, profile: TasteProfile) {
        self.profile = profile;
        if let Some(candidates) = self.buckets.get_mut(&ServingBucket::Personalized) {
            for candidate in candidates.iter_mut() {
                candidate.score = scorer::score(&candidate.movie, &self.profile);
            }
            sort_descending(candidates);
        }
    }

    /// True when no bucket holds any candidate
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Highest-scored candidate in a bucket that has not been shown and,
    /// when `diverse` is set, would not break the diversity caps
    fn best_eligible(&self, bucket: ServingBucket, diverse: bool) -> Option<ScoredCandidate> {
        self.buckets
            .get(&bucket)?
            .iter()
            .find(|candidate| {
                !self.shown.contains(&candidate.movie.id)
                    && (!diverse || self.passes_diversity(&candidate.movie))
            })
            .cloned()
    }

    fn serve(&mut self, bucket: ServingBucket, candidate: ScoredCandidate) -> FeedItem {
        self.shown.insert(candidate.movie.id);
        self.recent.push_back(ServedTraits::of(&candidate.movie));
        if self.recent.len() >= DIVERSITY_WINDOW {
            self.recent.pop_front();
        }
        self.served_count += 1;
        FeedItem::new(candidate.movie, bucket, candidate.score)
    }

    /// Rejects a candidate that would push any trait count within the
    /// trailing 5-movie window past its cap
    fn passes_diversity(&self, movie: &Movie) -> bool {
        if self.served_count < MIN_SERVED_FOR_DIVERSITY {
            return true;
        }

        let genre = movie.primary_genre();
        let director = movie.primary_director();

        let mut same_genre = 1;
        let mut same_director = 1;
        let mut same_era = 1;
        for traits in &self.recent {
            if genre.is_some() && traits.genre.as_deref() == genre {
                same_genre += 1;
            }
            if director.is_some() && traits.director.as_deref() == director {
                same_director += 1;
            }
            if traits.era == movie.era {
                same_era += 1;
            }
        }

        same_genre <= MAX_SAME_GENRE
            && same_director <= MAX_SAME_DIRECTOR
            && same_era <= MAX_SAME_ERA
    }

    fn largest_bucket(&self) -> Option<ServingBucket> {
        // fixed iteration order keeps same-seed sessions reproducible
        SERVE_DISTRIBUTION
            .iter()
            .map(|(bucket, _)| *bucket)
            .filter(|bucket| !self.buckets[bucket].is_empty())
            .max_by_key(|bucket| self.buckets[bucket].len())
    }

    #[cfg(test)]
    fn bucket_len(&self, bucket: ServingBucket) -> usize {
        self.buckets.get(&bucket).map_or(0, Vec::len)
    }
}

fn draw_bucket<R: Rng>(rng: &mut R) -> ServingBucket {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (bucket, share) in SERVE_DISTRIBUTION {
        cumulative += share;
        if roll < cumulative {
            return bucket;
        }
    }
    ServingBucket::Personalized
}

fn admits(bucket: ServingBucket, movie: &Movie, current_year: i32) -> bool {
    match bucket {
        ServingBucket::Trending => {
            movie.popularity.unwrap_or(0.0) >= TRENDING_MIN_POPULARITY
                && movie.rating >= TRENDING_MIN_RATING
                && movie.rating_count >= TRENDING_MIN_VOTES
        }
        ServingBucket::TopRated => {
            movie.rating >= TOP_RATED_MIN_RATING && movie.rating_count >= TOP_RATED_MIN_VOTES
        }
        ServingBucket::Popular => {
            movie.rating_count >= POPULAR_MIN_VOTES && movie.rating >= POPULAR_MIN_RATING
        }
        ServingBucket::NewNoteworthy => {
            current_year - movie.release_year <= NEW_MAX_AGE_YEARS
                && movie.rating >= NEW_MIN_RATING
                && movie.rating_count >= NEW_MIN_VOTES
        }
        ServingBucket::HiddenGems => {
            movie.rating >= HIDDEN_MIN_RATING
                && (HIDDEN_MIN_VOTES..=HIDDEN_MAX_VOTES).contains(&movie.rating_count)
        }
        ServingBucket::Personalized => movie.rating >= PERSONALIZED_MIN_RATING,
        _ => false,
    }
}

fn bucket_score(
    bucket: ServingBucket,
    movie: &Movie,
    profile: &TasteProfile,
    current_year: i32,
) -> f64 {
    match bucket {
        ServingBucket::Trending => movie.popularity.unwrap_or(scorer::DEFAULT_POPULARITY),
        ServingBucket::TopRated => movie.rating * 10.0 + (movie.rating_count as f64).ln_1p(),
        ServingBucket::Popular => (movie.rating_count as f64).ln_1p() * 10.0 + movie.rating,
        ServingBucket::NewNoteworthy => {
            let age = (current_year - movie.release_year).max(0) as f64;
            movie.rating * 10.0 - age * 5.0
        }
        ServingBucket::HiddenGems => {
            // obscurity bonus shrinks as the vote count approaches the cap
            let obscurity = (HIDDEN_MAX_VOTES.saturating_sub(movie.rating_count)) as f64
                / HIDDEN_MAX_VOTES as f64;
            movie.rating * 10.0 + obscurity * 5.0
        }
        _ => scorer::score(movie, profile),
    }
}

fn sort_descending(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn varied_catalog() -> Vec<Movie> {
        let genres = ["drama", "comedy", "action", "horror", "sci-fi"];
        let directors = ["Ada", "Ben", "Cho", "Dia", "Eli"];
        let years = [1975, 2005, 2024];
        let mut movies = Vec::new();
        for index in 0..60 {
            let movie = Movie::new(format!("Movie {index}"), years[index % 3], 90 + (index as u32 % 5) * 15)
                .with_genres(&[genres[index % 5]])
                .with_directors(&[directors[(index / 2) % 5]])
                .with_rating(5.5 + (index % 5) as f64, 50 + (index as u32 * 37) % 2000)
                .with_popularity(20.0 + (index as f64 * 7.0) % 150.0);
            movies.push(movie);
        }
        movies
    }

    #[test]
    fn test_buckets_are_populated_and_sorted() {
        let store = CandidateStore::new(&varied_catalog(), TasteProfile::new());
        assert!(store.bucket_len(ServingBucket::Personalized) > 0);
        let personalized = &store.buckets[&ServingBucket::Personalized];
        for pair in personalized.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_get_next_never_repeats_while_fresh() {
        let catalog = varied_catalog();
        let mut store = CandidateStore::new(&catalog, TasteProfile::new());
        let mut rng = rng();
        let mut seen = HashSet::new();
        for _ in 0..30 {
            let item = store.get_next(&mut rng).expect("catalog is non-empty");
            assert!(seen.insert(item.movie.id), "{} repeated", item.movie.title);
        }
    }

    #[test]
    fn test_empty_catalog_returns_none() {
        let mut store = CandidateStore::new(&[], TasteProfile::new());
        let mut rng = rng();
        assert!(store.is_empty());
        assert!(store.get_next(&mut rng).is_none());
    }

    #[test]
    fn test_swiped_movie_cannot_resurface() {
        let catalog = varied_catalog();
        let target = catalog[0].id;
        let mut store = CandidateStore::new(&catalog, TasteProfile::new());
        store.record_swipe(target, SwipeAction::Pass);
        let mut rng = rng();
        for _ in 0..catalog.len() {
            if let Some(item) = store.get_next(&mut rng) {
                assert_ne!(item.movie.id, target);
            }
        }
    }

    #[test]
    fn test_diversity_caps_hold() {
        let catalog = varied_catalog();
        let mut store = CandidateStore::new(&catalog, TasteProfile::new());
        let mut rng = rng();
        let mut served: Vec<Movie> = Vec::new();
        for _ in 0..25 {
            if let Some(item) = store.get_next(&mut rng) {
                served.push(item.movie);
            }
        }
        for window in served.windows(DIVERSITY_WINDOW) {
            for movie in window {
                let genre_count = window
                    .iter()
                    .filter(|m| m.primary_genre() == movie.primary_genre())
                    .count();
                let director_count = window
                    .iter()
                    .filter(|m| m.primary_director() == movie.primary_director())
                    .count();
                let era_count = window.iter().filter(|m| m.era == movie.era).count();
                assert!(genre_count <= MAX_SAME_GENRE);
                assert!(director_count <= MAX_SAME_DIRECTOR);
                assert!(era_count <= MAX_SAME_ERA);
            }
        }
    }

    #[test]
    fn test_tiny_catalog_allows_repeats_instead_of_failing() {
        let movie = Movie::new("Only One", 2024, 100)
            .with_genres(&["drama"])
            .with_rating(8.0, 5000)
            .with_popularity(120.0);
        let mut store = CandidateStore::new(&[movie], TasteProfile::new());
        let mut rng = rng();
        for _ in 0..5 {
            assert!(store.get_next(&mut rng).is_some());
        }
    }

    #[test]
    fn test_update_profile_rescores_personalized() {
        // identical except for genre, so the taste signal decides the order
        let catalog: Vec<Movie> = ["sci-fi", "drama", "comedy"]
            .into_iter()
            .map(|genre| {
                Movie::new(format!("{genre} pick"), 2020, 110)
                    .with_genres(&[genre])
                    .with_rating(7.0, 400)
                    .with_popularity(50.0)
            })
            .collect();
        let mut store = CandidateStore::new(&catalog, TasteProfile::new());

        let trainer = Movie::new("Trainer", 2020, 110).with_genres(&["sci-fi"]);
        let mut profile = TasteProfile::new();
        for _ in 0..6 {
            profile = profile.apply_swipe(&trainer, SwipeAction::Like);
        }
        store.update_profile(profile);
        let top = &store.buckets[&ServingBucket::Personalized][0];
        assert_eq!(top.movie.primary_genre(), Some("sci-fi"));
    }
}

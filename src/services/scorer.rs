//! Taste-weighted scoring
//!
//! Genre and mood sums are clamped before being added, so no single label
//! dimension can veto or dominate the total.

use crate::models::{Movie, TasteProfile};

/// Popularity assumed for movies the catalog supplies none for
pub const DEFAULT_POPULARITY: f64 = 50.0;

const POPULARITY_WEIGHT: f64 = 0.3;
const GENRE_SCALE: f64 = 20.0;
const GENRE_MIN: f64 = -15.0;
const GENRE_MAX: f64 = 30.0;
const MOOD_SCALE: f64 = 15.0;
const MOOD_MIN: f64 = -10.0;
const MOOD_MAX: f64 = 15.0;
const ERA_SCALE: f64 = 10.0;
const RUNTIME_MAX_BONUS: f64 = 15.0;
const RUNTIME_FALLOFF: f64 = 0.2;
const DIRECTOR_SCALE: f64 = 10.0;
const CAST_SCALE: f64 = 5.0;

/// Scores a movie against a taste profile
///
/// Pure and total over all valid movies: missing optional fields contribute
/// their neutral default, never an error.
pub fn score(movie: &Movie, profile: &TasteProfile) -> f64 {
    let mut total = movie.popularity.unwrap_or(DEFAULT_POPULARITY) * POPULARITY_WEIGHT;

    let genre_sum: f64 = movie
        .genres
        .iter()
        .map(|genre| profile.genre_weight(genre))
        .sum();
    total += (genre_sum * GENRE_SCALE).clamp(GENRE_MIN, GENRE_MAX);

    let mood_sum: f64 = movie
        .moods
        .iter()
        .map(|mood| profile.mood_weight(*mood))
        .sum();
    total += (mood_sum * MOOD_SCALE).clamp(MOOD_MIN, MOOD_MAX);

    total += profile.era_weight(movie.era) * ERA_SCALE;

    // Decaying runtime-proximity bonus; reaches 0 past 75 minutes deviation
    let deviation = (movie.runtime_minutes as f64 - profile.preferred_runtime).abs();
    total += (RUNTIME_MAX_BONUS - deviation * RUNTIME_FALLOFF).max(0.0);

    let director_sum: f64 = movie
        .directors
        .iter()
        .map(|director| profile.director_weight(director))
        .sum();
    total += director_sum * DIRECTOR_SCALE;

    let cast_sum: f64 = movie
        .cast
        .iter()
        .map(|name| profile.cast_weight(name))
        .sum();
    total += cast_sum * CAST_SCALE;

    total
}

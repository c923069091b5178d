use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Era, Mood, Movie, SwipeAction};

/// Weight applied to every genre/mood label on a liked movie
pub const LIKE_DELTA: f64 = 0.15;
/// Weight applied on a save; a save signals stronger intent than a like
pub const SAVE_DELTA: f64 = 0.22;
/// Weight applied on a pass
pub const PASS_DELTA: f64 = -0.08;

/// Era labels receive half the base delta
const ERA_FACTOR: f64 = 0.5;
/// Directors are a stronger taste signal than billing-order cast
const DIRECTOR_FACTOR: f64 = 1.5;
/// Per-session decay applied to every weight
const DECAY_FACTOR: f64 = 0.95;

/// Neutral starting point for the preferred-runtime running mean
pub const DEFAULT_PREFERRED_RUNTIME: f64 = 110.0;
/// Mild recency prior seeded into a fresh profile
const RECENT_ERA_PRIOR: f64 = 0.1;

/// Per-user weighted-preference model
///
/// All weight map values stay within [-1, 1]; absent keys are implicitly 0.
/// Profiles are replaced wholesale: callers never mutate one in place, every
/// mutation goes through [`TasteProfile::apply_swipe`] or
/// [`TasteProfile::decayed`], which return new values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TasteProfile {
    #[serde(default)]
    pub genres: HashMap<String, f64>,
    #[serde(default)]
    pub mood_weights: HashMap<Mood, f64>,
    #[serde(default)]
    pub era_weights: HashMap<Era, f64>,
    #[serde(default)]
    pub directors: HashMap<String, f64>,
    #[serde(default)]
    pub cast: HashMap<String, f64>,
    /// Running mean of runtimes of liked/saved movies
    pub preferred_runtime: f64,
    pub like_count: u32,
    pub pass_count: u32,
    pub save_count: u32,
    /// Resets to 0 on any like/save; a long streak signals disengagement
    pub consecutive_passes: u32,
    pub last_updated: DateTime<Utc>,
}

impl Default for TasteProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl TasteProfile {
    /// Creates a fresh profile: all weights zero except a mild recency prior
    pub fn new() -> Self {
        let mut era_weights = HashMap::new();
        era_weights.insert(Era::Recent, RECENT_ERA_PRIOR);
        Self {
            genres: HashMap::new(),
            mood_weights: HashMap::new(),
            era_weights,
            directors: HashMap::new(),
            cast: HashMap::new(),
            preferred_runtime: DEFAULT_PREFERRED_RUNTIME,
            like_count: 0,
            pass_count: 0,
            save_count: 0,
            consecutive_passes: 0,
            last_updated: Utc::now(),
        }
    }

    /// Weight for a genre label, 0 when absent
    pub fn genre_weight(&self, genre: &str) -> f64 {
        self.genres.get(genre).copied().unwrap_or(0.0)
    }

    /// Weight for a mood label, 0 when absent
    pub fn mood_weight(&self, mood: Mood) -> f64 {
        self.mood_weights.get(&mood).copied().unwrap_or(0.0)
    }

    /// Weight for an era label, 0 when absent
    pub fn era_weight(&self, era: Era) -> f64 {
        self.era_weights.get(&era).copied().unwrap_or(0.0)
    }

    /// Weight for a director, 0 when absent
    pub fn director_weight(&self, director: &str) -> f64 {
        self.directors.get(director).copied().unwrap_or(0.0)
    }

    /// Weight for a cast member, 0 when absent
    pub fn cast_weight(&self, name: &str) -> f64 {
        self.cast.get(name).copied().unwrap_or(0.0)
    }

    /// Total recorded interactions
    pub fn total_interactions(&self) -> u32 {
        self.like_count + self.pass_count + self.save_count
    }

    /// Checks that every weight is finite and within [-1, 1] and the
    /// preferred runtime is positive
    ///
    /// Rehydrated profiles come from external storage; a malformed one is a
    /// caller-contract violation surfaced at engine construction.
    pub fn is_well_formed(&self) -> bool {
        let in_range = |w: &f64| w.is_finite() && (-1.0..=1.0).contains(w);
        self.genres.values().all(in_range)
            && self.mood_weights.values().all(in_range)
            && self.era_weights.values().all(in_range)
            && self.directors.values().all(in_range)
            && self.cast.values().all(in_range)
            && self.preferred_runtime.is_finite()
            && self.preferred_runtime > 0.0
    }

    /// Returns the profile after recording a swipe, stamped with `Utc::now()`
    pub fn apply_swipe(&self, movie: &Movie, action: SwipeAction) -> Self {
        self.apply_swipe_at(movie, action, Utc::now())
    }

    /// Pure profile update: same inputs always produce the same output
    ///
    /// The signed delta for the action is applied to every genre and mood
    /// label on the movie, half of it to the era label, 1.5x to directors,
    /// and 1x to cast. Every resulting weight is clamped to [-1, 1]. On
    /// like/save the preferred runtime is folded into the running mean and
    /// the pass streak resets.
    pub fn apply_swipe_at(&self, movie: &Movie, action: SwipeAction, now: DateTime<Utc>) -> Self {
        let delta = match action {
            SwipeAction::Like => LIKE_DELTA,
            SwipeAction::Save => SAVE_DELTA,
            SwipeAction::Pass => PASS_DELTA,
        };

        let mut next = self.clone();
        for genre in &movie.genres {
            bump(&mut next.genres, genre.clone(), delta);
        }
        for mood in &movie.moods {
            bump(&mut next.mood_weights, *mood, delta);
        }
        bump(&mut next.era_weights, movie.era, delta * ERA_FACTOR);
        for director in &movie.directors {
            bump(&mut next.directors, director.clone(), delta * DIRECTOR_FACTOR);
        }
        for name in &movie.cast {
            bump(&mut next.cast, name.clone(), delta);
        }

        match action {
            SwipeAction::Like => {
                next.like_count += 1;
                next.consecutive_passes = 0;
                next.fold_runtime(movie.runtime_minutes);
            }
            SwipeAction::Save => {
                next.save_count += 1;
                next.consecutive_passes = 0;
                next.fold_runtime(movie.runtime_minutes);
            }
            SwipeAction::Pass => {
                next.pass_count += 1;
                next.consecutive_passes += 1;
            }
        }

        next.last_updated = now;
        next
    }

    /// Returns the profile with every weight multiplied by the decay factor
    ///
    /// Counters are untouched. Intended to run once per session start so
    /// stale preferences fade; never invoked mid-session by the scorer or
    /// the allocator.
    pub fn decayed(&self) -> Self {
        let mut next = self.clone();
        for weight in next.genres.values_mut() {
            *weight *= DECAY_FACTOR;
        }
        for weight in next.mood_weights.values_mut() {
            *weight *= DECAY_FACTOR;
        }
        for weight in next.era_weights.values_mut() {
            *weight *= DECAY_FACTOR;
        }
        for weight in next.directors.values_mut() {
            *weight *= DECAY_FACTOR;
        }
        for weight in next.cast.values_mut() {
            *weight *= DECAY_FACTOR;
        }
        next
    }

    /// Incremental running mean over likes + saves
    fn fold_runtime(&mut self, runtime_minutes: u32) {
        let n = (self.like_count + self.save_count) as f64;
        self.preferred_runtime =
            (self.preferred_runtime * (n - 1.0) + runtime_minutes as f64) / n;
    }
}

fn bump<K: std::hash::Hash + Eq>(weights: &mut HashMap<K, f64>, key: K, delta: f64) {
    let entry = weights.entry(key).or_insert(0.0);
    *entry = (*entry + delta).clamp(-1.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drama(runtime: u32) -> Movie {
        Movie::new("Test Drama", 2020, runtime)
            .with_genres(&["drama"])
            .with_moods(&[Mood::Intense])
            .with_directors(&["D. Director"])
            .with_cast(&["A. Actor"])
    }

    #[test]
    fn test_new_profile_has_recency_prior() {
        let profile = TasteProfile::new();
        assert_eq!(profile.era_weight(Era::Recent), RECENT_ERA_PRIOR);
        assert_eq!(profile.era_weight(Era::Classic), 0.0);
        assert_eq!(profile.preferred_runtime, DEFAULT_PREFERRED_RUNTIME);
    }

    #[test]
    fn test_like_applies_deltas() {
        let profile = TasteProfile::new().apply_swipe(&drama(120), SwipeAction::Like);
        assert_eq!(profile.genre_weight("drama"), LIKE_DELTA);
        assert_eq!(profile.mood_weight(Mood::Intense), LIKE_DELTA);
        assert_eq!(profile.era_weight(Era::Recent), RECENT_ERA_PRIOR + LIKE_DELTA * 0.5);
        assert_eq!(profile.director_weight("D. Director"), LIKE_DELTA * 1.5);
        assert_eq!(profile.cast_weight("A. Actor"), LIKE_DELTA);
        assert_eq!(profile.like_count, 1);
    }

    #[test]
    fn test_two_likes_accumulate() {
        let a = drama(120);
        let b = drama(90);
        let profile = TasteProfile::new()
            .apply_swipe(&a, SwipeAction::Like)
            .apply_swipe(&b, SwipeAction::Like);
        assert!((profile.genre_weight("drama") - 0.30).abs() < 1e-9);
        assert_eq!(profile.like_count, 2);
    }

    #[test]
    fn test_weights_clamped() {
        let movie = drama(120);
        let mut profile = TasteProfile::new();
        for _ in 0..20 {
            profile = profile.apply_swipe(&movie, SwipeAction::Save);
        }
        assert_eq!(profile.genre_weight("drama"), 1.0);
        assert_eq!(profile.director_weight("D. Director"), 1.0);
    }

    #[test]
    fn test_pass_streak_resets_on_like() {
        let movie = drama(120);
        let mut profile = TasteProfile::new();
        for _ in 0..5 {
            profile = profile.apply_swipe(&movie, SwipeAction::Pass);
        }
        assert_eq!(profile.consecutive_passes, 5);
        profile = profile.apply_swipe(&movie, SwipeAction::Like);
        assert_eq!(profile.consecutive_passes, 0);
        assert_eq!(profile.pass_count, 5);
    }

    #[test]
    fn test_preferred_runtime_running_mean() {
        let profile = TasteProfile::new()
            .apply_swipe(&drama(90), SwipeAction::Like)
            .apply_swipe(&drama(150), SwipeAction::Save);
        // first like sets the mean to the movie runtime, second averages
        assert!((profile.preferred_runtime - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_pass_does_not_touch_runtime() {
        let profile = TasteProfile::new().apply_swipe(&drama(30), SwipeAction::Pass);
        assert_eq!(profile.preferred_runtime, DEFAULT_PREFERRED_RUNTIME);
    }

    #[test]
    fn test_update_is_pure() {
        let movie = drama(120);
        let base = TasteProfile::new();
        let now = Utc::now();
        let once = base.apply_swipe_at(&movie, SwipeAction::Like, now);
        let twice = base.apply_swipe_at(&movie, SwipeAction::Like, now);
        assert_eq!(once, twice);
        assert_eq!(base.like_count, 0);
    }

    #[test]
    fn test_decay_shrinks_without_sign_flip() {
        let liked = drama(120);
        let passed = Movie::new("Slow", 2020, 200).with_genres(&["western"]);
        let mut profile = TasteProfile::new()
            .apply_swipe(&liked, SwipeAction::Like)
            .apply_swipe(&passed, SwipeAction::Pass);
        let before_pos = profile.genre_weight("drama");
        let before_neg = profile.genre_weight("western");
        for _ in 0..50 {
            profile = profile.decayed();
        }
        let after_pos = profile.genre_weight("drama");
        let after_neg = profile.genre_weight("western");
        assert!(after_pos > 0.0 && after_pos < before_pos);
        assert!(after_neg < 0.0 && after_neg > before_neg);
        assert_eq!(profile.like_count, 1);
        assert_eq!(profile.pass_count, 1);
    }

    #[test]
    fn test_malformed_profile_detected() {
        let mut profile = TasteProfile::new();
        profile.genres.insert("drama".to_string(), 3.5);
        assert!(!profile.is_well_formed());
        profile.genres.insert("drama".to_string(), f64::NAN);
        assert!(!profile.is_well_formed());
    }
}

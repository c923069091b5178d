//! Session feed engine
//!
//! Owns a ready-to-serve queue, a bounded history window, the swipe-outcome
//! sets, and the fallback ladder. One engine is owned exclusively by one
//! session; nothing here is internally synchronized. The engine is fully
//! synchronous: catalog access is an in-memory snapshot taken at
//! construction, so no call suspends or blocks.
//!
//! Fallback ladder, loosest rule that still yields candidates wins:
//!   0. fresh movies only (not swiped, not in the history window, mood-matching)
//!   1. history window dropped, repeats of earlier-in-session movies allowed
//!   2. liked/passed dropped too; saved stays excluded
//!   3. the entire regional catalog, history cleared
//!
//! `get_next()` returns `None` only when the regional catalog itself is
//! empty. Anything else is a correctness bug.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::models::{EngineStats, FeedItem, Mood, Movie, SwipeAction, TasteProfile};
use crate::services::allocator;
use crate::services::candidate_store::CandidateStore;
use crate::services::catalog::CatalogProvider;
use crate::services::scorer;

/// Queue length refills top back up to
pub const QUEUE_TARGET: usize = 40;
/// Queue length below which a refill triggers
pub const REFILL_THRESHOLD: usize = 15;
/// Recently-served ids kept for level-0 filtering, FIFO eviction
pub const HISTORY_CAP: usize = 100;

/// Consecutive unusable store candidates before the refill moves on to the
/// direct-catalog ladder
const STORE_MISS_LIMIT: usize = 5;

/// Caller-contract violations surfaced at construction or profile replacement
///
/// Data scarcity is never an error; empty pools trigger the next fallback
/// level instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Malformed taste profile: {0}")]
    MalformedProfile(String),
}

pub struct FeedEngine {
    region: String,
    /// Full regional snapshot; level 3 serves from this unconditionally
    catalog: Vec<Movie>,
    /// Catalog after the optional mood filter; levels 0-2 draw from this
    mood_pool: Vec<Movie>,
    by_id: HashMap<Uuid, Movie>,
    profile: TasteProfile,
    liked: HashSet<Uuid>,
    passed: HashSet<Uuid>,
    saved: HashSet<Uuid>,
    store: CandidateStore,
    queue: VecDeque<FeedItem>,
    history: VecDeque<Uuid>,
    history_set: HashSet<Uuid>,
    fallback_level: u8,
    rng: StdRng,
}

impl FeedEngine {
    /// Builds an engine for one (region, profile, swipe-history) tuple and
    /// eagerly fills its queue
    ///
    /// The RNG seed is explicit so scenario tests are exactly reproducible.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: &dyn CatalogProvider,
        region: &str,
        profile: TasteProfile,
        liked: HashSet<Uuid>,
        passed: HashSet<Uuid>,
        saved: HashSet<Uuid>,
        mood_filter: Option<Mood>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if !profile.is_well_formed() {
            return Err(EngineError::MalformedProfile(
                "weights must be finite and within [-1, 1]".to_string(),
            ));
        }
        let catalog = provider
            .list_movies(region)
            .ok_or_else(|| EngineError::UnknownRegion(region.to_string()))?;
        let mood_pool = match mood_filter {
            Some(mood) => provider.filter_by_mood(&catalog, mood),
            None => catalog.clone(),
        };
        let by_id: HashMap<Uuid, Movie> =
            catalog.iter().map(|movie| (movie.id, movie.clone())).collect();

        // the store only ever sees movies the user has not swiped on
        let fresh: Vec<Movie> = mood_pool
            .iter()
            .filter(|movie| {
                !liked.contains(&movie.id)
                    && !passed.contains(&movie.id)
                    && !saved.contains(&movie.id)
            })
            .cloned()
            .collect();
        let store = CandidateStore::new(&fresh, profile.clone());

        let mut engine = Self {
            region: region.to_string(),
            catalog,
            mood_pool,
            by_id,
            profile,
            liked,
            passed,
            saved,
            store,
            queue: VecDeque::new(),
            history: VecDeque::new(),
            history_set: HashSet::new(),
            fallback_level: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        engine.refill();
        tracing::debug!(
            region = %engine.region,
            catalog_size = engine.catalog.len(),
            queue = engine.queue.len(),
            "Feed engine ready"
        );
        Ok(engine)
    }

    /// True iff the regional catalog has any movies at all
    pub fn has_content(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Serves the next feed item
    ///
    /// Returns `None` only when [`FeedEngine::has_content`] is false.
    pub fn get_next(&mut self) -> Option<FeedItem> {
        if !self.has_content() {
            return None;
        }
        if self.queue.len() < REFILL_THRESHOLD {
            self.refill();
        }
        if self.queue.is_empty() {
            // should be unreachable with a non-empty catalog; refill from
            // everything rather than starve the caller
            self.emergency_refill();
        }
        let item = self.queue.pop_front()?;
        self.remember(item.movie.id);
        Some(item)
    }

    /// Non-consuming look-ahead at the next `count` queued items, for
    /// image/trailer prefetching
    pub fn peek(&self, count: usize) -> Vec<FeedItem> {
        self.queue.iter().take(count).cloned().collect()
    }

    /// Records a swipe outcome
    ///
    /// The movie leaves the queue if still present, so a second device or a
    /// race cannot re-show something already swiped on.
    pub fn record_swipe(&mut self, movie_id: Uuid, action: SwipeAction) {
        match action {
            SwipeAction::Like => self.liked.insert(movie_id),
            SwipeAction::Pass => self.passed.insert(movie_id),
            SwipeAction::Save => self.saved.insert(movie_id),
        };
        self.queue.retain(|item| item.movie.id != movie_id);
        self.store.record_swipe(movie_id, action);
    }

    /// Replaces the taste profile wholesale
    pub fn update_profile(&mut self, profile: TasteProfile) -> Result<(), EngineError> {
        if !profile.is_well_formed() {
            return Err(EngineError::MalformedProfile(
                "weights must be finite and within [-1, 1]".to_string(),
            ));
        }
        self.store.update_profile(profile.clone());
        self.profile = profile;
        Ok(())
    }

    /// The movie behind an id, if it exists in this region
    pub fn movie(&self, movie_id: &Uuid) -> Option<&Movie> {
        self.by_id.get(movie_id)
    }

    pub fn profile(&self) -> &TasteProfile {
        &self.profile
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Diagnostic snapshot; observability only
    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            queue_length: self.queue.len(),
            history_size: self.history.len(),
            bucket_ratios: allocator::bucket_ratios(&self.profile),
            fallback_level: self.fallback_level,
        }
    }

    /// Tops the queue back up to the target length
    ///
    /// The candidate store serves first; once it runs dry the direct-catalog
    /// ladder takes over, loosening filters level by level. The fallback
    /// level is recomputed from scratch on every refill.
    fn refill(&mut self) {
        if self.queue.len() >= QUEUE_TARGET {
            return;
        }
        self.fallback_level = 0;

        let mut misses = 0;
        while self.queue.len() < QUEUE_TARGET && misses < STORE_MISS_LIMIT {
            match self.store.get_next(&mut self.rng) {
                Some(item) if self.accepts(item.movie.id) => {
                    self.queue.push_back(item);
                    misses = 0;
                }
                Some(_) => misses += 1,
                None => break,
            }
        }
        if self.queue.len() >= QUEUE_TARGET {
            return;
        }

        for level in 0..=3u8 {
            if self.queue.len() >= QUEUE_TARGET {
                break;
            }
            if level == 3 {
                // clear the window so the next refill does not starve again
                self.history.clear();
                self.history_set.clear();
            }
            let mut pool = self.pool_at_level(level);
            if pool.is_empty() {
                continue;
            }
            self.fallback_level = level;
            self.drain_pool(&mut pool);
        }

        tracing::debug!(
            region = %self.region,
            queue = self.queue.len(),
            level = self.fallback_level,
            "Refilled feed queue"
        );
    }

    /// Level-3 refill invoked when the queue is unexpectedly empty
    fn emergency_refill(&mut self) {
        if self.catalog.is_empty() {
            return;
        }
        tracing::warn!(region = %self.region, "Feed queue ran dry, emergency refill");
        self.fallback_level = 3;
        self.history.clear();
        self.history_set.clear();
        let mut pool = self.pool_at_level(3);
        self.drain_pool(&mut pool);
    }

    /// Draws from a score-sorted pool through the bucket allocator until the
    /// queue hits its target; drawn candidates leave the pool so one refill
    /// pass never enqueues duplicates
    fn drain_pool(&mut self, pool: &mut Vec<(Movie, f64)>) {
        while self.queue.len() < QUEUE_TARGET && !pool.is_empty() {
            let bucket = allocator::select_bucket(&self.profile, &mut self.rng);
            let Some(index) = allocator::draw_index(pool.len(), bucket, &mut self.rng) else {
                break;
            };
            let (movie, score) = pool.remove(index);
            self.queue.push_back(FeedItem::new(movie, bucket, score));
        }
    }

    /// Candidate pool for one fallback level, score-sorted descending and
    /// never containing anything already queued
    fn pool_at_level(&self, level: u8) -> Vec<(Movie, f64)> {
        let queued: HashSet<Uuid> = self.queue.iter().map(|item| item.movie.id).collect();
        let base: &[Movie] = if level >= 3 {
            &self.catalog
        } else {
            &self.mood_pool
        };
        let mut pool: Vec<(Movie, f64)> = base
            .iter()
            .filter(|movie| !queued.contains(&movie.id))
            .filter(|movie| match level {
                0 => !self.is_swiped(movie.id) && !self.history_set.contains(&movie.id),
                1 => !self.is_swiped(movie.id),
                2 => !self.saved.contains(&movie.id),
                _ => true,
            })
            .map(|movie| {
                let score = scorer::score(movie, &self.profile);
                (movie.clone(), score)
            })
            .collect();
        pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pool
    }

    fn accepts(&self, movie_id: Uuid) -> bool {
        !self.is_swiped(movie_id)
            && !self.history_set.contains(&movie_id)
            && !self.queue.iter().any(|item| item.movie.id == movie_id)
    }

    fn is_swiped(&self, movie_id: Uuid) -> bool {
        self.liked.contains(&movie_id)
            || self.passed.contains(&movie_id)
            || self.saved.contains(&movie_id)
    }

    fn remember(&mut self, movie_id: Uuid) {
        if self.history_set.insert(movie_id) {
            self.history.push_back(movie_id);
        }
        while self.history.len() > HISTORY_CAP {
            if let Some(evicted) = self.history.pop_front() {
                self.history_set.remove(&evicted);
            }
        }
    }
}

//! Exploit / explore / wildcard allocation
//!
//! Draw probabilities shift with profile maturity: a cold profile explores,
//! a mature one exploits, and a long pass streak pushes the system to
//! diversify rather than keep exploiting a model the user is rejecting.

use rand::Rng;

use crate::models::{BucketRatios, ServingBucket, TasteProfile};

/// Interactions needed before the profile counts as fully confident
const CONFIDENCE_INTERACTIONS: f64 = 30.0;
/// Exploit share at full confidence
const EXPLOIT_MAX: f64 = 0.6;
const EXPLORE_BASE: f64 = 0.3;
/// Extra exploration granted to cold profiles
const EXPLORE_COLD_BONUS: f64 = 0.2;
/// Extra exploration when the user keeps passing
const PASS_STREAK_BONUS: f64 = 0.2;
const PASS_STREAK_THRESHOLD: u32 = 5;
const WILDCARD_RATIO: f64 = 0.1;

/// Fraction of the score-sorted pool exploit picks draw from
const EXPLOIT_SLICE: f64 = 0.3;
/// Explore picks draw from the 30th-70th percentile
const EXPLORE_LOW: f64 = 0.3;
const EXPLORE_HIGH: f64 = 0.7;

/// Normalized draw probabilities for the current profile state
pub fn bucket_ratios(profile: &TasteProfile) -> BucketRatios {
    let confidence = (profile.total_interactions() as f64 / CONFIDENCE_INTERACTIONS).min(1.0);
    let streak_bonus = if profile.consecutive_passes >= PASS_STREAK_THRESHOLD {
        PASS_STREAK_BONUS
    } else {
        0.0
    };

    let exploit = EXPLOIT_MAX * confidence;
    let explore = EXPLORE_BASE + (1.0 - confidence) * EXPLORE_COLD_BONUS + streak_bonus;
    let wildcard = WILDCARD_RATIO;

    let total = exploit + explore + wildcard;
    BucketRatios {
        exploit: exploit / total,
        explore: explore / total,
        wildcard: wildcard / total,
    }
}

/// Draws a selection bucket according to the profile's current ratios
pub fn select_bucket<R: Rng>(profile: &TasteProfile, rng: &mut R) -> ServingBucket {
    let ratios = bucket_ratios(profile);
    let roll: f64 = rng.gen();
    if roll < ratios.exploit {
        ServingBucket::Exploit
    } else if roll < ratios.exploit + ratios.explore {
        ServingBucket::Explore
    } else {
        ServingBucket::Wildcard
    }
}

/// Picks an index into a score-sorted (descending) pool for the given bucket
///
/// Exploit draws from the top 30%, explore from the middle 40%, wildcard
/// from the whole pool. A tiny pool whose explore slice is empty falls back
/// to a uniform draw.
pub fn draw_index<R: Rng>(pool_len: usize, bucket: ServingBucket, rng: &mut R) -> Option<usize> {
    if pool_len == 0 {
        return None;
    }
    let index = match bucket {
        ServingBucket::Exploit => {
            let top = ((pool_len as f64 * EXPLOIT_SLICE).ceil() as usize).max(1);
            rng.gen_range(0..top)
        }
        ServingBucket::Explore => {
            let low = (pool_len as f64 * EXPLORE_LOW).floor() as usize;
            let high = (pool_len as f64 * EXPLORE_HIGH).ceil() as usize;
            let high = high.min(pool_len);
            if low >= high {
                rng.gen_range(0..pool_len)
            } else {
                rng.gen_range(low..high)
            }
        }
        _ => rng.gen_range(0..pool_len),
    };
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Movie, SwipeAction};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_cold_profile_barely_exploits() {
        let ratios = bucket_ratios(&TasteProfile::new());
        assert_eq!(ratios.exploit, 0.0);
        assert!(ratios.explore > ratios.wildcard);
        let sum = ratios.exploit + ratios.explore + ratios.wildcard;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mature_profile_exploits_most() {
        let movie = Movie::new("Any", 2020, 110).with_genres(&["drama"]);
        let mut profile = TasteProfile::new();
        for _ in 0..30 {
            profile = profile.apply_swipe(&movie, SwipeAction::Like);
        }
        let ratios = bucket_ratios(&profile);
        assert!(ratios.exploit > ratios.explore);
        assert!(ratios.exploit > 0.5);
    }

    #[test]
    fn test_pass_streak_boosts_exploration() {
        let movie = Movie::new("Any", 2020, 110);
        let mut profile = TasteProfile::new();
        for _ in 0..30 {
            profile = profile.apply_swipe(&movie, SwipeAction::Like);
        }
        let settled = bucket_ratios(&profile);
        for _ in 0..5 {
            profile = profile.apply_swipe(&movie, SwipeAction::Pass);
        }
        let disengaged = bucket_ratios(&profile);
        assert!(disengaged.explore > settled.explore);
    }

    #[test]
    fn test_draw_index_respects_slices() {
        let mut rng = rng();
        for _ in 0..200 {
            let exploit = draw_index(100, ServingBucket::Exploit, &mut rng).unwrap();
            assert!(exploit < 30);
            let explore = draw_index(100, ServingBucket::Explore, &mut rng).unwrap();
            assert!((30..70).contains(&explore));
            let wildcard = draw_index(100, ServingBucket::Wildcard, &mut rng).unwrap();
            assert!(wildcard < 100);
        }
    }

    #[test]
    fn test_tiny_pool_falls_back_to_uniform() {
        let mut rng = rng();
        assert!(draw_index(0, ServingBucket::Explore, &mut rng).is_none());
        for _ in 0..20 {
            let index = draw_index(1, ServingBucket::Explore, &mut rng).unwrap();
            assert_eq!(index, 0);
        }
    }

    #[test]
    fn test_select_bucket_is_reproducible() {
        let profile = TasteProfile::new();
        let picks_a: Vec<_> = {
            let mut rng = rng();
            (0..20).map(|_| select_bucket(&profile, &mut rng)).collect()
        };
        let picks_b: Vec<_> = {
            let mut rng = rng();
            (0..20).map(|_| select_bucket(&profile, &mut rng)).collect()
        };
        assert_eq!(picks_a, picks_b);
    }
}

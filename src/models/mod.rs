mod feed_item;
mod movie;
mod taste_profile;

pub use feed_item::{BucketRatios, EngineStats, FeedItem, ServingBucket};
pub use movie::{Era, Mood, Movie, SwipeAction, SHORT_RUNTIME_MINUTES};
pub use taste_profile::{
    TasteProfile, DEFAULT_PREFERRED_RUNTIME, LIKE_DELTA, PASS_DELTA, SAVE_DELTA,
};

pub mod allocator;
pub mod candidate_store;
pub mod catalog;
pub mod feed_engine;
pub mod scorer;
pub mod sessions;

pub use candidate_store::CandidateStore;
pub use catalog::{CatalogProvider, InMemoryCatalog};
pub use feed_engine::{EngineError, FeedEngine};
pub use sessions::SessionManager;

//! Swipe-based movie recommendation feed
//!
//! The core is a synchronous, per-session feed engine: a taste profile
//! accumulated from like/pass/save swipes, a clamped additive scorer, an
//! exploit/explore/wildcard allocator, a quality-bucketed candidate store
//! with diversity constraints, and a fallback ladder that guarantees a next
//! movie whenever the regional catalog is non-empty. A thin axum surface
//! exposes one engine per session key.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

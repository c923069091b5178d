use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{EngineStats, Era, FeedItem, Mood, Movie, SwipeAction, TasteProfile};
use crate::services::catalog::CatalogProvider;
use crate::services::FeedEngine;

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub moods: Vec<Mood>,
    /// Derived from the release year when omitted
    pub era: Option<Era>,
    pub runtime_minutes: u32,
    pub rating: f64,
    pub rating_count: u32,
    pub popularity: Option<f64>,
    pub release_year: i32,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
}

impl From<CreateMovieRequest> for Movie {
    fn from(request: CreateMovieRequest) -> Self {
        Movie {
            id: Uuid::new_v4(),
            era: request.era.unwrap_or_else(|| Era::from_year(request.release_year)),
            title: request.title,
            genres: request.genres,
            moods: request.moods,
            runtime_minutes: request.runtime_minutes,
            rating: request.rating,
            rating_count: request.rating_count,
            popularity: request.popularity,
            release_year: request.release_year,
            directors: request.directors,
            cast: request.cast,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub region: String,
    #[serde(default)]
    pub mood_filter: Option<Mood>,
    /// Rehydrated profile; a fresh one is created when omitted
    #[serde(default)]
    pub profile: Option<TasteProfile>,
    #[serde(default)]
    pub liked_ids: Vec<Uuid>,
    #[serde(default)]
    pub passed_ids: Vec<Uuid>,
    #[serde(default)]
    pub saved_ids: Vec<Uuid>,
    /// Explicit RNG seed for reproducible feeds
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub has_content: bool,
    pub stats: EngineStats,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub movie_id: Uuid,
    pub action: SwipeAction,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    /// Profile after applying the swipe; callers persist this
    pub profile: TasteProfile,
}

#[derive(Debug, Deserialize)]
pub struct PeekParams {
    #[serde(default = "default_peek_count")]
    pub count: usize,
}

fn default_peek_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    /// Apply the session-start decay before installing the profile
    #[serde(default)]
    pub decay: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Add a movie to a region's catalog
pub async fn create_movie(
    State(state): State<AppState>,
    Path(region): Path<String>,
    Json(request): Json<CreateMovieRequest>,
) -> (StatusCode, Json<Movie>) {
    let movie: Movie = request.into();
    let mut catalog = state.catalog.write().await;
    catalog.add_movie(&region, movie.clone());
    tracing::info!(region = %region, movie = %movie.title, "Movie added to catalog");
    (StatusCode::CREATED, Json(movie))
}

/// List a region's catalog
pub async fn list_movies(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> AppResult<Json<Vec<Movie>>> {
    let catalog = state.catalog.read().await;
    let movies = catalog
        .list_movies(&region)
        .ok_or_else(|| AppError::NotFound(format!("Unknown region: {region}")))?;
    Ok(Json(movies))
}

/// Open a feed session: one engine per session key
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<CreateSessionResponse>)> {
    let profile = request.profile.unwrap_or_default();
    let seed = request.seed.unwrap_or_else(rand::random);

    let engine = {
        let catalog = state.catalog.read().await;
        FeedEngine::new(
            &*catalog,
            &request.region,
            profile,
            request.liked_ids.into_iter().collect::<HashSet<_>>(),
            request.passed_ids.into_iter().collect::<HashSet<_>>(),
            request.saved_ids.into_iter().collect::<HashSet<_>>(),
            request.mood_filter,
            seed,
        )?
    };

    let has_content = engine.has_content();
    let stats = engine.get_stats();
    let session_id = state.sessions.insert(engine).await;
    tracing::info!(%session_id, region = %request.region, has_content, "Session opened");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            has_content,
            stats,
        }),
    ))
}

/// Close a session and drop its engine
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Unknown session: {session_id}")))
    }
}

/// Pull the next feed item; 204 when the regional catalog is empty
pub async fn next_item(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Response> {
    let engine = lookup(&state, &session_id).await?;
    let mut engine = engine.lock().await;
    Ok(match engine.get_next() {
        Some(item) => Json(item).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Non-consuming look-ahead for prefetching
pub async fn peek_items(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<PeekParams>,
) -> AppResult<Json<Vec<FeedItem>>> {
    let engine = lookup(&state, &session_id).await?;
    let engine = engine.lock().await;
    Ok(Json(engine.peek(params.count)))
}

/// Record a swipe and return the updated profile
pub async fn record_swipe(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SwipeRequest>,
) -> AppResult<Json<SwipeResponse>> {
    let engine = lookup(&state, &session_id).await?;
    let mut engine = engine.lock().await;

    let movie = engine
        .movie(&request.movie_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Unknown movie: {}", request.movie_id)))?;

    engine.record_swipe(request.movie_id, request.action);
    let profile = engine.profile().apply_swipe(&movie, request.action);
    engine.update_profile(profile.clone())?;

    Ok(Json(SwipeResponse { profile }))
}

/// Replace the session's taste profile wholesale
pub async fn update_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<ProfileParams>,
    Json(profile): Json<TasteProfile>,
) -> AppResult<StatusCode> {
    let engine = lookup(&state, &session_id).await?;
    let mut engine = engine.lock().await;
    let profile = if params.decay { profile.decayed() } else { profile };
    engine.update_profile(profile)?;
    Ok(StatusCode::OK)
}

/// Diagnostic stats for a session
pub async fn session_stats(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<EngineStats>> {
    let engine = lookup(&state, &session_id).await?;
    let engine = engine.lock().await;
    Ok(Json(engine.get_stats()))
}

async fn lookup(
    state: &AppState,
    session_id: &Uuid,
) -> AppResult<std::sync::Arc<tokio::sync::Mutex<FeedEngine>>> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown session: {session_id}")))
}

use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::future::join_all;
use movie_core::persist::{load_index, IndexPaths};
use movie_core::{DisplayFields, Recommendation, Recommender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod poster;

pub use config::{Config, Limits};
use error::{ApiError, ApiResult};
use poster::{NoPosters, PosterLookup, TmdbPosters};

#[derive(Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    /// Catalog title the query resolved to.
    pub matched: String,
    pub took_s: f64,
    pub recommendations: Vec<MovieHit>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub recommendations: Vec<MovieHit>,
}

#[derive(Serialize)]
pub struct MovieHit {
    pub id: u64,
    pub title: String,
    pub score: f32,
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<f32>,
    pub overview: Option<String>,
}

impl From<Recommendation<'_>> for MovieHit {
    fn from(r: Recommendation<'_>) -> Self {
        Self {
            id: r.row.id,
            title: r.row.title.clone(),
            score: r.score,
            poster_url: None,
            genres: r.row.display.genres.clone(),
            rating: r.row.display.rating,
            overview: r.row.display.overview.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub poster_url: Option<String>,
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// Everything a request needs; built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub posters: Arc<dyn PosterLookup>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(recommender: Recommender, posters: Arc<dyn PosterLookup>, limits: Limits) -> Self {
        Self { recommender: Arc::new(recommender), posters, limits }
    }
}

/// Load the index and assemble the router. Fails rather than serving without a complete index.
pub fn build_app(config: &Config) -> Result<Router> {
    let index = load_index(&IndexPaths::new(&config.index))?;
    let posters: Arc<dyn PosterLookup> = match &config.tmdb_api_key {
        Some(key) if !key.trim().is_empty() => Arc::new(TmdbPosters::new(
            key.clone(),
            config.tmdb_base_url.clone(),
            config.tmdb_image_url.clone(),
            config.poster_timeout(),
        )?),
        _ => {
            tracing::info!("TMDB_API_KEY not set, poster lookup disabled");
            Arc::new(NoPosters)
        }
    };
    let state = AppState::new(Recommender::new(index), posters, config.limits());

    let cors = match &config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Ok(router(state).layer(cors).layer(TraceLayer::new_for_http()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler))
        .route("/api/recommend", post(recommend_json_handler))
        .route("/api/recommend/", post(recommend_json_handler))
        .route("/search", get(search_handler))
        .route("/movies/:id", get(movie_handler))
        .with_state(state)
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    params: Result<Query<RecommendParams>, QueryRejection>,
) -> ApiResult<Json<RecommendResponse>> {
    let Query(params) = params?;
    recommend(&state, params).await.map(Json)
}

pub async fn recommend_json_handler(
    State(state): State<AppState>,
    params: Result<Json<RecommendParams>, JsonRejection>,
) -> ApiResult<Json<RecommendResponse>> {
    let Json(params) = params?;
    recommend(&state, params).await.map(Json)
}

async fn recommend(state: &AppState, params: RecommendParams) -> ApiResult<RecommendResponse> {
    let start = std::time::Instant::now();
    let query = params.title.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing 'title' parameter".into()));
    }
    let k = state.limits.clamp(params.k);

    // Ranking finishes before any poster request goes out.
    let (matched, mut hits) = {
        let position = state.recommender.resolve(&query)?;
        let matched = state
            .recommender
            .index()
            .row(position)
            .map(|r| r.title.clone())
            .unwrap_or_default();
        let hits: Vec<MovieHit> = state.recommender.neighbors_of(position, k).into_iter().map(MovieHit::from).collect();
        (matched, hits)
    };
    tracing::debug!(query = %query, matched = %matched, hits = hits.len(), "recommend");
    attach_posters(state.posters.as_ref(), &mut hits).await;

    Ok(RecommendResponse { query, matched, took_s: start.elapsed().as_secs_f64(), recommendations: hits })
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let start = std::time::Instant::now();
    let Query(params) = params?;
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing 'q' parameter".into()));
    }
    let k = state.limits.clamp(params.k);
    let mut hits: Vec<MovieHit> = state.recommender.similar_to_text(&query, k).into_iter().map(MovieHit::from).collect();
    attach_posters(state.posters.as_ref(), &mut hits).await;

    Ok(Json(SearchResponse { query, took_s: start.elapsed().as_secs_f64(), recommendations: hits }))
}

pub async fn movie_handler(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<MovieDetails>> {
    let Path(id) = id?;
    let row = state
        .recommender
        .index()
        .position_of_id(id)
        .and_then(|p| state.recommender.index().row(p))
        .ok_or_else(|| ApiError::NotFound(format!("movie {id} not found")))?;
    let (title, display) = (row.title.clone(), row.display.clone());
    let poster_url = state.posters.poster_url(&title).await;
    Ok(Json(MovieDetails { id, title, poster_url, display }))
}

async fn attach_posters(lookup: &dyn PosterLookup, hits: &mut [MovieHit]) {
    let urls = join_all(hits.iter().map(|h| lookup.poster_url(&h.title))).await;
    for (hit, url) in hits.iter_mut().zip(urls) {
        hit.poster_url = url;
    }
}

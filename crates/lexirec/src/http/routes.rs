//! HTTP API routes and handlers

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use lexirec_recommend::{AttemptInput, RecommendationEngine};
use lexirec_store::ContentStore;
use std::sync::Arc;
use tracing::{debug, error};

use super::types::*;

/// Hard cap on recommendations served per fetch.
const MAX_RECOMMENDATIONS: usize = 20;

/// Hard cap on the due-list size.
const MAX_DUE: usize = 50;

pub struct ApiState {
    pub store: Arc<ContentStore>,
    pub engine: Arc<RecommendationEngine>,
}

type SharedState = Arc<ApiState>;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

/// Create the router with all API endpoints
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/attempts", post(record_attempt))
        .route("/recommendations", get(recommendations))
        .route("/due", get(due))
        .route("/reindex", post(reindex))
        .with_state(state)
}

// ============================================
// Health & Stats
// ============================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn stats(State(state): State<SharedState>) -> Result<Json<StatsResponse>, ApiError> {
    match state.store.get_stats() {
        Ok(stats) => Ok(Json(StatsResponse {
            lessons: stats.lesson_count,
            exercises: stats.exercise_count,
            embeddings: stats.embedding_count,
            attempts: stats.attempt_count,
            unserved_recommendations: stats.unserved_count,
        })),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get stats",
                "STATS_ERROR",
            ))
        }
    }
}

// ============================================
// Attempts
// ============================================

async fn record_attempt(
    State(state): State<SharedState>,
    Json(req): Json<AttemptRequest>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let exists = state.store.get_exercise(req.exercise_id).map_err(|e| {
        error!("Failed to load exercise {}: {}", req.exercise_id, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to record attempt",
            "ATTEMPT_ERROR",
        )
    })?;
    if exists.is_none() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "Exercise not found",
            "EXERCISE_NOT_FOUND",
        ));
    }

    debug!(
        user = req.user_id,
        exercise = req.exercise_id,
        correct = req.is_correct,
        "HTTP attempt"
    );

    // Recommendation-generation failures never surface here; the engine
    // swallows them and reports zero queued.
    match state.engine.record_attempt(AttemptInput {
        user_id: req.user_id,
        exercise_id: req.exercise_id,
        is_correct: req.is_correct,
        score: req.score,
        topic: req.topic,
        skill: req.skill,
        answer: req.answer,
    }) {
        Ok(outcome) => Ok(Json(AttemptResponse {
            ok: true,
            queued: outcome.queued,
        })),
        Err(e) => {
            error!("Failed to record attempt: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record attempt",
                "ATTEMPT_ERROR",
            ))
        }
    }
}

// ============================================
// Recommendations
// ============================================

async fn recommendations(
    State(state): State<SharedState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(MAX_RECOMMENDATIONS).min(MAX_RECOMMENDATIONS);

    // Serving is a side effect of the read; see the engine docs for the
    // at-most-once caveat.
    match state.engine.take_recommendations(query.user_id, limit) {
        Ok(rows) => Ok(Json(RecommendationsResponse {
            recommendations: rows
                .into_iter()
                .map(|r| RecommendationItem {
                    exercise_id: r.exercise_id,
                    reason: r.reason,
                    score: r.score,
                    created_at: r.created_at,
                    served: r.served,
                })
                .collect(),
        })),
        Err(e) => {
            error!("Failed to fetch recommendations: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch recommendations",
                "RECOMMENDATIONS_ERROR",
            ))
        }
    }
}

// ============================================
// Due list
// ============================================

async fn due(
    State(state): State<SharedState>,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueResponse>, ApiError> {
    let limit = query.limit.unwrap_or(10).min(MAX_DUE);

    let exercises = state.engine.due_for(query.user_id, limit).map_err(|e| {
        error!("Due-list lookup failed: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build due list",
            "DUE_ERROR",
        )
    })?;

    let mut due = Vec::with_capacity(exercises.len());
    for exercise in exercises {
        let question = state
            .store
            .first_question_text(exercise.id)
            .unwrap_or_default()
            .unwrap_or_default();
        due.push(DueItem {
            exercise_id: exercise.id,
            question,
        });
    }

    Ok(Json(DueResponse { due }))
}

// ============================================
// Reindex (administrative)
// ============================================

async fn reindex(State(state): State<SharedState>) -> Result<Json<ReindexResponse>, ApiError> {
    match state.engine.index_all() {
        Ok(indexed) => Ok(Json(ReindexResponse { indexed })),
        Err(e) => {
            error!("Reindex failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reindex failed",
                "REINDEX_ERROR",
            ))
        }
    }
}

//! HTTP API request and response types

use serde::{Deserialize, Serialize};

// ============================================
// Attempts
// ============================================

#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub user_id: i64,
    pub exercise_id: i64,
    pub is_correct: bool,
    pub score: Option<f64>,
    pub topic: Option<String>,
    pub skill: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptResponse {
    pub ok: bool,
    /// Recommendations queued by this attempt (best-effort).
    pub queued: usize,
}

// ============================================
// Recommendations
// ============================================

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub user_id: i64,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub exercise_id: i64,
    pub reason: String,
    pub score: f64,
    pub created_at: i64,
    pub served: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendationItem>,
}

// ============================================
// Due list
// ============================================

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    pub user_id: i64,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueItem {
    pub exercise_id: i64,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueResponse {
    pub due: Vec<DueItem>,
}

// ============================================
// Reindex
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}

// ============================================
// Stats
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub lessons: usize,
    pub exercises: usize,
    pub embeddings: usize,
    pub attempts: usize,
    pub unserved_recommendations: usize,
}

// ============================================
// Health
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================
// Error
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

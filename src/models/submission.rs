// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const SUBMISSION_COLUMNS: &str = "id, score, answers, exam_id, user_id, submitted_at";

/// Represents the 'submissions' table in the database.
/// `answers` is stored verbatim as the client sent it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub score: f64,
    pub answers: String,
    pub exam_id: i64,
    pub user_id: i64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(range(min = 0.0))]
    pub score: f64,
    #[validate(length(max = 100000))]
    pub answers: String,
    pub exam_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionListParams {
    pub exam_id: Option<i64>,
    pub user_id: Option<i64>,
}

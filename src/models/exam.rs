// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::QuestionDetail;

pub const EXAM_COLUMNS: &str =
    "id, exam_code, duration, num_questions, subject_id, created_at, updated_at";

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    /// Unique human-facing code, e.g. "MATH_20250201093000".
    pub exam_code: String,

    /// Duration in minutes.
    pub duration: i32,

    /// Number of questions announced by the exam template.
    pub num_questions: i32,

    pub subject_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exam with every linked question expanded.
#[derive(Debug, Serialize)]
pub struct ExamDetail {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<QuestionDetail>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 100))]
    pub exam_code: String,
    #[validate(range(min = 1))]
    pub duration: i32,
    #[validate(range(min = 0))]
    pub num_questions: i32,
    pub subject_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 100))]
    pub exam_code: Option<String>,
    #[validate(range(min = 1))]
    pub duration: Option<i32>,
    #[validate(range(min = 0))]
    pub num_questions: Option<i32>,
    pub subject_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExamListParams {
    pub subject_id: Option<i64>,
}

/// Represents the 'exam_questions' join table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: i64,
    pub exam_id: i64,
    pub question_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateExamQuestionRequest {
    pub exam_id: i64,
    pub question_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExamQuestionListParams {
    pub exam_id: Option<i64>,
}

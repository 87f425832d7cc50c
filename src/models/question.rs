// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::choice::Choice;

pub const QUESTION_COLUMNS: &str = "id, question_text, image_url, unit, mark, mix_choices, \
    is_deleted, subject_id, created_at, updated_at";

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// Public URL of the question's illustration, if any.
    pub image_url: Option<String>,

    /// Free-form unit/chapter label taken from the import template.
    pub unit: Option<String>,

    /// Points awarded for the question.
    pub mark: Option<f64>,

    /// Whether clients may shuffle the choices when presenting the question.
    pub mix_choices: bool,

    pub is_deleted: bool,

    pub subject_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question together with its choices and the id of the correct one.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub choices: Vec<Choice>,
    pub correct_choice_id: Option<i64>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 10000))]
    pub question_text: String,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 255))]
    pub unit: Option<String>,
    #[validate(range(min = 0.0))]
    pub mark: Option<f64>,
    #[serde(default)]
    pub mix_choices: bool,
    pub subject_id: i64,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 10000))]
    pub question_text: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(length(max = 255))]
    pub unit: Option<String>,
    #[validate(range(min = 0.0))]
    pub mark: Option<f64>,
    pub mix_choices: Option<bool>,
    pub is_deleted: Option<bool>,
    pub subject_id: Option<i64>,
}

/// DTO for marking one of a question's choices as correct.
#[derive(Debug, Deserialize)]
pub struct SetCorrectAnswerRequest {
    pub choice_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub include_deleted: bool,
}

// src/handlers/questions.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        choice::{CHOICE_COLUMNS, Choice},
        question::{
            CreateQuestionRequest, QUESTION_COLUMNS, Question, QuestionDetail, QuestionListParams,
            SetCorrectAnswerRequest, UpdateQuestionRequest,
        },
    },
};

/// Expands questions with their choices and correct choice, keeping the input order.
pub(crate) async fn question_details(
    pool: &PgPool,
    questions: Vec<Question>,
) -> Result<Vec<QuestionDetail>, sqlx::Error> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let choices = sqlx::query_as::<_, Choice>(&format!(
        "SELECT {CHOICE_COLUMNS} FROM choices WHERE question_id = ANY($1) ORDER BY question_id, option_code"
    ))
    .bind(ids.as_slice())
    .fetch_all(pool)
    .await?;

    let correct: Vec<(i64, i64)> =
        sqlx::query_as("SELECT question_id, choice_id FROM correct_answers WHERE question_id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(pool)
            .await?;
    let correct: HashMap<i64, i64> = correct.into_iter().collect();

    let mut by_question: HashMap<i64, Vec<Choice>> = HashMap::new();
    for choice in choices {
        by_question.entry(choice.question_id).or_default().push(choice);
    }

    Ok(questions
        .into_iter()
        .map(|question| QuestionDetail {
            choices: by_question.remove(&question.id).unwrap_or_default(),
            correct_choice_id: correct.get(&question.id).copied(),
            question,
        })
        .collect())
}

/// Lists questions, optionally for one subject. Soft-deleted questions are hidden
/// unless `include_deleted=true`.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"));

    if !params.include_deleted {
        builder.push(" AND is_deleted = FALSE");
    }
    if let Some(subject_id) = params.subject_id {
        builder.push(" AND subject_id = ");
        builder.push_bind(subject_id);
    }
    builder.push(" ORDER BY id");

    let questions = builder
        .build_query_as::<Question>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(questions))
}

/// Returns one question with its choices and correct choice id.
pub async fn get_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question =
        sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let detail = question_details(&pool, vec![question])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(detail))
}

pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (question_text, image_url, unit, mark, mix_choices, subject_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(payload.question_text)
    .bind(payload.image_url)
    .bind(payload.unit)
    .bind(payload.mark)
    .bind(payload.mix_choices)
    .bind(payload.subject_id)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.question_text.is_none()
        && payload.image_url.is_none()
        && payload.unit.is_none()
        && payload.mark.is_none()
        && payload.mix_choices.is_none()
        && payload.is_deleted.is_none()
        && payload.subject_id.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE questions SET updated_at = NOW()");

    if let Some(question_text) = payload.question_text {
        builder.push(", question_text = ");
        builder.push_bind(question_text);
    }

    if let Some(image_url) = payload.image_url {
        builder.push(", image_url = ");
        builder.push_bind(image_url);
    }

    if let Some(unit) = payload.unit {
        builder.push(", unit = ");
        builder.push_bind(unit);
    }

    if let Some(mark) = payload.mark {
        builder.push(", mark = ");
        builder.push_bind(mark);
    }

    if let Some(mix_choices) = payload.mix_choices {
        builder.push(", mix_choices = ");
        builder.push_bind(mix_choices);
    }

    if let Some(is_deleted) = payload.is_deleted {
        builder.push(", is_deleted = ");
        builder.push_bind(is_deleted);
    }

    if let Some(subject_id) = payload.subject_id {
        builder.push(", subject_id = ");
        builder.push_bind(subject_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Marks one of the question's own choices as the correct one, replacing any previous answer.
pub async fn set_correct_answer(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<SetCorrectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let belongs: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM choices WHERE id = $1 AND question_id = $2)",
    )
    .bind(payload.choice_id)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if !belongs {
        return Err(AppError::BadRequest(format!(
            "Choice {} does not belong to question {}",
            payload.choice_id, id
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO correct_answers (question_id, choice_id)
        VALUES ($1, $2)
        ON CONFLICT (question_id) DO UPDATE SET choice_id = EXCLUDED.choice_id
        "#,
    )
    .bind(id)
    .bind(payload.choice_id)
    .execute(&pool)
    .await?;

    Ok(StatusCode::OK)
}

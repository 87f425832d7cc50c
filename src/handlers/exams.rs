// src/handlers/exams.rs

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
    handlers::questions::question_details,
    models::{
        exam::{
            CreateExamQuestionRequest, CreateExamRequest, EXAM_COLUMNS, Exam, ExamDetail,
            ExamListParams, ExamQuestion, ExamQuestionListParams, UpdateExamRequest,
        },
        question::Question,
    },
};

pub async fn list_exams(
    State(pool): State<PgPool>,
    Query(params): Query<ExamListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {EXAM_COLUMNS} FROM exams"));

    if let Some(subject_id) = params.subject_id {
        builder.push(" WHERE subject_id = ");
        builder.push_bind(subject_id);
    }
    builder.push(" ORDER BY id DESC");

    let exams = builder
        .build_query_as::<Exam>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list exams: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(exams))
}

/// Returns the exam with every linked question, its choices and correct choice id,
/// in the order the questions were linked.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.question_text, q.image_url, q.unit, q.mark, q.mix_choices,
               q.is_deleted, q.subject_id, q.created_at, q.updated_at
        FROM exam_questions eq
        JOIN questions q ON q.id = eq.question_id
        WHERE eq.exam_id = $1
        ORDER BY eq.id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load questions for exam {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    let questions = question_details(&pool, questions).await?;

    Ok(Json(ExamDetail { exam, questions }))
}

pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO exams (exam_code, duration, num_questions, subject_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(payload.exam_code.trim())
    .bind(payload.duration)
    .bind(payload.num_questions)
    .bind(payload.subject_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            AppError::Conflict(format!("Exam code '{}' already exists", payload.exam_code.trim()))
        }
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.exam_code.is_none()
        && payload.duration.is_none()
        && payload.num_questions.is_none()
        && payload.subject_id.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET updated_at = NOW()");

    if let Some(exam_code) = payload.exam_code {
        builder.push(", exam_code = ");
        builder.push_bind(exam_code.trim().to_string());
    }

    if let Some(duration) = payload.duration {
        builder.push(", duration = ");
        builder.push_bind(duration);
    }

    if let Some(num_questions) = payload.num_questions {
        builder.push(", num_questions = ");
        builder.push_bind(num_questions);
    }

    if let Some(subject_id) = payload.subject_id {
        builder.push(", subject_id = ");
        builder.push_bind(subject_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::OK)
}

pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_exam_questions(
    State(pool): State<PgPool>,
    Query(params): Query<ExamQuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, exam_id, question_id FROM exam_questions");

    if let Some(exam_id) = params.exam_id {
        builder.push(" WHERE exam_id = ");
        builder.push_bind(exam_id);
    }
    builder.push(" ORDER BY id");

    let links = builder.build_query_as::<ExamQuestion>().fetch_all(&pool).await?;

    Ok(Json(links))
}

/// Links an existing question to an exam.
pub async fn create_exam_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateExamQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO exam_questions (exam_id, question_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(payload.exam_id)
    .bind(payload.question_id)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn delete_exam_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

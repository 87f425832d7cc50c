// src/handlers/submissions.rs

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
    models::submission::{
        CreateSubmissionRequest, SUBMISSION_COLUMNS, Submission, SubmissionListParams,
    },
};

/// Lists submissions, newest first, filtered by exam and/or user.
pub async fn list_submissions(
    State(pool): State<PgPool>,
    Query(params): Query<SubmissionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE TRUE"));

    if let Some(exam_id) = params.exam_id {
        builder.push(" AND exam_id = ");
        builder.push_bind(exam_id);
    }
    if let Some(user_id) = params.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    builder.push(" ORDER BY submitted_at DESC, id DESC");

    let submissions = builder
        .build_query_as::<Submission>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list submissions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(submissions))
}

pub async fn get_submission(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    Ok(Json(submission))
}

/// Records a submission as sent. Scoring happens client-side.
pub async fn create_submission(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO submissions (score, answers, exam_id, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(payload.score)
    .bind(payload.answers)
    .bind(payload.exam_id)
    .bind(payload.user_id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        submission_id = id,
        exam_id = payload.exam_id,
        user_id = payload.user_id,
        "Submission recorded"
    );

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn delete_submission(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

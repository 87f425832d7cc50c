// src/handlers/user_subjects.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user_subject::{CreateUserSubjectRequest, USER_SUBJECT_SELECT, UserSubject},
};

pub async fn list_user_subjects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let assignments =
        sqlx::query_as::<_, UserSubject>(&format!("{USER_SUBJECT_SELECT} ORDER BY us.id"))
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list user subjects: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(Json(assignments))
}

/// Assigns a user to a subject. Each pair may exist once.
pub async fn create_user_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO user_subjects (user_id, subject_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(payload.user_id)
    .bind(payload.subject_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!(
            "User {} is already assigned to subject {}",
            payload.user_id, payload.subject_id
        )),
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn delete_user_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM user_subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

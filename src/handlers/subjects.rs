// src/handlers/subjects.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::subject::{CreateSubjectRequest, SUBJECT_COLUMNS, Subject, UpdateSubjectRequest},
};

pub async fn list_subjects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let subjects =
        sqlx::query_as::<_, Subject>(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY name"))
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list subjects: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    Ok(Json(subjects))
}

pub async fn get_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject =
        sqlx::query_as::<_, Subject>(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Creates a subject. Names are unique; a duplicate is a 409.
pub async fn create_subject(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 =
        sqlx::query_scalar("INSERT INTO subjects (name, lecturer) VALUES ($1, $2) RETURNING id")
            .bind(payload.name.trim())
            .bind(payload.lecturer)
            .fetch_one(&pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Subject '{}' already exists", payload.name.trim()))
                }
                other => other,
            })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.name.is_none() && payload.lecturer.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE subjects SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
    }

    if let Some(lecturer) = payload.lecturer {
        separated.push("lecturer = ");
        separated.push_bind_unseparated(lecturer);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a subject together with its questions and exams.
pub async fn delete_subject(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

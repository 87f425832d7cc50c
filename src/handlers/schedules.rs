// src/handlers/schedules.rs

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
    models::exam_schedule::{CreateScheduleRequest, ExamSchedule, SCHEDULE_COLUMNS, UpdateScheduleRequest},
};

pub async fn list_schedules(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let schedules = sqlx::query_as::<_, ExamSchedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM exam_schedules ORDER BY start_time"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exam schedules: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = sqlx::query_as::<_, ExamSchedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM exam_schedules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Exam schedule not found".to_string()))?;

    Ok(Json(schedule))
}

pub async fn create_schedule(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO exam_schedules (exam_id, start_time, end_time) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(payload.exam_id)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Partial update. A window where start is not before end is rejected by the
/// table's check constraint and reported as 400.
pub async fn update_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.exam_id.is_none() && payload.start_time.is_none() && payload.end_time.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exam_schedules SET ");
    let mut separated = builder.separated(", ");

    if let Some(exam_id) = payload.exam_id {
        separated.push("exam_id = ");
        separated.push_bind_unseparated(exam_id);
    }

    if let Some(start_time) = payload.start_time {
        separated.push("start_time = ");
        separated.push_bind_unseparated(start_time);
    }

    if let Some(end_time) = payload.end_time {
        separated.push("end_time = ");
        separated.push_bind_unseparated(end_time);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam schedule not found".to_string()));
    }

    Ok(StatusCode::OK)
}

pub async fn delete_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_schedules WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam schedule not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

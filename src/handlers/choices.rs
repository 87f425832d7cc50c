// src/handlers/choices.rs

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
    models::choice::{CHOICE_COLUMNS, Choice, ChoiceListParams, CreateChoiceRequest, UpdateChoiceRequest},
};

/// Lists choices, optionally for a single question.
pub async fn list_choices(
    State(pool): State<PgPool>,
    Query(params): Query<ChoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {CHOICE_COLUMNS} FROM choices"));

    if let Some(question_id) = params.question_id {
        builder.push(" WHERE question_id = ");
        builder.push_bind(question_id);
    }
    builder.push(" ORDER BY question_id, option_code");

    let choices = builder
        .build_query_as::<Choice>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list choices: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(choices))
}

pub async fn get_choice(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let choice = sqlx::query_as::<_, Choice>(&format!("SELECT {CHOICE_COLUMNS} FROM choices WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Choice not found".to_string()))?;

    Ok(Json(choice))
}

/// Option codes are stored lowercase and are unique per question.
pub async fn create_choice(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO choices (question_id, choice_text, option_code) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(payload.question_id)
    .bind(payload.choice_text)
    .bind(payload.option_code.to_lowercase())
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_choice(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateChoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.choice_text.is_none() && payload.option_code.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE choices SET ");
    let mut separated = builder.separated(", ");

    if let Some(choice_text) = payload.choice_text {
        separated.push("choice_text = ");
        separated.push_bind_unseparated(choice_text);
    }

    if let Some(option_code) = payload.option_code {
        separated.push("option_code = ");
        separated.push_bind_unseparated(option_code.to_lowercase());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Choice not found".to_string()));
    }

    Ok(StatusCode::OK)
}

pub async fn delete_choice(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM choices WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Choice not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

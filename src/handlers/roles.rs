// src/handlers/roles.rs

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
    models::role::{CreateRoleRequest, ROLE_COLUMNS, Role, UpdateRoleRequest},
};

pub async fn list_roles(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let roles = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id"))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list roles: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(roles))
}

pub async fn get_role(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Role not found".to_string()))?;

    Ok(Json(role))
}

pub async fn create_role(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 =
        sqlx::query_scalar("INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING id")
            .bind(payload.name.trim())
            .bind(payload.description)
            .fetch_one(&pool)
            .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_role(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.name.is_none() && payload.description.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE roles SET updated_at = NOW()");

    if let Some(name) = payload.name {
        builder.push(", name = ");
        builder.push_bind(name.trim().to_string());
    }

    if let Some(description) = payload.description {
        builder.push(", description = ");
        builder.push_bind(description);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deleting a role also deletes its users.
pub async fn delete_role(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete role: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
